//! Token definitions for the formula lexer

use cellcalc_core::ErrorKind;
use std::fmt;

/// Tokens recognized by the formula lexer
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(ErrorKind),

    // Identifiers and references
    /// Function name or defined name
    Identifier(String),
    /// Cell reference like A1, $A$1
    CellRef(String),
    /// Sheet qualifier like Sheet1! or 'My Sheet'!
    SheetPrefix(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Ampersand,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Colon,

    // Delimiters
    /// The culture's list separator
    Comma,
    /// Array row separator
    Semicolon,
    LParen,
    RParen,
    LBrace,
    RBrace,

    EndOfInput,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Text(s) => write!(f, "\"{}\"", s),
            Token::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Token::Error(e) => write!(f, "{}", e),
            Token::Identifier(s) | Token::CellRef(s) => write!(f, "{}", s),
            Token::SheetPrefix(s) => write!(f, "{}!", s),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::Percent => write!(f, "%"),
            Token::Ampersand => write!(f, "&"),
            Token::Equal => write!(f, "="),
            Token::NotEqual => write!(f, "<>"),
            Token::LessThan => write!(f, "<"),
            Token::LessEqual => write!(f, "<="),
            Token::GreaterThan => write!(f, ">"),
            Token::GreaterEqual => write!(f, ">="),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::EndOfInput => write!(f, "end of input"),
        }
    }
}

/// A token with its position in the formula text
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    /// Byte offset of the token's first character
    pub position: usize,
    /// Whether whitespace came directly before the token
    pub preceded_by_space: bool,
}
