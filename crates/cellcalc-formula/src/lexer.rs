//! Formula lexer
//!
//! Scans formula text into a token stream. Character sequences that cannot form
//! any token are syntax errors, reported with their byte offset.

use crate::error::{FormulaError, FormulaResult};
use crate::token::{Spanned, Token};
use cellcalc_core::{Culture, ErrorKind};
use lazy_regex::regex_is_match;

/// Error literals, longest first so `#N/A` never shadows a longer spelling
const ERROR_LITERALS: [&str; 7] = [
    "#DIV/0!", "#VALUE!", "#NULL!", "#NAME?", "#REF!", "#NUM!", "#N/A",
];

/// Tokenize formula text (without its leading `=`)
///
/// The result always ends with [`Token::EndOfInput`].
pub fn tokenize(text: &str, culture: &Culture) -> FormulaResult<Vec<Spanned>> {
    let mut lexer = Lexer::new(text, culture);
    let mut tokens = Vec::new();

    loop {
        let spanned = lexer.next_token()?;
        let done = spanned.token == Token::EndOfInput;
        tokens.push(spanned);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    culture: &'a Culture,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str, culture: &'a Culture) -> Self {
        Self {
            input,
            pos: 0,
            culture,
        }
    }

    fn next_token(&mut self) -> FormulaResult<Spanned> {
        let before = self.pos;
        self.skip_whitespace();
        let preceded_by_space = self.pos > before;
        let position = self.pos;
        let token = self.scan_token()?;

        Ok(Spanned {
            token,
            position,
            preceded_by_space,
        })
    }

    fn scan_token(&mut self) -> FormulaResult<Token> {
        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Token::EndOfInput),
        };

        // Numbers come first so a `,` decimal separator wins over `,` lists
        if c.is_ascii_digit()
            || (c == self.culture.decimal_separator
                && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        if c == self.culture.list_separator {
            self.advance();
            return Ok(Token::Comma);
        }

        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            '%' => Some(Token::Percent),
            '&' => Some(Token::Ampersand),
            ':' => Some(Token::Colon),
            '=' => Some(Token::Equal),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '{' => Some(Token::LBrace),
            '}' => Some(Token::RBrace),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        match c {
            '<' => {
                self.advance();
                if self.eat('=') {
                    Ok(Token::LessEqual)
                } else if self.eat('>') {
                    Ok(Token::NotEqual)
                } else {
                    Ok(Token::LessThan)
                }
            }
            '>' => {
                self.advance();
                if self.eat('=') {
                    Ok(Token::GreaterEqual)
                } else {
                    Ok(Token::GreaterThan)
                }
            }
            '"' => self.scan_string(),
            '\'' => self.scan_quoted_sheet(),
            '#' => self.scan_error(),
            // Array rows; with a `;` list separator rows use `|`
            ';' | '|' => {
                self.advance();
                Ok(Token::Semicolon)
            }
            c if c.is_alphabetic() || c == '_' || c == '\\' || c == '$' => {
                Ok(self.scan_identifier_or_ref())
            }
            other => Err(FormulaError::syntax(
                self.pos,
                format!("Unexpected character '{}'", other),
            )),
        }
    }

    fn scan_string(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        self.advance(); // Skip opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.advance();
                    // Doubled quote is an escaped quote
                    if self.eat('"') {
                        s.push('"');
                    } else {
                        return Ok(Token::Text(s));
                    }
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
                None => {
                    return Err(FormulaError::syntax(start, "Unterminated text literal"));
                }
            }
        }
    }

    fn scan_quoted_sheet(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        self.advance(); // Skip opening quote

        let mut name = String::new();
        loop {
            match self.peek_char() {
                Some('\'') => {
                    self.advance();
                    if self.eat('\'') {
                        name.push('\'');
                    } else {
                        break;
                    }
                }
                Some(c) => {
                    name.push(c);
                    self.advance();
                }
                None => return Err(FormulaError::syntax(start, "Unterminated sheet name")),
            }
        }

        if !self.eat('!') {
            return Err(FormulaError::syntax(
                self.pos,
                "Expected '!' after quoted sheet name",
            ));
        }
        Ok(Token::SheetPrefix(name))
    }

    fn scan_number(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        let mut literal = String::new();

        while let Some(c) = self.peek_char().filter(|c| c.is_ascii_digit()) {
            literal.push(c);
            self.advance();
        }

        if self.peek_char() == Some(self.culture.decimal_separator)
            && self.peek_char_at(1).map_or(true, |c| !c.is_alphabetic() || c == 'e' || c == 'E')
        {
            self.advance();
            literal.push('.');
            while let Some(c) = self.peek_char().filter(|c| c.is_ascii_digit()) {
                literal.push(c);
                self.advance();
            }
        }

        // Exponent only when digits follow, otherwise `E` starts something else
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            let signed = matches!(self.peek_char_at(1), Some('+') | Some('-'));
            let digit_at = if signed { 2 } else { 1 };
            if self
                .peek_char_at(digit_at)
                .map_or(false, |c| c.is_ascii_digit())
            {
                literal.push('e');
                self.advance();
                if signed {
                    literal.extend(self.peek_char());
                    self.advance();
                }
                while let Some(c) = self.peek_char().filter(|c| c.is_ascii_digit()) {
                    literal.push(c);
                    self.advance();
                }
            }
        }

        literal
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Token::Number)
            .ok_or_else(|| FormulaError::syntax(start, format!("Invalid number '{}'", literal)))
    }

    fn scan_error(&mut self) -> FormulaResult<Token> {
        let rest = &self.input[self.pos..];
        for literal in ERROR_LITERALS {
            let matches = rest
                .get(..literal.len())
                .map_or(false, |head| head.eq_ignore_ascii_case(literal));
            if matches {
                if let Some(kind) = ErrorKind::parse(literal) {
                    self.pos += literal.len();
                    return Ok(Token::Error(kind));
                }
            }
        }
        Err(FormulaError::syntax(self.pos, "Unknown error literal"))
    }

    fn scan_identifier_or_ref(&mut self) -> Token {
        let start = self.pos;

        while self.peek_char().map_or(false, |c| {
            c.is_alphanumeric() || c == '_' || c == '$' || c == '.' || c == '\\'
        }) {
            self.advance();
        }

        let text = &self.input[start..self.pos];

        if self.eat('!') {
            return Token::SheetPrefix(text.to_string());
        }

        // A name followed by '(' is always a function call (e.g. LOG10(100))
        let is_call = self.peek_char() == Some('(');

        if !is_call {
            if text.eq_ignore_ascii_case("TRUE") {
                return Token::Boolean(true);
            }
            if text.eq_ignore_ascii_case("FALSE") {
                return Token::Boolean(false);
            }
            if regex_is_match!(r"^\$?[A-Za-z]{1,3}\$?[1-9][0-9]*$", text) {
                return Token::CellRef(text.to_string());
            }
        }

        Token::Identifier(text.to_string())
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }
}
