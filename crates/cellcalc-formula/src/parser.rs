//! Formula parser
//!
//! A recursive descent parser for spreadsheet formulas with proper operator
//! precedence. Precedence, loosest to tightest:
//!
//! 1. Comparison: `=`, `<>`, `<`, `<=`, `>`, `>=`
//! 2. Concatenation: `&`
//! 3. Addition/Subtraction: `+`, `-`
//! 4. Multiplication/Division: `*`, `/`
//! 5. Exponentiation: `^` (right-associative)
//! 6. Prefix `-` and `+`
//! 7. Postfix `%`
//! 8. Intersection (a space between two references)
//! 9. Range: `:`
//! 10. Primary: literals, references, function calls, parentheses, arrays

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::lexer::tokenize;
use crate::reference::AddressExpr;
use crate::token::{Spanned, Token};
use cellcalc_core::{Culture, Value};

/// Deepest nesting the parser accepts before giving up
pub const MAX_PARSE_DEPTH: usize = 256;

/// Parse a formula written in the invariant culture
///
/// The leading `=` is optional.
///
/// # Example
/// ```rust
/// use cellcalc_formula::parse_formula;
///
/// let ast = parse_formula("=1+2").unwrap();
/// assert_eq!(ast.to_string(), "1+2");
///
/// let ast = parse_formula("IF(A1>0,\"Yes\",\"No\")").unwrap();
/// assert_eq!(ast.to_string(), "IF(A1>0,\"Yes\",\"No\")");
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<Expr> {
    parse_formula_with(formula, &Culture::invariant())
}

/// Parse a formula written with the given culture's separators
pub fn parse_formula_with(formula: &str, culture: &Culture) -> FormulaResult<Expr> {
    let mut tokens = tokenize(formula, culture)?;

    // Strip the leading '=' marker
    if tokens.first().map_or(false, |t| t.token == Token::Equal) {
        tokens.remove(0);
    }

    let mut parser = FormulaParser::new(tokens);
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    let rest = parser.current();
    if rest.token != Token::EndOfInput {
        return Err(FormulaError::syntax(
            rest.position,
            format!("Unexpected '{}' after end of expression", rest.token),
        ));
    }

    Ok(expr)
}

/// Formula parser over a token stream ending in `EndOfInput`
struct FormulaParser {
    tokens: Vec<Spanned>,
    index: usize,
    depth: usize,
}

impl FormulaParser {
    fn new(tokens: Vec<Spanned>) -> Self {
        Self {
            tokens,
            index: 0,
            depth: 0,
        }
    }

    // === Token access ===

    fn current(&self) -> &Spanned {
        // The lexer always terminates the stream with EndOfInput
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.index.min(last)]
    }

    fn current_token(&self) -> &Token {
        &self.current().token
    }

    fn consume(&mut self) -> Token {
        let token = self.current_token().clone();
        if self.index < self.tokens.len() {
            self.index += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume();
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected '{}'", expected)))
        }
    }

    fn unexpected(&self, context: &str) -> FormulaError {
        let current = self.current();
        let found = match &current.token {
            Token::EndOfInput => "end of input".to_string(),
            other => format!("'{}'", other),
        };
        FormulaError::syntax(current.position, format!("Unexpected {}, {}", found, context))
    }

    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> FormulaResult<T>,
    ) -> FormulaResult<T> {
        if self.depth >= MAX_PARSE_DEPTH {
            return Err(FormulaError::NestingTooDeep {
                limit: MAX_PARSE_DEPTH,
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Runs an operator-chain loop, restoring the depth once the chain ends
    fn chained<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> FormulaResult<T>,
    ) -> FormulaResult<T> {
        let depth = self.depth;
        let result = parse(self);
        self.depth = depth;
        result
    }

    /// Each link of a left-nested chain is one more level of tree depth
    fn link(&mut self) -> FormulaResult<()> {
        if self.depth >= MAX_PARSE_DEPTH {
            return Err(FormulaError::NestingTooDeep {
                limit: MAX_PARSE_DEPTH,
            });
        }
        self.depth += 1;
        Ok(())
    }

    // === Expression parsing with precedence ===

    fn parse_expression(&mut self) -> FormulaResult<Expr> {
        self.nested(Self::parse_comparison)
    }

    fn parse_comparison(&mut self) -> FormulaResult<Expr> {
        self.chained(|p| {
            let mut left = p.parse_concatenation()?;

            loop {
                let op = match p.current_token() {
                    Token::Equal => BinaryOperator::Equal,
                    Token::NotEqual => BinaryOperator::NotEqual,
                    Token::LessThan => BinaryOperator::LessThan,
                    Token::LessEqual => BinaryOperator::LessEqual,
                    Token::GreaterThan => BinaryOperator::GreaterThan,
                    Token::GreaterEqual => BinaryOperator::GreaterEqual,
                    _ => break,
                };

                p.consume();
                p.link()?;
                let right = p.parse_concatenation()?;
                left = Expr::binary(op, left, right);
            }

            Ok(left)
        })
    }

    fn parse_concatenation(&mut self) -> FormulaResult<Expr> {
        self.chained(|p| {
            let mut left = p.parse_additive()?;

            while matches!(p.current_token(), Token::Ampersand) {
                p.consume();
                p.link()?;
                let right = p.parse_additive()?;
                left = Expr::binary(BinaryOperator::Concat, left, right);
            }

            Ok(left)
        })
    }

    fn parse_additive(&mut self) -> FormulaResult<Expr> {
        self.chained(|p| {
            let mut left = p.parse_multiplicative()?;

            loop {
                let op = match p.current_token() {
                    Token::Plus => BinaryOperator::Add,
                    Token::Minus => BinaryOperator::Subtract,
                    _ => break,
                };

                p.consume();
                p.link()?;
                let right = p.parse_multiplicative()?;
                left = Expr::binary(op, left, right);
            }

            Ok(left)
        })
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<Expr> {
        self.chained(|p| {
            let mut left = p.parse_unary()?;

            loop {
                let op = match p.current_token() {
                    Token::Star => BinaryOperator::Multiply,
                    Token::Slash => BinaryOperator::Divide,
                    _ => break,
                };

                p.consume();
                p.link()?;
                let right = p.parse_unary()?;
                left = Expr::binary(op, left, right);
            }

            Ok(left)
        })
    }

    fn parse_unary(&mut self) -> FormulaResult<Expr> {
        match self.current_token() {
            Token::Minus => {
                self.consume();
                let operand = self.nested(Self::parse_unary)?;
                Ok(Expr::unary(UnaryOperator::Negate, operand))
            }
            // Prefix plus is a no-op
            Token::Plus => {
                self.consume();
                self.nested(Self::parse_unary)
            }
            _ => self.parse_exponent(),
        }
    }

    /// `^` binds tighter than negation, so `-2^2` is `-(2^2)`
    fn parse_exponent(&mut self) -> FormulaResult<Expr> {
        let left = self.parse_percent()?;

        if matches!(self.current_token(), Token::Caret) {
            self.consume();
            // Right associative; the exponent may itself be negated
            let right = self.nested(Self::parse_unary)?;
            return Ok(Expr::binary(BinaryOperator::Power, left, right));
        }

        Ok(left)
    }

    fn parse_percent(&mut self) -> FormulaResult<Expr> {
        self.chained(|p| {
            let mut expr = p.parse_intersection()?;

            while matches!(p.current_token(), Token::Percent) {
                p.consume();
                p.link()?;
                expr = Expr::unary(UnaryOperator::Percent, expr);
            }

            Ok(expr)
        })
    }

    fn parse_intersection(&mut self) -> FormulaResult<Expr> {
        self.chained(|p| {
            let mut left = p.parse_range()?;

            while p.starts_intersection() {
                p.link()?;
                let right = p.parse_range()?;
                left = Expr::binary(BinaryOperator::Intersect, left, right);
            }

            Ok(left)
        })
    }

    /// A space followed by something that can begin a reference
    fn starts_intersection(&self) -> bool {
        let current = self.current();
        current.preceded_by_space
            && matches!(
                current.token,
                Token::CellRef(_) | Token::SheetPrefix(_) | Token::Identifier(_) | Token::LParen
            )
    }

    fn parse_range(&mut self) -> FormulaResult<Expr> {
        self.chained(|p| {
            let mut left = p.parse_primary()?;

            while matches!(p.current_token(), Token::Colon) {
                p.consume();
                p.link()?;
                let right = p.parse_primary()?;

                left = match (left, right) {
                    (Expr::Reference(start), Expr::Reference(end)) => {
                        Expr::RangeReference(start, end)
                    }
                    (left, right) => Expr::binary(BinaryOperator::Range, left, right),
                };
            }

            Ok(left)
        })
    }

    fn parse_primary(&mut self) -> FormulaResult<Expr> {
        let position = self.current().position;

        match self.current_token().clone() {
            Token::Number(n) => {
                self.consume();
                Ok(Expr::Literal(Value::Number(n)))
            }

            Token::Text(s) => {
                self.consume();
                Ok(Expr::Literal(Value::Text(s)))
            }

            Token::Boolean(b) => {
                self.consume();
                Ok(Expr::Literal(Value::Logical(b)))
            }

            Token::Error(e) => {
                self.consume();
                Ok(Expr::Literal(Value::Error(e)))
            }

            Token::LParen => {
                self.consume();
                let expr = self.chained(|p| {
                    let mut expr = p.parse_expression()?;
                    // A comma inside plain parentheses is the union operator
                    while matches!(p.current_token(), Token::Comma) {
                        p.consume();
                        p.link()?;
                        let right = p.parse_expression()?;
                        expr = Expr::binary(BinaryOperator::Union, expr, right);
                    }
                    Ok(expr)
                })?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }

            Token::LBrace => self.parse_array(),

            Token::SheetPrefix(sheet) => {
                self.consume();
                match self.current_token().clone() {
                    Token::CellRef(text) => {
                        self.consume();
                        parse_cell_reference(Some(sheet), &text, position)
                    }
                    _ => Err(self.unexpected("expected a cell reference after sheet name")),
                }
            }

            Token::CellRef(text) => {
                self.consume();
                parse_cell_reference(None, &text, position)
            }

            Token::Identifier(name) => {
                self.consume();
                if matches!(self.current_token(), Token::LParen) {
                    self.parse_function_call(name)
                } else {
                    Ok(Expr::NameRef(name))
                }
            }

            _ => Err(self.unexpected("expected a value")),
        }
    }

    fn parse_array(&mut self) -> FormulaResult<Expr> {
        let open = self.current().position;
        self.expect(&Token::LBrace)?;

        let mut rows = Vec::new();
        let mut current_row = vec![self.parse_expression()?];

        loop {
            match self.current_token() {
                Token::Comma => {
                    self.consume();
                    current_row.push(self.parse_expression()?);
                }
                Token::Semicolon => {
                    self.consume();
                    rows.push(std::mem::take(&mut current_row));
                    current_row.push(self.parse_expression()?);
                }
                Token::RBrace => break,
                _ => return Err(self.unexpected("expected ',' ';' or '}' in array")),
            }
        }
        rows.push(current_row);
        self.expect(&Token::RBrace)?;

        let width = rows[0].len();
        if rows.iter().any(|row| row.len() != width) {
            return Err(FormulaError::syntax(
                open,
                "Array rows must all have the same length",
            ));
        }

        Ok(Expr::Array(rows))
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<Expr> {
        self.expect(&Token::LParen)?;

        let mut args = Vec::new();

        if matches!(self.current_token(), Token::RParen) {
            self.consume();
            return Ok(Expr::FunctionCall { name, args });
        }

        loop {
            // An empty slot, as in IF(A1,,1), is a blank argument
            let arg = if matches!(self.current_token(), Token::Comma | Token::RParen) {
                Expr::Literal(Value::Blank)
            } else {
                self.parse_expression()?
            };
            args.push(arg);

            match self.current_token() {
                Token::Comma => {
                    self.consume();
                }
                Token::RParen => {
                    self.consume();
                    break;
                }
                _ => return Err(self.unexpected("expected ',' or ')' in argument list")),
            }
        }

        Ok(Expr::FunctionCall { name, args })
    }
}

fn parse_cell_reference(
    sheet: Option<String>,
    text: &str,
    position: usize,
) -> FormulaResult<Expr> {
    AddressExpr::parse(text, sheet)
        .map(Expr::Reference)
        .ok_or_else(|| {
            FormulaError::syntax(position, format!("Invalid cell reference '{}'", text))
        })
}
