//! Formula Abstract Syntax Tree types
//!
//! The tree is owned top-down with no back-references. `Display` writes the
//! canonical formula text (no leading `=`, only the parentheses precedence
//! requires), which parses back to the same tree.

use crate::reference::AddressExpr;
use cellcalc_core::{CellAddress, ErrorKind, Value};
use std::fmt;

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Constant value: number, text, logical, error literal or an empty argument
    Literal(Value),

    // === References ===
    /// Single cell reference
    Reference(AddressExpr),
    /// Two-corner range reference
    RangeReference(AddressExpr, AddressExpr),
    /// Defined name, resolved at evaluation time
    NameRef(String),

    // === Operators ===
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Function call; the name keeps the case it was written in
    FunctionCall { name: String, args: Vec<Expr> },

    /// Array constant, rows of elements
    Array(Vec<Vec<Expr>>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Text
    Concat,

    // Reference
    Range,
    Union,
    Intersect,
}

impl BinaryOperator {
    /// Binding strength; higher binds tighter
    fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Equal
            | BinaryOperator::NotEqual
            | BinaryOperator::LessThan
            | BinaryOperator::LessEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterEqual => 1,
            BinaryOperator::Concat => 2,
            BinaryOperator::Add | BinaryOperator::Subtract => 3,
            BinaryOperator::Multiply | BinaryOperator::Divide => 4,
            BinaryOperator::Power => 6,
            BinaryOperator::Intersect => 8,
            BinaryOperator::Range => 9,
            BinaryOperator::Union => ATOM,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Concat => "&",
            BinaryOperator::Range => ":",
            BinaryOperator::Union => ",",
            BinaryOperator::Intersect => " ",
        }
    }

    /// Whether the operator produces a reference rather than a value
    pub fn is_reference_operator(self) -> bool {
        matches!(
            self,
            BinaryOperator::Range | BinaryOperator::Union | BinaryOperator::Intersect
        )
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Percent,
}

const NEGATE: u8 = 5;
const PERCENT: u8 = 7;
const ATOM: u8 = 10;

/// A reference appearing in a formula
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precedent<'a> {
    Cell(&'a AddressExpr),
    Range(&'a AddressExpr, &'a AddressExpr),
    Name(&'a str),
}

impl Expr {
    pub fn number(n: f64) -> Self {
        Expr::Literal(Value::Number(n))
    }

    pub fn text(s: impl Into<String>) -> Self {
        Expr::Literal(Value::Text(s.into()))
    }

    pub fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Self {
        Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOperator, operand: Expr) -> Self {
        Expr::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::BinaryOp { op, .. } => op.precedence(),
            Expr::UnaryOp {
                op: UnaryOperator::Negate,
                ..
            } => NEGATE,
            Expr::UnaryOp {
                op: UnaryOperator::Percent,
                ..
            } => PERCENT,
            Expr::Literal(Value::Number(n)) if n.is_sign_negative() => NEGATE,
            _ => ATOM,
        }
    }

    /// Whether the expression denotes cells rather than a value
    pub fn is_reference(&self) -> bool {
        match self {
            Expr::Reference(_) | Expr::RangeReference(..) => true,
            Expr::BinaryOp { op, .. } => op.is_reference_operator(),
            _ => false,
        }
    }

    /// Copy the formula from one cell to another
    ///
    /// Relative components shift by the distance between the two cells.
    /// References pushed off the grid become `#REF!`.
    pub fn relocate(&self, from: CellAddress, to: CellAddress) -> Expr {
        let rows = i64::from(to.row) - i64::from(from.row);
        let cols = i64::from(to.col) - i64::from(from.col);
        self.shifted(rows, cols)
    }

    fn shifted(&self, rows: i64, cols: i64) -> Expr {
        let broken = || Expr::Literal(Value::Error(ErrorKind::CellReference));

        match self {
            Expr::Reference(addr) => addr
                .offset(rows, cols)
                .map_or_else(broken, Expr::Reference),
            Expr::RangeReference(start, end) => {
                match (start.offset(rows, cols), end.offset(rows, cols)) {
                    (Some(start), Some(end)) => Expr::RangeReference(start, end),
                    _ => broken(),
                }
            }
            Expr::UnaryOp { op, operand } => Expr::unary(*op, operand.shifted(rows, cols)),
            Expr::BinaryOp { op, left, right } => Expr::binary(
                *op,
                left.shifted(rows, cols),
                right.shifted(rows, cols),
            ),
            Expr::FunctionCall { name, args } => Expr::FunctionCall {
                name: name.clone(),
                args: args.iter().map(|a| a.shifted(rows, cols)).collect(),
            },
            Expr::Array(rows_of) => Expr::Array(
                rows_of
                    .iter()
                    .map(|row| row.iter().map(|e| e.shifted(rows, cols)).collect())
                    .collect(),
            ),
            Expr::Literal(_) | Expr::NameRef(_) => self.clone(),
        }
    }

    /// All references in the formula, in text order
    pub fn references(&self) -> Vec<Precedent<'_>> {
        let mut found = Vec::new();
        self.collect_references(&mut found);
        found
    }

    fn collect_references<'a>(&'a self, found: &mut Vec<Precedent<'a>>) {
        match self {
            Expr::Reference(addr) => found.push(Precedent::Cell(addr)),
            Expr::RangeReference(start, end) => found.push(Precedent::Range(start, end)),
            Expr::NameRef(name) => found.push(Precedent::Name(name)),
            Expr::UnaryOp { operand, .. } => operand.collect_references(found),
            Expr::BinaryOp { left, right, .. } => {
                left.collect_references(found);
                right.collect_references(found);
            }
            Expr::FunctionCall { args, .. } => {
                for arg in args {
                    arg.collect_references(found);
                }
            }
            Expr::Array(rows) => {
                for expr in rows.iter().flatten() {
                    expr.collect_references(found);
                }
            }
            Expr::Literal(_) => {}
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

fn write_literal(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Blank => Ok(()),
        Value::Number(n) => write!(f, "{}", n),
        Value::Text(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
        Value::Logical(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
        Value::Error(e) => f.write_str(e.as_str()),
        Value::Array(rows) => {
            f.write_str("{")?;
            for (i, row) in rows.iter().enumerate() {
                if i > 0 {
                    f.write_str(";")?;
                }
                for (j, v) in row.iter().enumerate() {
                    if j > 0 {
                        f.write_str(",")?;
                    }
                    write_literal(f, v)?;
                }
            }
            f.write_str("}")
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(value) => write_literal(f, value),
            Expr::Reference(addr) => write!(f, "{}", addr),
            Expr::RangeReference(start, end) => write!(f, "{}:{}", start, end),
            Expr::NameRef(name) => f.write_str(name),
            Expr::UnaryOp {
                op: UnaryOperator::Negate,
                operand,
            } => {
                f.write_str("-")?;
                write_operand(f, operand, operand.precedence() < NEGATE)
            }
            Expr::UnaryOp {
                op: UnaryOperator::Percent,
                operand,
            } => {
                write_operand(f, operand, operand.precedence() < PERCENT)?;
                f.write_str("%")
            }
            Expr::BinaryOp {
                op: BinaryOperator::Union,
                left,
                right,
            } => write!(f, "({},{})", left, right),
            Expr::BinaryOp { op, left, right } => {
                let prec = op.precedence();
                // `^` groups to the right and takes a negated right operand as is
                let (left_parens, right_parens) = if *op == BinaryOperator::Power {
                    (left.precedence() <= prec, right.precedence() < NEGATE)
                } else {
                    (left.precedence() < prec, right.precedence() <= prec)
                };
                write_operand(f, left, left_parens)?;
                f.write_str(op.symbol())?;
                write_operand(f, right, right_parens)
            }
            Expr::FunctionCall { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            Expr::Array(rows) => {
                f.write_str("{")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        f.write_str(";")?;
                    }
                    for (j, expr) in row.iter().enumerate() {
                        if j > 0 {
                            f.write_str(",")?;
                        }
                        write!(f, "{}", expr)?;
                    }
                }
                f.write_str("}")
            }
        }
    }
}
