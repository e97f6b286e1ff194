//! The parsed expression tree and its canonical reconstruction.

use std::fmt;

/// A binary operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%`
    Remainder,
    /// `^`
    Power,
    /// `<`
    LessThan,
    /// `>`
    GreaterThan,
    /// `<=`
    LessOrEqual,
    /// `>=`
    GreaterOrEqual,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `&&`
    And,
    /// `||`
    Or,
}

impl BinaryOp {
    /// The surface-syntax symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Remainder => "%",
            Self::Power => "^",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::LessOrEqual => "<=",
            Self::GreaterOrEqual => ">=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }

    /// Whether operand evaluation inherits the current asserted format.
    ///
    /// Arithmetic operands see the surrounding assertion; comparison and
    /// logical operands do not, since nothing can be asserted about the
    /// sides of a truth-valued operator.
    pub fn children_inherit_assertion(&self) -> bool {
        matches!(
            self,
            Self::Add
                | Self::Subtract
                | Self::Multiply
                | Self::Divide
                | Self::Remainder
                | Self::Power
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A unary operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Numeric negation, `-`.
    Minus,
    /// Boolean negation, `!`.
    Not,
}

impl UnaryOp {
    /// The surface-syntax symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Minus => "-",
            Self::Not => "!",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A parsed expression.
///
/// The tree is immutable after parse; the visitor passes walk it by
/// reference and never modify it. Literal spellings are stored verbatim so
/// reconstruction reproduces the source (`3.10` stays `3.10`), and
/// explicit grouping survives as [`Expr::Paren`] nodes for the same
/// reason.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A number literal, original spelling preserved.
    Number(String),
    /// A quoted string literal, quotes stripped.
    Str(String),
    /// A variable reference.
    Variable(String),
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The single operand.
        operand: Box<Expr>,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// Explicit grouping parentheses.
    Paren(Box<Expr>),
    /// A function call.
    Call {
        /// The function name.
        name: String,
        /// The argument expressions, possibly empty.
        args: Vec<Expr>,
    },
}

impl fmt::Display for Expr {
    /// Canonical reconstruction: whitespace-free, literal spellings and
    /// explicit parentheses preserved. Parsing the output of `Display`
    /// yields a tree that displays identically, which is what makes
    /// canonical text a sound equality key for formulas.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(text) => f.write_str(text),
            Self::Str(text) => write!(f, "\"{text}\""),
            Self::Variable(name) => f.write_str(name),
            Self::Unary { op, operand } => write!(f, "{op}{operand}"),
            Self::Binary { op, lhs, rhs } => write!(f, "{lhs}{op}{rhs}"),
            Self::Paren(inner) => write!(f, "({inner})"),
            Self::Call { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_preserves_literal_spelling_and_grouping() {
        let expr = Expr::Binary {
            op: BinaryOp::Multiply,
            lhs: Box::new(Expr::Paren(Box::new(Expr::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(Expr::Variable("a".into())),
                rhs: Box::new(Expr::Number("2.50".into())),
            }))),
            rhs: Box::new(Expr::Variable("b".into())),
        };
        assert_eq!(expr.to_string(), "(a+2.50)*b");
    }

    #[test]
    fn display_renders_calls_with_comma_separated_args() {
        let expr = Expr::Call {
            name: "max".into(),
            args: vec![Expr::Number("1".into()), Expr::Number("2".into())],
        };
        assert_eq!(expr.to_string(), "max(1,2)");
    }
}
