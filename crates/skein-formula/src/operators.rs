//! Operator actions and the operator library.
//!
//! Each action is a trio: the operator it serves, an abstract evaluation
//! over formats (`None` means "not mine, try the next action"), and the
//! value-level evaluation. Multiple actions may serve one operator; the
//! library dispatches to the first whose abstract evaluation accepts the
//! operand formats.

use crate::ast::{BinaryOp, UnaryOp};
use crate::error::EvalError;
use indexmap::IndexMap;
use skein_core::{Format, Value};

// ── Traits ─────────────────────────────────────────────────────────

/// One implementation of a binary operator for particular operand formats.
pub trait OpAction: Send + Sync {
    /// The operator this action serves.
    fn operator(&self) -> BinaryOp;

    /// Format-level evaluation: the result format if this action can
    /// combine the given operand formats, `None` otherwise.
    fn abstract_evaluate(&self, left: &Format, right: &Format) -> Option<Format>;

    /// Value-level evaluation. Only called with values whose formats this
    /// action accepted abstractly.
    fn evaluate(&self, left: &Value, right: &Value) -> Result<Value, EvalError>;
}

/// One implementation of a unary operator for a particular operand format.
pub trait UnaryAction: Send + Sync {
    /// The operator this action serves.
    fn operator(&self) -> UnaryOp;

    /// Format-level evaluation, as in [`OpAction::abstract_evaluate`].
    fn abstract_evaluate(&self, operand: &Format) -> Option<Format>;

    /// Value-level evaluation.
    fn evaluate(&self, operand: &Value) -> Result<Value, EvalError>;
}

// ── Library ────────────────────────────────────────────────────────

/// Holds the registered operator actions and performs first-match dispatch.
#[derive(Default)]
pub struct OperatorLibrary {
    binary: IndexMap<BinaryOp, Vec<Box<dyn OpAction>>>,
    unary: IndexMap<UnaryOp, Vec<Box<dyn UnaryAction>>>,
}

impl OperatorLibrary {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a library with the built-in actions registered.
    pub fn with_builtins() -> Self {
        let mut lib = Self::new();
        for op in [
            BinaryOp::Add,
            BinaryOp::Subtract,
            BinaryOp::Multiply,
            BinaryOp::Remainder,
        ] {
            lib.add_action(Box::new(NumberArithmetic { op }));
        }
        lib.add_action(Box::new(NumberDivide));
        lib.add_action(Box::new(NumberPower));
        for op in [
            BinaryOp::LessThan,
            BinaryOp::GreaterThan,
            BinaryOp::LessOrEqual,
            BinaryOp::GreaterOrEqual,
        ] {
            lib.add_action(Box::new(NumberRelation { op }));
        }
        for op in [BinaryOp::Equal, BinaryOp::NotEqual] {
            // Numeric equality first so 3 == 3.0 compares by value; the
            // generic action covers the remaining same-format scalars.
            lib.add_action(Box::new(NumberEquality { op }));
            lib.add_action(Box::new(GenericEquality { op }));
        }
        for op in [BinaryOp::And, BinaryOp::Or] {
            lib.add_action(Box::new(BooleanLogic { op }));
        }
        lib.add_unary_action(Box::new(NumberNegate));
        lib.add_unary_action(Box::new(BooleanNot));
        lib
    }

    /// Register a binary action. Actions for one operator are tried in
    /// registration order.
    pub fn add_action(&mut self, action: Box<dyn OpAction>) {
        self.binary.entry(action.operator()).or_default().push(action);
    }

    /// Register a unary action.
    pub fn add_unary_action(&mut self, action: Box<dyn UnaryAction>) {
        self.unary.entry(action.operator()).or_default().push(action);
    }

    /// Result format of `op` on the given operand formats, if any action
    /// accepts them.
    pub fn abstract_binary(&self, op: BinaryOp, left: &Format, right: &Format) -> Option<Format> {
        self.binary
            .get(&op)?
            .iter()
            .find_map(|action| action.abstract_evaluate(left, right))
    }

    /// Evaluate `op` on the given values via the first accepting action.
    pub fn evaluate_binary(
        &self,
        op: BinaryOp,
        left: &Value,
        right: &Value,
    ) -> Result<Value, EvalError> {
        let (lf, rf) = (left.format(), right.format());
        if let Some(actions) = self.binary.get(&op) {
            for action in actions {
                if action.abstract_evaluate(&lf, &rf).is_some() {
                    return action.evaluate(left, right);
                }
            }
        }
        Err(EvalError::Internal {
            detail: format!("no action for '{op}' on {lf} and {rf}"),
        })
    }

    /// Result format of unary `op` on the given operand format.
    pub fn abstract_unary(&self, op: UnaryOp, operand: &Format) -> Option<Format> {
        self.unary
            .get(&op)?
            .iter()
            .find_map(|action| action.abstract_evaluate(operand))
    }

    /// Evaluate unary `op` on the given value.
    pub fn evaluate_unary(&self, op: UnaryOp, operand: &Value) -> Result<Value, EvalError> {
        let of = operand.format();
        if let Some(actions) = self.unary.get(&op) {
            for action in actions {
                if action.abstract_evaluate(&of).is_some() {
                    return action.evaluate(operand);
                }
            }
        }
        Err(EvalError::Internal {
            detail: format!("no action for unary '{op}' on {of}"),
        })
    }
}

// ── Built-in actions ───────────────────────────────────────────────

fn numeric_pair(left: &Format, right: &Format) -> bool {
    left.is_numeric() && right.is_numeric()
}

fn as_reals(left: &Value, right: &Value) -> Result<(f64, f64), EvalError> {
    match (left.as_real(), right.as_real()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(EvalError::Internal {
            detail: "numeric action applied to non-numeric values".to_string(),
        }),
    }
}

/// `+ - * %` over numbers; two integers stay an integer (wrapping), any
/// real operand widens the result to a real.
struct NumberArithmetic {
    op: BinaryOp,
}

impl OpAction for NumberArithmetic {
    fn operator(&self) -> BinaryOp {
        self.op
    }

    fn abstract_evaluate(&self, left: &Format, right: &Format) -> Option<Format> {
        if !numeric_pair(left, right) {
            return None;
        }
        if *left == Format::Integer && *right == Format::Integer {
            Some(Format::Integer)
        } else {
            Some(Format::Real)
        }
    }

    fn evaluate(&self, left: &Value, right: &Value) -> Result<Value, EvalError> {
        if let (Value::Int(a), Value::Int(b)) = (left, right) {
            let result = match self.op {
                BinaryOp::Add => a.wrapping_add(*b),
                BinaryOp::Subtract => a.wrapping_sub(*b),
                BinaryOp::Multiply => a.wrapping_mul(*b),
                BinaryOp::Remainder => {
                    if *b == 0 {
                        return Err(EvalError::BadOperand {
                            op: self.op.symbol().to_string(),
                            detail: "integer remainder by zero".to_string(),
                        });
                    }
                    a.wrapping_rem(*b)
                }
                _ => {
                    return Err(EvalError::Internal {
                        detail: format!("'{}' is not an arithmetic operator", self.op),
                    })
                }
            };
            return Ok(Value::Int(result));
        }
        let (a, b) = as_reals(left, right)?;
        let result = match self.op {
            BinaryOp::Add => a + b,
            BinaryOp::Subtract => a - b,
            BinaryOp::Multiply => a * b,
            BinaryOp::Remainder => a % b,
            _ => {
                return Err(EvalError::Internal {
                    detail: format!("'{}' is not an arithmetic operator", self.op),
                })
            }
        };
        Ok(Value::Real(result))
    }
}

/// `/` over numbers, always real-valued.
struct NumberDivide;

impl OpAction for NumberDivide {
    fn operator(&self) -> BinaryOp {
        BinaryOp::Divide
    }

    fn abstract_evaluate(&self, left: &Format, right: &Format) -> Option<Format> {
        numeric_pair(left, right).then_some(Format::Real)
    }

    fn evaluate(&self, left: &Value, right: &Value) -> Result<Value, EvalError> {
        let (a, b) = as_reals(left, right)?;
        Ok(Value::Real(a / b))
    }
}

/// `^` over numbers, always real-valued.
struct NumberPower;

impl OpAction for NumberPower {
    fn operator(&self) -> BinaryOp {
        BinaryOp::Power
    }

    fn abstract_evaluate(&self, left: &Format, right: &Format) -> Option<Format> {
        numeric_pair(left, right).then_some(Format::Real)
    }

    fn evaluate(&self, left: &Value, right: &Value) -> Result<Value, EvalError> {
        let (a, b) = as_reals(left, right)?;
        Ok(Value::Real(a.powf(b)))
    }
}

/// `< > <= >=` over numbers.
struct NumberRelation {
    op: BinaryOp,
}

impl OpAction for NumberRelation {
    fn operator(&self) -> BinaryOp {
        self.op
    }

    fn abstract_evaluate(&self, left: &Format, right: &Format) -> Option<Format> {
        numeric_pair(left, right).then_some(Format::Boolean)
    }

    fn evaluate(&self, left: &Value, right: &Value) -> Result<Value, EvalError> {
        let (a, b) = as_reals(left, right)?;
        let result = match self.op {
            BinaryOp::LessThan => a < b,
            BinaryOp::GreaterThan => a > b,
            BinaryOp::LessOrEqual => a <= b,
            BinaryOp::GreaterOrEqual => a >= b,
            _ => {
                return Err(EvalError::Internal {
                    detail: format!("'{}' is not a relational operator", self.op),
                })
            }
        };
        Ok(Value::Bool(result))
    }
}

/// `== !=` over numbers, comparing by numeric value across Integer/Real.
struct NumberEquality {
    op: BinaryOp,
}

impl OpAction for NumberEquality {
    fn operator(&self) -> BinaryOp {
        self.op
    }

    fn abstract_evaluate(&self, left: &Format, right: &Format) -> Option<Format> {
        numeric_pair(left, right).then_some(Format::Boolean)
    }

    fn evaluate(&self, left: &Value, right: &Value) -> Result<Value, EvalError> {
        let (a, b) = as_reals(left, right)?;
        let equal = a == b;
        Ok(Value::Bool(if self.op == BinaryOp::Equal {
            equal
        } else {
            !equal
        }))
    }
}

/// `== !=` over two values of the same non-array scalar format.
///
/// Arrays are refused; element-wise comparison semantics belong to a
/// dedicated action if a client wants them.
struct GenericEquality {
    op: BinaryOp,
}

impl OpAction for GenericEquality {
    fn operator(&self) -> BinaryOp {
        self.op
    }

    fn abstract_evaluate(&self, left: &Format, right: &Format) -> Option<Format> {
        if left == right && !matches!(left, Format::Array(_)) {
            Some(Format::Boolean)
        } else {
            None
        }
    }

    fn evaluate(&self, left: &Value, right: &Value) -> Result<Value, EvalError> {
        let equal = left == right;
        Ok(Value::Bool(if self.op == BinaryOp::Equal {
            equal
        } else {
            !equal
        }))
    }
}

/// `&& ||` over booleans.
struct BooleanLogic {
    op: BinaryOp,
}

impl OpAction for BooleanLogic {
    fn operator(&self) -> BinaryOp {
        self.op
    }

    fn abstract_evaluate(&self, left: &Format, right: &Format) -> Option<Format> {
        (*left == Format::Boolean && *right == Format::Boolean).then_some(Format::Boolean)
    }

    fn evaluate(&self, left: &Value, right: &Value) -> Result<Value, EvalError> {
        match (left.as_bool(), right.as_bool()) {
            (Some(a), Some(b)) => Ok(Value::Bool(if self.op == BinaryOp::And {
                a && b
            } else {
                a || b
            })),
            _ => Err(EvalError::Internal {
                detail: "boolean action applied to non-boolean values".to_string(),
            }),
        }
    }
}

/// Unary `-` over numbers; integers negate to integers, reals to reals.
struct NumberNegate;

impl UnaryAction for NumberNegate {
    fn operator(&self) -> UnaryOp {
        UnaryOp::Minus
    }

    fn abstract_evaluate(&self, operand: &Format) -> Option<Format> {
        operand.is_numeric().then(|| operand.clone())
    }

    fn evaluate(&self, operand: &Value) -> Result<Value, EvalError> {
        match operand {
            Value::Int(i) => Ok(Value::Int(i.wrapping_neg())),
            Value::Real(r) => Ok(Value::Real(-r)),
            _ => Err(EvalError::Internal {
                detail: "unary minus applied to a non-numeric value".to_string(),
            }),
        }
    }
}

/// Unary `!` over booleans.
struct BooleanNot;

impl UnaryAction for BooleanNot {
    fn operator(&self) -> UnaryOp {
        UnaryOp::Not
    }

    fn abstract_evaluate(&self, operand: &Format) -> Option<Format> {
        (*operand == Format::Boolean).then_some(Format::Boolean)
    }

    fn evaluate(&self, operand: &Value) -> Result<Value, EvalError> {
        match operand {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            _ => Err(EvalError::Internal {
                detail: "unary not applied to a non-boolean value".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lib() -> OperatorLibrary {
        OperatorLibrary::with_builtins()
    }

    #[test]
    fn integer_arithmetic_stays_integer() {
        assert_eq!(
            lib().evaluate_binary(BinaryOp::Add, &Value::Int(3), &Value::Int(2)),
            Ok(Value::Int(5))
        );
        assert_eq!(
            lib().evaluate_binary(BinaryOp::Multiply, &Value::Int(5), &Value::Int(4)),
            Ok(Value::Int(20))
        );
        assert_eq!(
            lib().abstract_binary(BinaryOp::Add, &Format::Integer, &Format::Integer),
            Some(Format::Integer)
        );
    }

    #[test]
    fn real_operand_widens_the_result() {
        assert_eq!(
            lib().evaluate_binary(BinaryOp::Add, &Value::Int(3), &Value::Real(0.5)),
            Ok(Value::Real(3.5))
        );
        assert_eq!(
            lib().abstract_binary(BinaryOp::Add, &Format::Integer, &Format::Real),
            Some(Format::Real)
        );
    }

    #[test]
    fn division_and_power_are_always_real() {
        assert_eq!(
            lib().abstract_binary(BinaryOp::Divide, &Format::Integer, &Format::Integer),
            Some(Format::Real)
        );
        assert_eq!(
            lib().evaluate_binary(BinaryOp::Power, &Value::Int(2), &Value::Int(3)),
            Ok(Value::Real(8.0))
        );
    }

    #[test]
    fn integer_remainder_by_zero_is_a_bad_operand() {
        assert!(matches!(
            lib().evaluate_binary(BinaryOp::Remainder, &Value::Int(5), &Value::Int(0)),
            Err(EvalError::BadOperand { .. })
        ));
    }

    #[test]
    fn numeric_equality_compares_across_integer_and_real() {
        assert_eq!(
            lib().evaluate_binary(BinaryOp::Equal, &Value::Int(3), &Value::Real(3.0)),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            lib().evaluate_binary(BinaryOp::NotEqual, &Value::Int(3), &Value::Real(3.5)),
            Ok(Value::Bool(true))
        );
    }

    #[test]
    fn generic_equality_covers_scalars_but_not_arrays() {
        assert_eq!(
            lib().evaluate_binary(
                BinaryOp::Equal,
                &Value::Text("on".into()),
                &Value::Text("on".into())
            ),
            Ok(Value::Bool(true))
        );
        let ints = Format::Integer.array_of();
        assert_eq!(lib().abstract_binary(BinaryOp::Equal, &ints, &ints), None);
    }

    #[test]
    fn unary_minus_preserves_integer_and_real() {
        assert_eq!(
            lib().evaluate_unary(UnaryOp::Minus, &Value::Int(4)),
            Ok(Value::Int(-4))
        );
        assert_eq!(
            lib().evaluate_unary(UnaryOp::Minus, &Value::Real(4.5)),
            Ok(Value::Real(-4.5))
        );
        assert_eq!(
            lib().abstract_unary(UnaryOp::Minus, &Format::Integer),
            Some(Format::Integer)
        );
    }

    #[test]
    fn dispatch_failure_is_an_internal_error() {
        assert!(matches!(
            lib().evaluate_binary(BinaryOp::Add, &Value::Bool(true), &Value::Int(1)),
            Err(EvalError::Internal { .. })
        ));
        assert_eq!(
            lib().abstract_binary(BinaryOp::And, &Format::Integer, &Format::Boolean),
            None
        );
    }
}
