//! The array-component modifier: applies an inner modifier to one
//! position of an array value.

use crate::modifier::Modifier;
use skein_core::{Format, Value};
use skein_formula::{DepContext, EvalContext, EvalError, SemanticsError};
use std::sync::Arc;

/// Wraps a modifier of element format `T` to act on position `index` of
/// an array-of-`T` value.
///
/// The modification applies only when the array is long enough: if the
/// input array has no element at `index`, the modifier is a no-op and the
/// input passes through unchanged. Otherwise the array is copied, the
/// element at `index` becomes the inner modifier's INPUT, and the inner
/// result lands back at `index`.
pub struct ArrayComponentModifier {
    index: usize,
    inner: Arc<dyn Modifier>,
    operation: String,
}

impl ArrayComponentModifier {
    /// Wrap `inner` to act on `index` of an array value.
    pub fn new(index: usize, inner: Arc<dyn Modifier>) -> Self {
        let operation = format!("{}[{index}]", inner.operation());
        Self {
            index,
            inner,
            operation,
        }
    }

    /// The array position this modifier targets.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Modifier for ArrayComponentModifier {
    fn process(&self, ctx: &mut EvalContext<'_>) -> Result<Value, EvalError> {
        let input = ctx.input().cloned().ok_or_else(|| EvalError::Internal {
            detail: "array-component modifier processed with no input".to_string(),
        })?;
        let (elem, items) = match input {
            Value::Array { elem, items } => (elem, items),
            other => {
                return Err(EvalError::Internal {
                    detail: format!(
                        "array-component modifier over non-array {}",
                        other.format()
                    ),
                })
            }
        };
        if self.index >= items.len() {
            return Ok(Value::Array { elem, items });
        }
        let element = items[self.index].clone();
        let replacement = ctx.with_input(element, |ctx| self.inner.process(ctx))?;
        let mut items = items;
        items[self.index] = replacement;
        Ok(Value::Array { elem, items })
    }

    fn dependencies(&self, ctx: &mut DepContext<'_>) -> Result<(), SemanticsError> {
        self.inner.dependencies(ctx)
    }

    fn priority(&self) -> u32 {
        self.inner.priority()
    }

    fn operation(&self) -> &str {
        &self.operation
    }

    fn instructions(&self) -> String {
        self.inner.instructions()
    }

    fn format(&self) -> Format {
        self.inner.format().array_of()
    }
}
