//! [`Formula`]: a parsed, reusable expression bound to a target format.

use crate::ast::Expr;
use crate::deps::{capture, DepContext};
use crate::error::{EvalError, ParseError, SemanticsError};
use crate::eval::{evaluate, EvalContext};
use crate::runtime::FormulaRuntime;
use crate::semantics::{check, SemanticsContext};
use skein_core::{Format, ScopeId, Value};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A parsed formula with the format its results are asserted to have.
///
/// The tree is parsed once and shared by reference between passes.
/// Equality and hashing use the canonical reconstruction text plus the
/// format, so `"a + 2"` and `"a+2"` are the same formula while the
/// logically equivalent `"2+a"` is not.
#[derive(Clone, Debug)]
pub struct Formula {
    root: Expr,
    format: Format,
    canonical: String,
}

impl Formula {
    /// Parse source text into a formula asserted to produce `format`.
    pub fn parse(text: &str, format: Format) -> Result<Self, ParseError> {
        let root = crate::parser::parse(text)?;
        let canonical = root.to_string();
        Ok(Self {
            root,
            format,
            canonical,
        })
    }

    /// The format this formula's results are asserted to have.
    pub fn format(&self) -> &Format {
        &self.format
    }

    /// The parsed expression tree.
    pub fn root(&self) -> &Expr {
        &self.root
    }

    /// The canonical reconstruction text.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Semantic-check this formula against a legal scope.
    ///
    /// The formula is valid when the tree checks out and its result format
    /// is a subformat of the asserted format.
    pub fn validate(
        &self,
        runtime: &FormulaRuntime,
        scope: ScopeId,
    ) -> Result<(), SemanticsError> {
        let mut ctx = SemanticsContext::new(runtime, scope);
        let found = check(&self.root, &mut ctx, Some(&self.format))?;
        if found.is_subformat_of(&self.format) {
            Ok(())
        } else {
            Err(SemanticsError::FormatMismatch {
                expected: self.format.clone(),
                found,
            })
        }
    }

    /// Capture this formula's dependencies into the given collector.
    pub fn dependencies(&self, ctx: &mut DepContext<'_>) -> Result<(), SemanticsError> {
        capture(&self.root, ctx)
    }

    /// Evaluate this formula, asserting its format on the context.
    pub fn resolve(&self, ctx: &mut EvalContext<'_>) -> Result<Value, EvalError> {
        ctx.with_asserted(Some(self.format.clone()), |ctx| evaluate(&self.root, ctx))
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl PartialEq for Formula {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical && self.format == other.format
    }
}

impl Eq for Formula {}

impl Hash for Formula {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
        self.format.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_canonical_text_plus_format() {
        let a = Formula::parse("a + 2", Format::Integer).unwrap();
        let b = Formula::parse("a+2", Format::Integer).unwrap();
        let c = Formula::parse("2+a", Format::Integer).unwrap();
        let d = Formula::parse("a+2", Format::Real).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(a.to_string(), "a+2");
    }

    #[test]
    fn validate_accepts_subformat_results() {
        let mut runtime = FormulaRuntime::new();
        let global = runtime.scopes.global_scope();
        runtime
            .assert_variable("hp", global, Format::Integer)
            .unwrap();

        // An integer-valued formula is a fine REAL formula.
        Formula::parse("hp+3", Format::Real)
            .unwrap()
            .validate(&runtime, global)
            .unwrap();

        // The reverse is not: division produces a real.
        let err = Formula::parse("hp/2", Format::Integer)
            .unwrap()
            .validate(&runtime, global)
            .unwrap_err();
        assert!(matches!(err, SemanticsError::FormatMismatch { .. }));
    }

    #[test]
    fn resolve_uses_the_asserted_format() {
        let runtime = FormulaRuntime::new();
        let store = skein_core::VariableStore::new();
        let formula = Formula::parse("3+4", Format::Integer).unwrap();
        let mut ctx = EvalContext::new(&runtime, &store, runtime.scopes.global_instance());
        assert_eq!(formula.resolve(&mut ctx), Ok(Value::Int(7)));
    }
}
