//! The semantic pass: format-checks an expression before it may be
//! evaluated.

use crate::ast::Expr;
use crate::error::SemanticsError;
use crate::runtime::FormulaRuntime;
use skein_core::{Format, ScopeId};

/// Context threaded through the semantic check.
///
/// Carries the legal scope the formula is checked against and a stack of
/// macro-argument frames for `arg(n)` resolution.
pub struct SemanticsContext<'a> {
    runtime: &'a FormulaRuntime,
    scope: ScopeId,
    macro_args: Vec<Vec<Expr>>,
}

impl<'a> SemanticsContext<'a> {
    /// Create a context checking against the given legal scope.
    pub fn new(runtime: &'a FormulaRuntime, scope: ScopeId) -> Self {
        Self {
            runtime,
            scope,
            macro_args: Vec::new(),
        }
    }

    /// The injected collaborators.
    pub fn runtime(&self) -> &'a FormulaRuntime {
        self.runtime
    }

    /// The legal scope identifiers resolve against.
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// The current macro-argument frame, if a macro call is in progress.
    pub fn macro_frame(&self) -> Option<&[Expr]> {
        self.macro_args.last().map(Vec::as_slice)
    }

    /// Run `body` with a macro-argument frame pushed; the frame is popped
    /// on every exit path.
    pub fn with_macro_args<R>(
        &mut self,
        frame: Vec<Expr>,
        body: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.macro_args.push(frame);
        let result = body(self);
        self.macro_args.pop();
        result
    }
}

/// Check an expression, returning its result format.
///
/// `asserted` is the inherited attribute: the format the surrounding
/// context expects, if it expects one. Operator operands are checked with
/// no assertion; functions receive the assertion and decide what to do
/// with it. The caller is responsible for comparing the returned format
/// against its own requirement (see `Formula::validate`).
pub fn check(
    expr: &Expr,
    ctx: &mut SemanticsContext<'_>,
    asserted: Option<&Format>,
) -> Result<Format, SemanticsError> {
    match expr {
        Expr::Number(text) => classify_number(text),
        Expr::Str(_) => Ok(Format::Text),
        Expr::Variable(name) => {
            let runtime = ctx.runtime();
            runtime
                .variables
                .visible_format(&runtime.scopes, ctx.scope(), name)
                .cloned()
                .ok_or_else(|| SemanticsError::UnknownVariable {
                    name: name.clone(),
                    scope: runtime.scopes.scope_name(ctx.scope()).to_string(),
                })
        }
        Expr::Paren(inner) => check(inner, ctx, asserted),
        Expr::Unary { op, operand } => {
            let operand_format = check(operand, ctx, None)?;
            ctx.runtime()
                .operators
                .abstract_unary(*op, &operand_format)
                .ok_or_else(|| SemanticsError::BadOperand {
                    op: op.symbol().to_string(),
                    left: operand_format,
                    right: None,
                })
        }
        Expr::Binary { op, lhs, rhs } => {
            let left = check(lhs, ctx, None)?;
            let right = check(rhs, ctx, None)?;
            ctx.runtime()
                .operators
                .abstract_binary(*op, &left, &right)
                .ok_or_else(|| SemanticsError::BadOperand {
                    op: op.symbol().to_string(),
                    left,
                    right: Some(right),
                })
        }
        Expr::Call { name, args } => {
            let runtime = ctx.runtime();
            let function =
                runtime
                    .functions
                    .lookup(name)
                    .ok_or_else(|| SemanticsError::UnknownFunction {
                        name: name.clone(),
                    })?;
            function.check_semantics(ctx, args, asserted)
        }
    }
}

/// Classify a number literal: integer when it parses as a signed integer,
/// real otherwise.
pub(crate) fn classify_number(text: &str) -> Result<Format, SemanticsError> {
    if text.parse::<i64>().is_ok() {
        Ok(Format::Integer)
    } else if text.parse::<f64>().is_ok() {
        Ok(Format::Real)
    } else {
        Err(SemanticsError::BadNumber {
            text: text.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn runtime_with_vars() -> FormulaRuntime {
        let mut runtime = FormulaRuntime::new();
        let global = runtime.scopes.global_scope();
        runtime
            .assert_variable("hp", global, Format::Integer)
            .unwrap();
        runtime
            .assert_variable("ratio", global, Format::Real)
            .unwrap();
        runtime
            .assert_variable("alive", global, Format::Boolean)
            .unwrap();
        runtime
    }

    fn check_str(runtime: &FormulaRuntime, src: &str) -> Result<Format, SemanticsError> {
        let expr = parse(src).unwrap();
        let mut ctx = SemanticsContext::new(runtime, runtime.scopes.global_scope());
        check(&expr, &mut ctx, None)
    }

    #[test]
    fn literals_classify_by_spelling() {
        let runtime = FormulaRuntime::new();
        assert_eq!(check_str(&runtime, "3"), Ok(Format::Integer));
        assert_eq!(check_str(&runtime, "3.5"), Ok(Format::Real));
        assert_eq!(check_str(&runtime, "\"text\""), Ok(Format::Text));
        // Too large for i64, still a valid real.
        assert_eq!(
            check_str(&runtime, "99999999999999999999"),
            Ok(Format::Real)
        );
    }

    #[test]
    fn variables_resolve_through_the_library() {
        let runtime = runtime_with_vars();
        assert_eq!(check_str(&runtime, "hp+2"), Ok(Format::Integer));
        assert_eq!(check_str(&runtime, "hp+ratio"), Ok(Format::Real));
        assert!(matches!(
            check_str(&runtime, "mana"),
            Err(SemanticsError::UnknownVariable { .. })
        ));
    }

    #[test]
    fn operator_misuse_is_a_bad_operand() {
        let runtime = runtime_with_vars();
        assert!(matches!(
            check_str(&runtime, "alive+1"),
            Err(SemanticsError::BadOperand { .. })
        ));
        assert!(matches!(
            check_str(&runtime, "-alive"),
            Err(SemanticsError::BadOperand { .. })
        ));
        assert_eq!(check_str(&runtime, "!alive"), Ok(Format::Boolean));
        assert_eq!(check_str(&runtime, "hp<3&&alive"), Ok(Format::Boolean));
    }

    #[test]
    fn malformed_number_nodes_are_rejected() {
        // The parser never produces one, but hand-built trees can.
        let runtime = FormulaRuntime::new();
        let expr = Expr::Number("12abc".to_string());
        let mut ctx = SemanticsContext::new(&runtime, runtime.scopes.global_scope());
        assert!(matches!(
            check(&expr, &mut ctx, None),
            Err(SemanticsError::BadNumber { .. })
        ));
    }

    #[test]
    fn unknown_functions_are_rejected() {
        let runtime = runtime_with_vars();
        assert!(matches!(
            check_str(&runtime, "frobnicate(1)"),
            Err(SemanticsError::UnknownFunction { .. })
        ));
    }
}
