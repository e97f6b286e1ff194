//! The evaluation pass: computes an expression's value against the
//! current variable store.

use crate::ast::Expr;
use crate::error::EvalError;
use crate::runtime::FormulaRuntime;
use skein_core::{Format, InstanceId, Value, VariableStore};
use smallvec::SmallVec;

/// Context threaded through evaluation.
///
/// Carries the injected collaborators, the read-only variable store, the
/// scope instance identifiers resolve from, and three scoped stacks: the
/// asserted format, the INPUT value modifiers thread through each other,
/// and macro-argument frames for `arg(n)`. The `with_*` helpers push and
/// restore on every exit path, so a failing sub-evaluation cannot leak
/// stack entries.
pub struct EvalContext<'a> {
    runtime: &'a FormulaRuntime,
    store: &'a VariableStore,
    instance: InstanceId,
    asserted: SmallVec<[Option<Format>; 4]>,
    input: SmallVec<[Value; 4]>,
    macro_args: Vec<Vec<Expr>>,
}

impl<'a> EvalContext<'a> {
    /// Create a context evaluating against `store` from `instance`.
    pub fn new(
        runtime: &'a FormulaRuntime,
        store: &'a VariableStore,
        instance: InstanceId,
    ) -> Self {
        Self {
            runtime,
            store,
            instance,
            asserted: SmallVec::new(),
            input: SmallVec::new(),
            macro_args: Vec::new(),
        }
    }

    /// The injected collaborators.
    pub fn runtime(&self) -> &'a FormulaRuntime {
        self.runtime
    }

    /// The read-only variable store.
    pub fn store(&self) -> &'a VariableStore {
        self.store
    }

    /// The scope instance identifiers currently resolve from.
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// The owner tag of the current instance, if any.
    pub fn owner(&self) -> Option<&'a str> {
        self.runtime.scopes.owner(self.instance)
    }

    /// The innermost asserted format, if one is in effect.
    pub fn asserted(&self) -> Option<&Format> {
        self.asserted.last().and_then(Option::as_ref)
    }

    /// The current INPUT value, if a modifier chain is in progress.
    pub fn input(&self) -> Option<&Value> {
        self.input.last()
    }

    /// The current macro-argument frame, if a macro call is in progress.
    pub fn macro_frame(&self) -> Option<&[Expr]> {
        self.macro_args.last().map(Vec::as_slice)
    }

    /// Run `body` under an asserted format (or an explicit "no assertion").
    pub fn with_asserted<R>(
        &mut self,
        format: Option<Format>,
        body: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.asserted.push(format);
        let result = body(self);
        self.asserted.pop();
        result
    }

    /// Run `body` with an INPUT value pushed.
    pub fn with_input<R>(&mut self, input: Value, body: impl FnOnce(&mut Self) -> R) -> R {
        self.input.push(input);
        let result = body(self);
        self.input.pop();
        result
    }

    /// Run `body` with identifiers resolving from a different instance.
    pub fn with_instance<R>(
        &mut self,
        instance: InstanceId,
        body: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let previous = std::mem::replace(&mut self.instance, instance);
        let result = body(self);
        self.instance = previous;
        result
    }

    /// Run `body` with a macro-argument frame pushed.
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

/// Evaluate an expression.
///
/// Assumes the expression passed the semantic check; states the check
/// rules out surface as [`EvalError::Internal`]. The one deliberate soft
/// path: an identifier whose value is not in the store yet evaluates to
/// its format's default (with a warning), because the solver manager
/// recomputes every dependent once the dependency stabilizes.
pub fn evaluate(expr: &Expr, ctx: &mut EvalContext<'_>) -> Result<Value, EvalError> {
    match expr {
        Expr::Number(text) => {
            if let Ok(int) = text.parse::<i64>() {
                Ok(Value::Int(int))
            } else {
                text.parse::<f64>()
                    .map(Value::Real)
                    .map_err(|_| EvalError::Internal {
                        detail: format!("unparsable number literal '{text}'"),
                    })
            }
        }
        Expr::Str(text) => Ok(Value::Text(text.clone())),
        Expr::Variable(name) => {
            let runtime = ctx.runtime();
            match runtime
                .variables
                .identifier_for(&runtime.scopes, ctx.instance(), name)
            {
                Ok(id) => match ctx.store().get(&id) {
                    Some(value) => Ok(value.clone()),
                    None => {
                        tracing::warn!(
                            variable = %id,
                            "variable not yet computed, substituting the format default"
                        );
                        Ok(id.format().default_value())
                    }
                },
                Err(_) => {
                    tracing::warn!(
                        variable = name.as_str(),
                        "evaluation reached an undeclared variable, substituting zero"
                    );
                    Ok(Value::Int(0))
                }
            }
        }
        Expr::Paren(inner) => evaluate(inner, ctx),
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, ctx)?;
            ctx.runtime().operators.evaluate_unary(*op, &value)
        }
        Expr::Binary { op, lhs, rhs } => {
            let (left, right) = if op.children_inherit_assertion() {
                (evaluate(lhs, ctx)?, evaluate(rhs, ctx)?)
            } else {
                let left = ctx.with_asserted(None, |ctx| evaluate(lhs, ctx))?;
                let right = ctx.with_asserted(None, |ctx| evaluate(rhs, ctx))?;
                (left, right)
            };
            ctx.runtime().operators.evaluate_binary(*op, &left, &right)
        }
        Expr::Call { name, args } => {
            let runtime = ctx.runtime();
            let function =
                runtime
                    .functions
                    .lookup(name)
                    .ok_or_else(|| EvalError::UnknownFunction {
                        name: name.clone(),
                    })?;
            let asserted = ctx.asserted().cloned();
            function.evaluate(ctx, args, asserted.as_ref())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use skein_core::VarId;

    fn eval_str(
        runtime: &FormulaRuntime,
        store: &VariableStore,
        src: &str,
    ) -> Result<Value, EvalError> {
        let expr = parse(src).unwrap();
        let mut ctx = EvalContext::new(runtime, store, runtime.scopes.global_instance());
        evaluate(&expr, &mut ctx)
    }

    #[test]
    fn literals_evaluate_by_spelling() {
        let runtime = FormulaRuntime::new();
        let store = VariableStore::new();
        assert_eq!(eval_str(&runtime, &store, "3"), Ok(Value::Int(3)));
        assert_eq!(eval_str(&runtime, &store, "3.5"), Ok(Value::Real(3.5)));
        assert_eq!(
            eval_str(&runtime, &store, "\"on\""),
            Ok(Value::Text("on".into()))
        );
    }

    #[test]
    fn arithmetic_follows_the_operator_library() {
        let runtime = FormulaRuntime::new();
        let store = VariableStore::new();
        assert_eq!(eval_str(&runtime, &store, "3+2*4"), Ok(Value::Int(11)));
        assert_eq!(eval_str(&runtime, &store, "(3+2)*4"), Ok(Value::Int(20)));
        assert_eq!(eval_str(&runtime, &store, "-4"), Ok(Value::Int(-4)));
        assert_eq!(eval_str(&runtime, &store, "-4.5"), Ok(Value::Real(-4.5)));
        assert_eq!(eval_str(&runtime, &store, "7/2"), Ok(Value::Real(3.5)));
        assert_eq!(
            eval_str(&runtime, &store, "1<2&&!(2<1)"),
            Ok(Value::Bool(true))
        );
    }

    #[test]
    fn stored_variables_are_read_from_the_store() {
        let mut runtime = FormulaRuntime::new();
        let global = runtime.scopes.global_scope();
        runtime.assert_variable("hp", global, Format::Integer).unwrap();
        let hp = VarId::new(runtime.scopes.global_instance(), "hp", Format::Integer);
        let mut store = VariableStore::new();
        store.put(hp, Value::Int(7)).unwrap();
        assert_eq!(eval_str(&runtime, &store, "hp+1"), Ok(Value::Int(8)));
    }

    #[test]
    fn missing_variable_value_substitutes_the_format_default() {
        let mut runtime = FormulaRuntime::new();
        let global = runtime.scopes.global_scope();
        runtime.assert_variable("hp", global, Format::Integer).unwrap();
        let store = VariableStore::new();
        // Declared but never computed: evaluation proceeds with the default.
        assert_eq!(eval_str(&runtime, &store, "hp+1"), Ok(Value::Int(1)));
    }

    #[test]
    fn scoped_stacks_restore_after_failure() {
        let runtime = FormulaRuntime::new();
        let store = VariableStore::new();
        let mut ctx = EvalContext::new(&runtime, &store, runtime.scopes.global_instance());
        let bad = parse("5%0").unwrap();
        let result = ctx.with_input(Value::Int(1), |ctx| evaluate(&bad, ctx));
        assert!(result.is_err());
        assert_eq!(ctx.input(), None);
        assert_eq!(ctx.asserted(), None);
    }
}
