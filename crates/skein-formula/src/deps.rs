//! The dependency pass: collects the variables an expression reads and
//! the macro-argument indexes it references.

use crate::ast::Expr;
use crate::error::SemanticsError;
use crate::runtime::FormulaRuntime;
use indexmap::IndexSet;
use skein_core::{InstanceId, VarId, VariableError};

/// Accumulator threaded through dependency capture.
///
/// Two analyses are first-class: `variables`, the set of [`VarId`]s the
/// expression reads (resolved in the current scope instance), and
/// `max_arg`, the highest `arg(n)` index referenced. Functions may feed
/// either or both.
pub struct DepContext<'a> {
    runtime: &'a FormulaRuntime,
    instance: InstanceId,
    variables: IndexSet<VarId>,
    max_arg: Option<usize>,
    macro_args: Vec<Vec<Expr>>,
}

impl<'a> DepContext<'a> {
    /// Create a collector resolving identifiers from the given instance.
    pub fn new(runtime: &'a FormulaRuntime, instance: InstanceId) -> Self {
        Self {
            runtime,
            instance,
            variables: IndexSet::new(),
            max_arg: None,
            macro_args: Vec::new(),
        }
    }

    /// The injected collaborators.
    pub fn runtime(&self) -> &'a FormulaRuntime {
        self.runtime
    }

    /// The scope instance identifiers currently resolve from.
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// The collected variable dependencies, in first-reference order.
    pub fn variables(&self) -> &IndexSet<VarId> {
        &self.variables
    }

    /// Consume the collector, yielding the variable set.
    pub fn into_variables(self) -> IndexSet<VarId> {
        self.variables
    }

    /// The highest `arg(n)` index referenced, if any.
    pub fn max_arg(&self) -> Option<usize> {
        self.max_arg
    }

    /// Record a variable dependency.
    pub fn add_variable(&mut self, id: VarId) {
        self.variables.insert(id);
    }

    /// Record a macro-argument reference.
    pub fn note_arg(&mut self, index: usize) {
        self.max_arg = Some(self.max_arg.map_or(index, |m| m.max(index)));
    }

    /// The current macro-argument frame, if a macro call is in progress.
    pub fn macro_frame(&self) -> Option<&[Expr]> {
        self.macro_args.last().map(Vec::as_slice)
    }

    /// Run `body` with identifiers resolving from a different instance;
    /// the previous instance is restored on every exit path.
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

/// Walk an expression, recording everything it depends on.
pub fn capture(expr: &Expr, ctx: &mut DepContext<'_>) -> Result<(), SemanticsError> {
    match expr {
        Expr::Number(_) | Expr::Str(_) => Ok(()),
        Expr::Variable(name) => {
            let runtime = ctx.runtime();
            let id = runtime
                .variables
                .identifier_for(&runtime.scopes, ctx.instance(), name)
                .map_err(|err| match err {
                    VariableError::UnknownVariable { name, scope } => {
                        SemanticsError::UnknownVariable { name, scope }
                    }
                    other => SemanticsError::UnknownVariable {
                        name: name.clone(),
                        scope: other.to_string(),
                    },
                })?;
            ctx.add_variable(id);
            Ok(())
        }
        Expr::Paren(inner) => capture(inner, ctx),
        Expr::Unary { operand, .. } => capture(operand, ctx),
        Expr::Binary { lhs, rhs, .. } => {
            capture(lhs, ctx)?;
            capture(rhs, ctx)
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
            function.get_dependencies(ctx, args)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use skein_core::Format;

    #[test]
    fn capture_collects_each_variable_once() {
        let mut runtime = FormulaRuntime::new();
        let global = runtime.scopes.global_scope();
        runtime.assert_variable("a", global, Format::Integer).unwrap();
        runtime.assert_variable("b", global, Format::Integer).unwrap();

        let expr = parse("a+b*a").unwrap();
        let mut ctx = DepContext::new(&runtime, runtime.scopes.global_instance());
        capture(&expr, &mut ctx).unwrap();

        let names: Vec<_> = ctx.variables().iter().map(|id| id.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(ctx.max_arg(), None);
    }

    #[test]
    fn capture_resolves_from_the_supplied_instance() {
        let mut runtime = FormulaRuntime::new();
        let global = runtime.scopes.global_scope();
        let equipment = runtime.scopes.define_scope("Equipment", global).unwrap();
        runtime.assert_variable("hp", global, Format::Integer).unwrap();
        runtime
            .assert_variable("bonus", equipment, Format::Integer)
            .unwrap();
        let e1 = runtime
            .scopes
            .open_instance(equipment, runtime.scopes.global_instance(), None)
            .unwrap();

        let expr = parse("hp+bonus").unwrap();
        let mut ctx = DepContext::new(&runtime, e1);
        capture(&expr, &mut ctx).unwrap();

        let ids: Vec<_> = ctx.variables().iter().cloned().collect();
        assert_eq!(ids[0].instance(), runtime.scopes.global_instance());
        assert_eq!(ids[1].instance(), e1);
    }

    #[test]
    fn unknown_variables_fail_the_pass() {
        let runtime = FormulaRuntime::new();
        let expr = parse("mystery").unwrap();
        let mut ctx = DepContext::new(&runtime, runtime.scopes.global_instance());
        assert!(matches!(
            capture(&expr, &mut ctx),
            Err(SemanticsError::UnknownVariable { .. })
        ));
    }
}
