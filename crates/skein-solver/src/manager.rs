//! The solver manager: channel bookkeeping, dependency wiring, and the
//! aggressive propagation driver.

use crate::error::SolveError;
use crate::graph::{DepGraph, EdgeTag};
use crate::modifier::{Modifier, Source};
use crate::solver::{ProcessStep, Solver, SolverFactory};
use indexmap::IndexMap;
use skein_core::{Format, InstanceId, Value, VarId, VariableStore};
use skein_formula::{DepContext, EvalContext, Formula, FormulaRuntime};
use std::sync::Arc;

/// Manages one solver per variable and keeps every computed value
/// consistent as modifiers come and go.
///
/// Callers speak in [`VarId`]s; the manager builds and owns the
/// [`Solver`] for each. Recomputation is aggressive: within one
/// `add_modifier` or `remove_modifier` call, the edited variable and
/// every transitive dependent are brought up to date before the call
/// returns.
///
/// The manager owns the result store for writes; share it read-only via
/// [`store`](SolverManager::store). The [`FormulaRuntime`] collaborators
/// are passed by reference into each operation and must not be mutated
/// while one is in flight.
pub struct SolverManager {
    channels: IndexMap<VarId, Solver>,
    graph: DepGraph,
    store: VariableStore,
    factory: SolverFactory,
    stack: Vec<VarId>,
}

impl SolverManager {
    /// Create a manager drawing defaults from the given factory.
    pub fn new(factory: SolverFactory) -> Self {
        Self {
            channels: IndexMap::new(),
            graph: DepGraph::new(),
            store: VariableStore::new(),
            factory,
            stack: Vec::new(),
        }
    }

    /// Read-only view of the result store.
    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    /// The current value of a variable, if it has been computed.
    pub fn value_of(&self, id: &VarId) -> Option<&Value> {
        self.store.get(id)
    }

    /// The solver factory (defaults configuration).
    pub fn factory(&self) -> &SolverFactory {
        &self.factory
    }

    /// Mutable access to the factory, for configuring defaults.
    pub fn factory_mut(&mut self) -> &mut SolverFactory {
        &mut self.factory
    }

    /// The default value for a format, per the factory.
    pub fn default_for(&self, format: &Format) -> Option<Value> {
        self.factory.default_for(format)
    }

    /// The dependency graph, for inspection.
    pub fn graph(&self) -> &DepGraph {
        &self.graph
    }

    /// Whether a solver exists for the variable.
    pub fn has_channel(&self, id: &VarId) -> bool {
        self.channels.contains_key(id)
    }

    // ── Operations ─────────────────────────────────────────────────

    /// Explicitly create the solver for a variable and compute its
    /// default value.
    ///
    /// Fails with [`SolveError::DuplicateChannel`] if the solver already
    /// exists.
    pub fn create_channel(
        &mut self,
        runtime: &FormulaRuntime,
        id: VarId,
    ) -> Result<(), SolveError> {
        if self.channels.contains_key(&id) {
            return Err(SolveError::DuplicateChannel { id });
        }
        let solver = self.factory.build_solver(id.format().clone())?;
        self.channels.insert(id.clone(), solver);
        self.graph.add_node(id.clone());
        self.solve_from(runtime, &id)?;
        Ok(())
    }

    /// Attach `(modifier, source)` to a variable and propagate.
    ///
    /// The variable must be declared in the variable library; its solver
    /// is created implicitly if absent. Each variable in the modifier's
    /// dependency set gets a solver (recursively computing defaults) and
    /// one tagged graph edge. Returns whether the variable's value
    /// changed.
    pub fn add_modifier(
        &mut self,
        runtime: &FormulaRuntime,
        id: VarId,
        modifier: Arc<dyn Modifier>,
        source: Source,
    ) -> Result<bool, SolveError> {
        let legal = runtime.scopes.instance_scope(id.instance());
        if !runtime.variables.is_legal(legal, id.name()) {
            return Err(SolveError::IllegalVariable { id });
        }
        if let Some(solver) = self.channels.get(&id) {
            if solver.contains(&modifier.key(), &source) {
                return Err(SolveError::DuplicateModifier {
                    id,
                    key: modifier.key(),
                    source,
                });
            }
        } else {
            let solver = self.factory.build_solver(id.format().clone())?;
            self.channels.insert(id.clone(), solver);
            self.graph.add_node(id.clone());
        }

        let deps = self.capture_dependencies(runtime, &id, modifier.as_ref())?;
        let tag = EdgeTag {
            key: modifier.key(),
            source: source.clone(),
        };
        for dep in &deps {
            self.ensure_solver_exists(runtime, dep)?;
            self.graph.add_edge(dep.clone(), id.clone(), tag.clone());
        }

        let solver = self
            .channels
            .get_mut(&id)
            .ok_or_else(|| SolveError::Internal {
                detail: format!("channel for {id} vanished during add"),
            })?;
        solver.add_modifier(modifier, source)?;
        self.solve_from(runtime, &id)
    }

    /// Detach `(modifier, source)` from a variable and propagate.
    ///
    /// The modifier's dependency set is recomputed and exactly those
    /// tagged edges are unwired; finding fewer edges than declared
    /// dependencies is an internal-invariant failure. Removing a pair
    /// that was never attached is a no-op beyond recomputation. Returns
    /// whether the variable's value changed.
    pub fn remove_modifier(
        &mut self,
        runtime: &FormulaRuntime,
        id: VarId,
        modifier: &dyn Modifier,
        source: &Source,
    ) -> Result<bool, SolveError> {
        if !self.channels.contains_key(&id) {
            return Err(SolveError::UnknownChannel { id });
        }
        let tag = EdgeTag {
            key: modifier.key(),
            source: source.clone(),
        };
        let attached = self
            .channels
            .get(&id)
            .is_some_and(|solver| solver.contains(&tag.key, source));
        if attached {
            let deps = self.capture_dependencies(runtime, &id, modifier)?;
            let removed = self.graph.remove_matching(&id, &deps, &tag);
            if removed != deps.len() {
                return Err(SolveError::Internal {
                    detail: format!(
                        "modifier on {id} declared {} dependencies but {removed} edges matched",
                        deps.len()
                    ),
                });
            }
            if let Some(solver) = self.channels.get_mut(&id) {
                solver.remove_modifier(&tag.key, source);
            }
        }
        self.solve_from(runtime, &id)
    }

    /// How the variable's current value was derived, step by step.
    pub fn diagnose(
        &self,
        runtime: &FormulaRuntime,
        id: &VarId,
    ) -> Result<Vec<ProcessStep>, SolveError> {
        let solver = self
            .channels
            .get(id)
            .ok_or_else(|| SolveError::UnknownChannel { id: id.clone() })?;
        let mut ctx = EvalContext::new(runtime, &self.store, id.instance());
        solver.diagnose(&mut ctx).map_err(SolveError::Eval)
    }

    /// One-shot evaluation of a formula against the current results,
    /// resolving identifiers from `instance`.
    pub fn resolve(
        &self,
        runtime: &FormulaRuntime,
        formula: &Formula,
        instance: InstanceId,
    ) -> Result<Value, SolveError> {
        let mut ctx = EvalContext::new(runtime, &self.store, instance);
        formula.resolve(&mut ctx).map_err(SolveError::Eval)
    }

    // ── Internals ──────────────────────────────────────────────────

    /// Run the dependency pass for a modifier targeting `id`.
    fn capture_dependencies(
        &self,
        runtime: &FormulaRuntime,
        id: &VarId,
        modifier: &dyn Modifier,
    ) -> Result<indexmap::IndexSet<VarId>, SolveError> {
        let mut ctx = DepContext::new(runtime, id.instance());
        modifier.dependencies(&mut ctx)?;
        Ok(ctx.into_variables())
    }

    /// Create the solver for a dependency if absent, computing its
    /// default so downstream evaluation reads a real value.
    fn ensure_solver_exists(
        &mut self,
        runtime: &FormulaRuntime,
        id: &VarId,
    ) -> Result<(), SolveError> {
        if self.channels.contains_key(id) {
            return Ok(());
        }
        let solver = self.factory.build_solver(id.format().clone())?;
        self.channels.insert(id.clone(), solver);
        self.graph.add_node(id.clone());
        self.solve_from(runtime, id)?;
        Ok(())
    }

    /// Recompute `id` and, if its value changed, every dependent,
    /// recursively.
    ///
    /// A variable revisited while already on the recursion stack is a
    /// cycle; the cycle is a defect only if the value is still changing
    /// on the revisit. Stable cycles (one lap reaches a fixed point) pass
    /// silently.
    fn solve_from(&mut self, runtime: &FormulaRuntime, id: &VarId) -> Result<bool, SolveError> {
        let warning = self.stack.contains(id);
        self.stack.push(id.clone());
        let result = self.solve_from_inner(runtime, id, warning);
        self.stack.pop();
        result
    }

    fn solve_from_inner(
        &mut self,
        runtime: &FormulaRuntime,
        id: &VarId,
        warning: bool,
    ) -> Result<bool, SolveError> {
        let changed = self.process_solver(runtime, id)?;
        if changed {
            if warning {
                return Err(SolveError::CycleDetected {
                    path: self.stack.clone(),
                });
            }
            // The graph is not topologically sorted, so a dependent may be
            // recomputed more than once per edit; the changed check makes
            // the repeats converge.
            for dependent in self.graph.dependents_of(id) {
                self.solve_from(runtime, &dependent)?;
            }
        }
        Ok(changed)
    }

    /// Run one solver and write its value; returns whether it changed.
    fn process_solver(&mut self, runtime: &FormulaRuntime, id: &VarId) -> Result<bool, SolveError> {
        let new_value = {
            let solver = self
                .channels
                .get(id)
                .ok_or_else(|| SolveError::Internal {
                    detail: format!("no solver for {id} during propagation"),
                })?;
            let mut ctx = EvalContext::new(runtime, &self.store, id.instance());
            solver.process(&mut ctx)?
        };
        tracing::trace!(variable = %id, value = %new_value, "recomputed");
        let prior = self.store.put(id.clone(), new_value.clone())?;
        Ok(prior.as_ref() != Some(&new_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::CalcModifier;

    fn setup() -> (FormulaRuntime, SolverManager) {
        let mut runtime = FormulaRuntime::new();
        let global = runtime.scopes.global_scope();
        for name in ["a", "b", "c"] {
            runtime
                .assert_variable(name, global, Format::Integer)
                .unwrap();
        }
        let mut factory = SolverFactory::new();
        factory.set_default(Format::Integer, Value::Int(0)).unwrap();
        (runtime, SolverManager::new(factory))
    }

    fn var(runtime: &FormulaRuntime, name: &str) -> VarId {
        runtime
            .identifier_for(runtime.scopes.global_instance(), name)
            .unwrap()
    }

    fn add_formula(
        runtime: &FormulaRuntime,
        manager: &mut SolverManager,
        name: &str,
        text: &str,
        source: &str,
    ) -> bool {
        let formula = Formula::parse(text, Format::Integer).unwrap();
        let modifier = Arc::new(CalcModifier::add_formula(
            formula,
            runtime.scopes.global_instance(),
        ));
        manager
            .add_modifier(runtime, var(runtime, name), modifier, Source::new(source))
            .unwrap()
    }

    #[test]
    fn create_channel_computes_the_default() {
        let (runtime, mut manager) = setup();
        let a = var(&runtime, "a");
        manager.create_channel(&runtime, a.clone()).unwrap();
        assert_eq!(manager.value_of(&a), Some(&Value::Int(0)));
        assert!(matches!(
            manager.create_channel(&runtime, a.clone()),
            Err(SolveError::DuplicateChannel { .. })
        ));
    }

    #[test]
    fn add_modifier_requires_a_declared_variable() {
        let (runtime, mut manager) = setup();
        let ghost = VarId::new(runtime.scopes.global_instance(), "ghost", Format::Integer);
        let modifier = Arc::new(CalcModifier::set(
            Value::Int(1),
            runtime.scopes.global_instance(),
        ));
        assert!(matches!(
            manager.add_modifier(&runtime, ghost, modifier, Source::new("x")),
            Err(SolveError::IllegalVariable { .. })
        ));
    }

    #[test]
    fn dependencies_get_implicit_default_channels() {
        let (runtime, mut manager) = setup();
        let changed = add_formula(&runtime, &mut manager, "b", "a+2", "src");
        assert!(changed);
        // "a" was never explicitly created but now holds its default.
        assert_eq!(manager.value_of(&var(&runtime, "a")), Some(&Value::Int(0)));
        assert_eq!(manager.value_of(&var(&runtime, "b")), Some(&Value::Int(2)));
        assert_eq!(manager.graph().edge_count(), 1);
    }

    #[test]
    fn duplicate_attachment_is_rejected() {
        let (runtime, mut manager) = setup();
        add_formula(&runtime, &mut manager, "b", "a+2", "src");
        let formula = Formula::parse("a+2", Format::Integer).unwrap();
        let modifier = Arc::new(CalcModifier::add_formula(
            formula,
            runtime.scopes.global_instance(),
        ));
        assert!(matches!(
            manager.add_modifier(&runtime, var(&runtime, "b"), modifier, Source::new("src")),
            Err(SolveError::DuplicateModifier { .. })
        ));
    }

    #[test]
    fn remove_from_unknown_channel_fails() {
        let (runtime, mut manager) = setup();
        let modifier = CalcModifier::set(Value::Int(1), runtime.scopes.global_instance());
        assert!(matches!(
            manager.remove_modifier(
                &runtime,
                var(&runtime, "a"),
                &modifier,
                &Source::new("x")
            ),
            Err(SolveError::UnknownChannel { .. })
        ));
    }

    #[test]
    fn removing_an_unattached_modifier_is_a_no_op() {
        let (runtime, mut manager) = setup();
        let a = var(&runtime, "a");
        manager.create_channel(&runtime, a.clone()).unwrap();
        let modifier = CalcModifier::set(Value::Int(1), runtime.scopes.global_instance());
        let changed = manager
            .remove_modifier(&runtime, a.clone(), &modifier, &Source::new("x"))
            .unwrap();
        assert!(!changed);
        assert_eq!(manager.value_of(&a), Some(&Value::Int(0)));
    }
}
