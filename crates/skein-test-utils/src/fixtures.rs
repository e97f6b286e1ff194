//! The [`TestWorld`] fixture: a runtime and manager wired with scalar
//! defaults and convenience helpers.

use skein_core::{Format, InstanceId, ScopeId, Value, VarId};
use skein_formula::{Formula, FormulaRuntime};
use skein_solver::{CalcModifier, Modifier, SolveError, SolverFactory, SolverManager, Source};
use std::sync::Arc;

/// A runtime plus manager with zero defaults registered for the four
/// scalar formats.
///
/// Helper methods cover the common test shapes; tests needing unusual
/// wiring (custom priorities, array components, cross-scope attachment)
/// drive `runtime` and `manager` directly.
pub struct TestWorld {
    pub runtime: FormulaRuntime,
    pub manager: SolverManager,
}

impl TestWorld {
    /// A world with `0`, `0.0`, `false`, and `""` defaults.
    pub fn new() -> Self {
        let mut factory = SolverFactory::new();
        factory.set_default(Format::Integer, Value::Int(0)).unwrap();
        factory.set_default(Format::Real, Value::Real(0.0)).unwrap();
        factory
            .set_default(Format::Boolean, Value::Bool(false))
            .unwrap();
        factory
            .set_default(Format::Text, Value::Text(String::new()))
            .unwrap();
        Self {
            runtime: FormulaRuntime::new(),
            manager: SolverManager::new(factory),
        }
    }

    /// The global legal scope.
    pub fn global_scope(&self) -> ScopeId {
        self.runtime.scopes.global_scope()
    }

    /// The global scope instance.
    pub fn global_instance(&self) -> InstanceId {
        self.runtime.scopes.global_instance()
    }

    /// Assert a variable in the global scope.
    pub fn assert_global(&mut self, name: &str, format: Format) {
        self.runtime
            .assert_variable(name, self.global_scope(), format)
            .unwrap();
    }

    /// The identifier for a global variable.
    pub fn var(&self, name: &str) -> VarId {
        self.var_in(self.global_instance(), name)
    }

    /// The identifier for a variable as seen from `instance`.
    pub fn var_in(&self, instance: InstanceId, name: &str) -> VarId {
        self.runtime.identifier_for(instance, name).unwrap()
    }

    /// The current value of a global variable; panics if uncomputed.
    pub fn value(&self, name: &str) -> Value {
        self.manager
            .value_of(&self.var(name))
            .unwrap_or_else(|| panic!("variable '{name}' has no computed value"))
            .clone()
    }

    /// Attach a SET-constant modifier to a global variable.
    ///
    /// Returns the attached modifier so the test can later remove it.
    pub fn set(&mut self, name: &str, value: Value, source: &str) -> Arc<CalcModifier> {
        self.set_in(self.global_instance(), name, value, source)
    }

    /// Attach a SET-constant modifier to a variable seen from `instance`.
    pub fn set_in(
        &mut self,
        instance: InstanceId,
        name: &str,
        value: Value,
        source: &str,
    ) -> Arc<CalcModifier> {
        let id = self.var_in(instance, name);
        let modifier = Arc::new(CalcModifier::set(value, instance));
        let attached: Arc<dyn Modifier> = modifier.clone();
        self.manager
            .add_modifier(&self.runtime, id, attached, Source::new(source))
            .unwrap();
        modifier
    }

    /// Attach an ADD-formula modifier to a global variable, formula
    /// resolved in the global instance. Returns the modifier.
    pub fn add_formula(&mut self, name: &str, text: &str, source: &str) -> Arc<CalcModifier> {
        let instance = self.global_instance();
        self.try_add_formula(instance, name, text, source).unwrap()
    }

    /// Attach an ADD-formula modifier to the variable `name` resolves to
    /// from `scope`, with the formula also resolving from `scope`.
    pub fn try_add_formula(
        &mut self,
        scope: InstanceId,
        name: &str,
        text: &str,
        source: &str,
    ) -> Result<Arc<CalcModifier>, SolveError> {
        let id = self.var_in(scope, name);
        let formula = Formula::parse(text, id.format().clone()).unwrap();
        let modifier = Arc::new(CalcModifier::add_formula(formula, scope));
        let attached: Arc<dyn Modifier> = modifier.clone();
        self.manager
            .add_modifier(&self.runtime, id, attached, Source::new(source))?;
        Ok(modifier)
    }

    /// Detach a previously attached modifier from a global variable.
    pub fn remove(&mut self, name: &str, modifier: &dyn Modifier, source: &str) {
        let id = self.var(name);
        self.manager
            .remove_modifier(&self.runtime, id, modifier, &Source::new(source))
            .unwrap();
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}
