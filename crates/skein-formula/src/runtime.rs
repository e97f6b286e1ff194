//! The bundle of injected collaborators every pass reads.

use crate::functions::FunctionLibrary;
use crate::operators::OperatorLibrary;
use skein_core::{
    Format, FormatRegistry, InstanceId, ScopeId, VarId, VariableError, VariableLibrary,
    ScopeWorld,
};

/// The immutable-during-evaluation collaborators of the formula passes:
/// scope state, variable assertions, functions, operators, and format
/// names.
///
/// The runtime is configured up front and then passed by reference into
/// every pass and solver operation. Mutation (defining scopes, opening
/// instances, asserting variables) happens between operations, never
/// during one.
pub struct FormulaRuntime {
    /// Legal scopes and runtime instances.
    pub scopes: ScopeWorld,
    /// Variable assertions.
    pub variables: VariableLibrary,
    /// Function lookup.
    pub functions: FunctionLibrary,
    /// Operator action lookup.
    pub operators: OperatorLibrary,
    /// Format name lookup.
    pub formats: FormatRegistry,
}

impl FormulaRuntime {
    /// Create a runtime with built-in functions and operators and an empty
    /// scope world.
    pub fn new() -> Self {
        Self {
            scopes: ScopeWorld::new(),
            variables: VariableLibrary::new(),
            functions: FunctionLibrary::with_builtins(),
            operators: OperatorLibrary::with_builtins(),
            formats: FormatRegistry::new(),
        }
    }

    /// Assert a variable, splitting the borrow between the scope world and
    /// the variable library.
    pub fn assert_variable(
        &mut self,
        name: &str,
        scope: ScopeId,
        format: Format,
    ) -> Result<(), VariableError> {
        self.variables
            .assert_variable(&self.scopes, name, scope, format)
    }

    /// Mint the [`VarId`] for `name` as seen from `instance`.
    pub fn identifier_for(
        &self,
        instance: InstanceId,
        name: &str,
    ) -> Result<VarId, VariableError> {
        self.variables
            .identifier_for(&self.scopes, instance, name)
    }
}

impl Default for FormulaRuntime {
    fn default() -> Self {
        Self::new()
    }
}
