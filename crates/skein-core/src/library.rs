//! The variable library: which names are legal in which scopes, and with
//! which format.

use crate::error::VariableError;
use crate::format::Format;
use crate::id::{InstanceId, ScopeId, VarId};
use crate::scope::ScopeWorld;
use indexmap::IndexMap;

/// Tracks variable assertions `(scope, name) → format` and mints
/// [`VarId`]s for scope instances.
///
/// Assertions are append-only. A name may be asserted in at most one scope
/// along any root-to-leaf path: an assertion that would shadow (or be
/// shadowed by) a related scope is rejected, which is what makes
/// [`identifier_for`](VariableLibrary::identifier_for)'s ancestor walk
/// unambiguous.
#[derive(Clone, Debug, Default)]
pub struct VariableLibrary {
    defs: IndexMap<(ScopeId, String), Format>,
}

impl VariableLibrary {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assert that `name` is a legal variable of `format` in `scope`.
    ///
    /// Idempotent for identical triples. Fails without modifying the
    /// library when the name is illegal, the scope already asserts the
    /// name with a different format, or a related scope asserts the name.
    pub fn assert_variable(
        &mut self,
        scopes: &ScopeWorld,
        name: &str,
        scope: ScopeId,
        format: Format,
    ) -> Result<(), VariableError> {
        if name.is_empty() || name.trim() != name {
            return Err(VariableError::BadName {
                name: name.to_string(),
            });
        }
        if let Some(existing) = self.defs.get(&(scope, name.to_string())) {
            if *existing == format {
                return Ok(());
            }
            return Err(VariableError::ConflictingFormat {
                name: name.to_string(),
                scope: scopes.scope_name(scope).to_string(),
                existing: existing.clone(),
                requested: format,
            });
        }
        for (other_scope, other_name) in self.defs.keys() {
            if other_name.as_str() == name && scopes.scopes_related(scope, *other_scope) {
                return Err(VariableError::ShadowedName {
                    name: name.to_string(),
                    asserted_in: scopes.scope_name(*other_scope).to_string(),
                    rejected_in: scopes.scope_name(scope).to_string(),
                });
            }
        }
        self.defs.insert((scope, name.to_string()), format);
        Ok(())
    }

    /// Whether `name` has been asserted for exactly this scope.
    pub fn is_legal(&self, scope: ScopeId, name: &str) -> bool {
        self.defs.contains_key(&(scope, name.to_string()))
    }

    /// The format asserted for `(scope, name)`, if any.
    pub fn format_of(&self, scope: ScopeId, name: &str) -> Option<&Format> {
        self.defs.get(&(scope, name.to_string()))
    }

    /// The format of `name` as visible from `scope`: the assertion in this
    /// scope or the nearest ancestor.
    pub fn visible_format(
        &self,
        scopes: &ScopeWorld,
        scope: ScopeId,
        name: &str,
    ) -> Option<&Format> {
        scopes
            .scope_chain(scope)
            .find_map(|s| self.format_of(s, name))
    }

    /// Mint the [`VarId`] naming `name` as seen from `instance`.
    ///
    /// Walks the instance's ancestor chain and binds to the nearest
    /// instance whose legal scope asserts the name, so a global variable
    /// referenced from a child instance resolves to the global cell.
    pub fn identifier_for(
        &self,
        scopes: &ScopeWorld,
        instance: InstanceId,
        name: &str,
    ) -> Result<VarId, VariableError> {
        for inst in scopes.instance_chain(instance) {
            if let Some(format) = self.format_of(scopes.instance_scope(inst), name) {
                return Ok(VarId::new(inst, name, format.clone()));
            }
        }
        Err(VariableError::UnknownVariable {
            name: name.to_string(),
            scope: scopes
                .scope_name(scopes.instance_scope(instance))
                .to_string(),
        })
    }

    /// Every distinct format asserted in this library.
    pub fn asserted_formats(&self) -> impl Iterator<Item = &Format> {
        let mut seen = Vec::new();
        self.defs.values().filter(move |format| {
            if seen.contains(format) {
                false
            } else {
                seen.push(*format);
                true
            }
        })
    }
}
