//! The scope tree: legal scope declarations and runtime scope instances.

use crate::error::ScopeError;
use crate::id::{InstanceId, ScopeId};

/// A declaration node in the static scope tree.
#[derive(Clone, Debug)]
struct LegalScope {
    name: String,
    parent: Option<ScopeId>,
}

/// A runtime occurrence of a legal scope.
#[derive(Clone, Debug)]
struct ScopeInstance {
    legal: ScopeId,
    parent: Option<InstanceId>,
    owner: Option<String>,
}

/// Owns both the static hierarchy of legal scopes and the arena of runtime
/// scope instances.
///
/// Construction creates the global scope and its single instance
/// (`ScopeId(0)` / `InstanceId(0)`). Instance creation enforces the
/// parent-consistency invariant: an instance's parent must instantiate the
/// legal scope's declared parent.
#[derive(Clone, Debug)]
pub struct ScopeWorld {
    legals: Vec<LegalScope>,
    instances: Vec<ScopeInstance>,
}

impl ScopeWorld {
    /// Name of the root scope created by [`ScopeWorld::new`].
    pub const GLOBAL: &'static str = "Global";

    /// Create a world containing the global scope and its instance.
    pub fn new() -> Self {
        Self {
            legals: vec![LegalScope {
                name: Self::GLOBAL.to_string(),
                parent: None,
            }],
            instances: vec![ScopeInstance {
                legal: ScopeId(0),
                parent: None,
                owner: None,
            }],
        }
    }

    /// The root legal scope.
    pub fn global_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    /// The single instance of the root scope.
    pub fn global_instance(&self) -> InstanceId {
        InstanceId(0)
    }

    // ── Legal scopes ───────────────────────────────────────────────

    /// Declare a legal scope under the given parent.
    ///
    /// Re-declaring the same `(parent, name)` pair returns the existing ID;
    /// legal scopes are immortal once declared.
    pub fn define_scope(
        &mut self,
        name: &str,
        parent: ScopeId,
    ) -> Result<ScopeId, ScopeError> {
        if name.is_empty() || name.trim() != name {
            return Err(ScopeError::BadName {
                name: name.to_string(),
            });
        }
        if let Some(existing) = self.legals.iter().position(|scope| {
            scope.name == name && scope.parent == Some(parent)
        }) {
            return Ok(ScopeId(existing as u32));
        }
        let id = ScopeId(self.legals.len() as u32);
        self.legals.push(LegalScope {
            name: name.to_string(),
            parent: Some(parent),
        });
        Ok(id)
    }

    /// The name of a legal scope.
    pub fn scope_name(&self, scope: ScopeId) -> &str {
        &self.legals[scope.0 as usize].name
    }

    /// The parent of a legal scope (`None` for the global scope).
    pub fn parent_scope(&self, scope: ScopeId) -> Option<ScopeId> {
        self.legals[scope.0 as usize].parent
    }

    /// The legal scope followed by its ancestors, root last.
    pub fn scope_chain(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        let mut current = Some(scope);
        std::iter::from_fn(move || {
            let here = current?;
            current = self.parent_scope(here);
            Some(here)
        })
    }

    /// Whether one legal scope is an ancestor of the other, in either
    /// direction. A scope is not related to itself.
    pub fn scopes_related(&self, a: ScopeId, b: ScopeId) -> bool {
        if a == b {
            return false;
        }
        self.scope_chain(a).skip(1).any(|s| s == b)
            || self.scope_chain(b).skip(1).any(|s| s == a)
    }

    // ── Instances ──────────────────────────────────────────────────

    /// Open a runtime instance of a legal scope.
    ///
    /// `parent` must be an instance of the scope's declared parent, and
    /// `owner` optionally tags the entity this instance was opened for.
    /// The global scope cannot be re-opened.
    pub fn open_instance(
        &mut self,
        legal: ScopeId,
        parent: InstanceId,
        owner: Option<String>,
    ) -> Result<InstanceId, ScopeError> {
        let Some(expected_parent) = self.parent_scope(legal) else {
            return Err(ScopeError::GlobalAlreadyOpen);
        };
        if self.instance_scope(parent) != expected_parent {
            return Err(ScopeError::ParentMismatch {
                scope: self.scope_name(legal).to_string(),
                expected_parent: Some(self.scope_name(expected_parent).to_string()),
            });
        }
        let id = InstanceId(self.instances.len() as u32);
        self.instances.push(ScopeInstance {
            legal,
            parent: Some(parent),
            owner,
        });
        Ok(id)
    }

    /// The legal scope an instance instantiates.
    pub fn instance_scope(&self, instance: InstanceId) -> ScopeId {
        self.instances[instance.0 as usize].legal
    }

    /// The parent instance (`None` for the global instance).
    pub fn instance_parent(&self, instance: InstanceId) -> Option<InstanceId> {
        self.instances[instance.0 as usize].parent
    }

    /// The owner tag of an instance, if one was supplied at open time.
    pub fn owner(&self, instance: InstanceId) -> Option<&str> {
        self.instances[instance.0 as usize].owner.as_deref()
    }

    /// The instance followed by its ancestors, global instance last.
    pub fn instance_chain(&self, instance: InstanceId) -> impl Iterator<Item = InstanceId> + '_ {
        let mut current = Some(instance);
        std::iter::from_fn(move || {
            let here = current?;
            current = self.instance_parent(here);
            Some(here)
        })
    }
}

impl Default for ScopeWorld {
    fn default() -> Self {
        Self::new()
    }
}
