//! Strongly-typed identifiers for scopes, scope instances, and variables.

use crate::format::Format;
use std::cmp::Ordering;
use std::fmt;

/// Identifies a legal scope within a [`ScopeWorld`](crate::ScopeWorld).
///
/// Legal scopes are declared at configuration time and assigned sequential
/// IDs. `ScopeId(0)` is always the global scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ScopeId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a runtime scope instance within a [`ScopeWorld`](crate::ScopeWorld).
///
/// Instances are opened on demand by clients and assigned sequential IDs.
/// `InstanceId(0)` is always the single global instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u32);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for InstanceId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Names one reactive cell: a variable in a specific scope instance with a
/// specific format.
///
/// Equality is structural on all three components. Ordered containers of
/// `VarId` compare on scope-instance identity first, then name; the format
/// only breaks remaining ties.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VarId {
    instance: InstanceId,
    name: String,
    format: Format,
}

impl VarId {
    /// Construct a variable identifier.
    ///
    /// Most callers should obtain `VarId`s from
    /// [`VariableLibrary::identifier_for`](crate::VariableLibrary::identifier_for),
    /// which guarantees the combination is legal.
    pub fn new(instance: InstanceId, name: impl Into<String>, format: Format) -> Self {
        Self {
            instance,
            name: name.into(),
            format,
        }
    }

    /// The scope instance this variable lives in.
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// The variable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The format of values this variable holds.
    pub fn format(&self) -> &Format {
        &self.format
    }
}

impl PartialOrd for VarId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VarId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instance
            .cmp(&other.instance)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.format.cmp(&other.format))
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_id_orders_by_instance_then_name() {
        let a = VarId::new(InstanceId(0), "zeta", Format::Integer);
        let b = VarId::new(InstanceId(1), "alpha", Format::Integer);
        let c = VarId::new(InstanceId(1), "beta", Format::Integer);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn var_id_equality_is_structural() {
        let a = VarId::new(InstanceId(3), "hp", Format::Integer);
        let b = VarId::new(InstanceId(3), "hp", Format::Integer);
        let c = VarId::new(InstanceId(3), "hp", Format::Real);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn display_includes_name_and_instance() {
        let id = VarId::new(InstanceId(2), "hp", Format::Integer);
        assert_eq!(id.to_string(), "hp#2");
    }
}
