//! The typed variable store: computed values keyed by [`VarId`].

use crate::error::StoreError;
use crate::id::VarId;
use crate::value::Value;
use indexmap::IndexMap;

/// A typed map from variable identifier to current value.
///
/// Writes are format-checked against the identifier's declared format at
/// put time, so every read yields a value the variable's format accepts.
/// Iteration order is insertion order; no other ordering is guaranteed.
#[derive(Clone, Debug, Default)]
pub struct VariableStore {
    values: IndexMap<VarId, Value>,
}

impl VariableStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` for `id`, returning the prior value if one existed.
    ///
    /// Rejects values the identifier's format does not accept.
    pub fn put(&mut self, id: VarId, value: Value) -> Result<Option<Value>, StoreError> {
        if !id.format().accepts(&value) {
            return Err(StoreError::FormatMismatch {
                expected: id.format().clone(),
                actual: value.format(),
                id,
            });
        }
        Ok(self.values.insert(id, value))
    }

    /// The current value of `id`, if one has been stored.
    pub fn get(&self, id: &VarId) -> Option<&Value> {
        self.values.get(id)
    }

    /// Whether a value has been stored for `id`.
    pub fn contains(&self, id: &VarId) -> bool {
        self.values.contains_key(id)
    }

    /// Number of stored variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(id, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&VarId, &Value)> {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;
    use crate::id::InstanceId;

    fn int_var(name: &str) -> VarId {
        VarId::new(InstanceId(0), name, Format::Integer)
    }

    #[test]
    fn put_returns_prior_value() {
        let mut store = VariableStore::new();
        let hp = int_var("hp");
        assert_eq!(store.put(hp.clone(), Value::Int(3)).unwrap(), None);
        assert_eq!(
            store.put(hp.clone(), Value::Int(5)).unwrap(),
            Some(Value::Int(3))
        );
        assert_eq!(store.get(&hp), Some(&Value::Int(5)));
    }

    #[test]
    fn put_rejects_format_mismatch() {
        let mut store = VariableStore::new();
        let hp = int_var("hp");
        let err = store.put(hp.clone(), Value::Bool(true)).unwrap_err();
        assert!(matches!(err, StoreError::FormatMismatch { .. }));
        assert!(!store.contains(&hp));
    }

    #[test]
    fn put_accepts_subformat_values() {
        let mut store = VariableStore::new();
        let ratio = VarId::new(InstanceId(0), "ratio", Format::Real);
        // An integer inhabits a real-formatted variable.
        store.put(ratio.clone(), Value::Int(2)).unwrap();
        assert_eq!(store.get(&ratio), Some(&Value::Int(2)));
    }

    #[test]
    fn distinct_instances_are_distinct_cells() {
        let mut store = VariableStore::new();
        let a = VarId::new(InstanceId(1), "bonus", Format::Integer);
        let b = VarId::new(InstanceId(2), "bonus", Format::Integer);
        store.put(a.clone(), Value::Int(2)).unwrap();
        store.put(b.clone(), Value::Int(5)).unwrap();
        assert_eq!(store.get(&a), Some(&Value::Int(2)));
        assert_eq!(store.get(&b), Some(&Value::Int(5)));
        assert_eq!(store.len(), 2);
    }
}
