//! Formats: the closed set of value types, their subtype relation, and the
//! name registry.

use crate::error::FormatError;
use crate::value::Value;
use indexmap::IndexMap;
use std::fmt;

/// A handle classifying the values a variable or expression may hold.
///
/// Formats form a closed union: the four scalar formats plus arrays built
/// with [`Format::array_of`]. The subtype relation is reflexive, widens
/// `Integer` into `Real`, and is covariant over array elements.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Format {
    /// Signed integer numbers.
    Integer,
    /// Double-precision real numbers.
    Real,
    /// Booleans.
    Boolean,
    /// Text strings.
    Text,
    /// Ordered sequences of one element format.
    Array(Box<Format>),
}

impl Format {
    /// The array format over this element format.
    pub fn array_of(self) -> Format {
        Format::Array(Box::new(self))
    }

    /// Whether every value of `self` is also a valid value of `other`.
    pub fn is_subformat_of(&self, other: &Format) -> bool {
        match (self, other) {
            (a, b) if a == b => true,
            (Format::Integer, Format::Real) => true,
            (Format::Array(a), Format::Array(b)) => a.is_subformat_of(b),
            _ => false,
        }
    }

    /// Whether this format is `Integer` or `Real`.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Format::Integer | Format::Real)
    }

    /// Whether the given value is a legal inhabitant of this format.
    ///
    /// Accepts subformat values (`Int` inhabits `Real`) and checks array
    /// elements recursively.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Format::Integer, Value::Int(_)) => true,
            (Format::Real, Value::Int(_) | Value::Real(_)) => true,
            (Format::Boolean, Value::Bool(_)) => true,
            (Format::Text, Value::Text(_)) => true,
            (Format::Array(e), Value::Array { elem, items }) => {
                elem.is_subformat_of(e) && items.iter().all(|item| e.accepts(item))
            }
            _ => false,
        }
    }

    /// The built-in zero value of this format.
    ///
    /// This is the value evaluation substitutes when a referenced variable
    /// has not been computed yet. Configurable solver defaults live on the
    /// `SolverFactory`, not here.
    pub fn default_value(&self) -> Value {
        match self {
            Format::Integer => Value::Int(0),
            Format::Real => Value::Real(0.0),
            Format::Boolean => Value::Bool(false),
            Format::Text => Value::Text(String::new()),
            Format::Array(e) => Value::array((**e).clone(), Vec::new()),
        }
    }

    /// Parse a textual representation into a value of this format.
    ///
    /// Array text is a comma-separated element list; the empty string is
    /// the empty array.
    pub fn parse(&self, text: &str) -> Result<Value, FormatError> {
        let fail = || FormatError::UnparsableValue {
            format: self.clone(),
            text: text.to_string(),
        };
        match self {
            Format::Integer => text.parse::<i64>().map(Value::Int).map_err(|_| fail()),
            Format::Real => text.parse::<f64>().map(Value::Real).map_err(|_| fail()),
            Format::Boolean => match text {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(fail()),
            },
            Format::Text => Ok(Value::Text(text.to_string())),
            Format::Array(e) => {
                if text.is_empty() {
                    return Ok(Value::array((**e).clone(), Vec::new()));
                }
                let items = text
                    .split(',')
                    .map(|part| e.parse(part.trim()))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| fail())?;
                Ok(Value::array((**e).clone(), items))
            }
        }
    }

    /// Serialize a value of this format back to text.
    ///
    /// Inverse of [`Format::parse`] for values this format
    /// [`accepts`](Format::accepts).
    pub fn unparse(&self, value: &Value) -> String {
        value.to_string()
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Integer => f.write_str("INTEGER"),
            Format::Real => f.write_str("REAL"),
            Format::Boolean => f.write_str("BOOLEAN"),
            Format::Text => f.write_str("TEXT"),
            Format::Array(e) => write!(f, "ARRAY[{e}]"),
        }
    }
}

// ── Registry ───────────────────────────────────────────────────────

/// Maps format names to [`Format`] handles.
///
/// The four scalar names are pre-registered; `ARRAY[...]` names are
/// resolved structurally, nesting to any depth. Additional aliases can be
/// registered for client vocabularies.
#[derive(Clone, Debug, Default)]
pub struct FormatRegistry {
    aliases: IndexMap<String, Format>,
}

impl FormatRegistry {
    /// Create a registry with the built-in scalar names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an alias name for a format.
    pub fn register(&mut self, name: impl Into<String>, format: Format) {
        self.aliases.insert(name.into(), format);
    }

    /// Resolve a format name.
    ///
    /// Names are uppercase identifiers: `INTEGER`, `REAL`, `BOOLEAN`,
    /// `TEXT`, or `ARRAY[<name>]`.
    pub fn lookup(&self, name: &str) -> Result<Format, FormatError> {
        if let Some(fmt) = self.aliases.get(name) {
            return Ok(fmt.clone());
        }
        match name {
            "INTEGER" => Ok(Format::Integer),
            "REAL" => Ok(Format::Real),
            "BOOLEAN" => Ok(Format::Boolean),
            "TEXT" => Ok(Format::Text),
            _ => {
                if let Some(inner) = name
                    .strip_prefix("ARRAY[")
                    .and_then(|rest| rest.strip_suffix(']'))
                {
                    return Ok(self.lookup(inner)?.array_of());
                }
                Err(FormatError::UnknownFormat {
                    name: name.to_string(),
                })
            }
        }
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_format() -> impl Strategy<Value = Format> {
        let leaf = prop_oneof![
            Just(Format::Integer),
            Just(Format::Real),
            Just(Format::Boolean),
            Just(Format::Text),
        ];
        leaf.prop_recursive(3, 8, 1, |inner| inner.prop_map(Format::array_of))
    }

    proptest! {
        #[test]
        fn subformat_is_reflexive(f in arb_format()) {
            prop_assert!(f.is_subformat_of(&f));
        }

        #[test]
        fn subformat_is_transitive(
            a in arb_format(),
            b in arb_format(),
            c in arb_format(),
        ) {
            if a.is_subformat_of(&b) && b.is_subformat_of(&c) {
                prop_assert!(a.is_subformat_of(&c));
            }
        }

        #[test]
        fn subformat_is_antisymmetric(a in arb_format(), b in arb_format()) {
            if a.is_subformat_of(&b) && b.is_subformat_of(&a) {
                prop_assert_eq!(a, b);
            }
        }

        #[test]
        fn default_value_inhabits_its_format(f in arb_format()) {
            prop_assert!(f.accepts(&f.default_value()));
        }

        #[test]
        fn subformat_values_are_accepted_upward(a in arb_format(), b in arb_format()) {
            if a.is_subformat_of(&b) {
                prop_assert!(b.accepts(&a.default_value()));
            }
        }

        #[test]
        fn registry_round_trips_structural_names(f in arb_format()) {
            let reg = FormatRegistry::new();
            prop_assert_eq!(reg.lookup(&f.to_string()).unwrap(), f);
        }
    }
}
