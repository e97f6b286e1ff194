//! The [`Value`] tagged union: every value a variable or expression can hold.

use crate::format::Format;
use std::fmt;

/// A runtime value in the engine.
///
/// `Value` is a closed union over the built-in formats. Integers and reals
/// are distinct variants so that integer-preserving arithmetic (`3 + 4`
/// stays an integer, `3 + 4.5` widens to a real) is representable without
/// boxing. Arrays carry their element [`Format`] explicitly so that an
/// empty array still classifies unambiguously.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A signed integer.
    Int(i64),
    /// A double-precision real.
    Real(f64),
    /// A boolean.
    Bool(bool),
    /// A text string.
    Text(String),
    /// An ordered sequence of values of one element format.
    Array {
        /// The declared element format.
        elem: Format,
        /// The elements, each accepted by `elem`.
        items: Vec<Value>,
    },
}

impl Value {
    /// The canonical format classifying this value.
    pub fn format(&self) -> Format {
        match self {
            Self::Int(_) => Format::Integer,
            Self::Real(_) => Format::Real,
            Self::Bool(_) => Format::Boolean,
            Self::Text(_) => Format::Text,
            Self::Array { elem, .. } => Format::Array(Box::new(elem.clone())),
        }
    }

    /// Numeric view of this value, widening integers to `f64`.
    ///
    /// Returns `None` for non-numeric values.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Whether this value is an integer or a real.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Real(_))
    }

    /// Boolean view of this value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Convenience constructor for an array value.
    pub fn array(elem: Format, items: Vec<Value>) -> Self {
        Self::Array { elem, items }
    }
}

impl fmt::Display for Value {
    /// Renders the value as the text [`Format::parse`](crate::Format::parse)
    /// accepts back: bare scalars, comma-joined array elements.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(s) => f.write_str(s),
            Self::Array { items, .. } => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_classification() {
        assert_eq!(Value::Int(3).format(), Format::Integer);
        assert_eq!(Value::Real(3.5).format(), Format::Real);
        assert_eq!(Value::Bool(true).format(), Format::Boolean);
        assert_eq!(
            Value::array(Format::Integer, vec![]).format(),
            Format::Array(Box::new(Format::Integer))
        );
    }

    #[test]
    fn as_real_widens_integers() {
        assert_eq!(Value::Int(4).as_real(), Some(4.0));
        assert_eq!(Value::Real(4.5).as_real(), Some(4.5));
        assert_eq!(Value::Bool(true).as_real(), None);
    }

    #[test]
    fn display_round_trips_through_parse() {
        let arr = Value::array(Format::Integer, vec![Value::Int(10), Value::Int(20)]);
        assert_eq!(arr.to_string(), "10,20");
        let parsed = Format::Array(Box::new(Format::Integer))
            .parse(&arr.to_string())
            .unwrap();
        assert_eq!(parsed, arr);
    }
}
