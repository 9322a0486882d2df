use std::{collections::BTreeMap, fmt::Display};

use serde::{Deserialize, Serialize};

/// Runtime value stored in a row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    Null,
}

/// Derived key of a value, used for every equality check and index bucket
///
/// Variants never coerce into each other: `Integer(1)` and `Float(1.0)` are
/// different keys. Floats are keyed by their bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexKey {
    Null,
    Integer(i64),
    Float(u64),
    Text(String),
}

impl Value {
    pub fn key(&self) -> IndexKey {
        match self {
            Value::Integer(i) => IndexKey::Integer(*i),
            Value::Float(f) => IndexKey::Float(f.to_bits()),
            Value::Text(s) => IndexKey::Text(s.clone()),
            Value::Null => IndexKey::Null,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
            Value::Null => write!(f, "NULL"),
        }
    }
}

/// A row maps column names to values. A declared column may be absent.
pub type Row = BTreeMap<String, Value>;

#[cfg(test)]
mod tests {
    use super::{IndexKey, Value};

    #[test]
    fn test_keys_do_not_coerce() {
        assert_ne!(Value::Integer(1).key(), Value::Float(1.0).key());
        assert_ne!(Value::Integer(1), Value::Float(1.0));
        assert_ne!(Value::Text("1".into()), Value::Integer(1));
        assert_eq!(Value::Null.key(), IndexKey::Null);
        assert_eq!(Value::Null, Value::Null);
        assert_eq!(Value::Float(2.5), Value::Float(2.5));
        assert_ne!(Value::Text("abc".into()), Value::Text("ABC".into()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Integer(-3).to_string(), "-3");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Text("Alice".into()).to_string(), "Alice");
        assert_eq!(Value::Null.to_string(), "NULL");
    }
}
