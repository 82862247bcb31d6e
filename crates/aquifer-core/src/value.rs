//! Dynamic column values.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// A dynamically-typed column value.
///
/// This enum represents every value a row source can yield, plus the
/// typed forms the coercion layer produces from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// NULL value
    Null,

    /// Boolean value
    Bool(bool),

    /// 16-bit signed integer
    SmallInt(i16),

    /// 32-bit signed integer
    Int(i32),

    /// 64-bit signed integer
    BigInt(i64),

    /// 32-bit floating point
    Float(f32),

    /// 64-bit floating point
    Double(f64),

    /// Arbitrary precision decimal (stored as string)
    Decimal(String),

    /// Text string
    Text(String),

    /// Binary data
    Bytes(Vec<u8>),

    /// Date (days since epoch)
    Date(i32),

    /// Timestamp (microseconds since epoch)
    Timestamp(i64),

    /// JSON value
    Json(serde_json::Value),

    /// Array of values
    Array(Vec<Value>),
}

impl Value {
    /// Check if this value is NULL.
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the type name of this value.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::SmallInt(_) => "SMALLINT",
            Value::Int(_) => "INTEGER",
            Value::BigInt(_) => "BIGINT",
            Value::Float(_) => "REAL",
            Value::Double(_) => "DOUBLE",
            Value::Decimal(_) => "DECIMAL",
            Value::Text(_) => "TEXT",
            Value::Bytes(_) => "BLOB",
            Value::Date(_) => "DATE",
            Value::Timestamp(_) => "TIMESTAMP",
            Value::Json(_) => "JSON",
            Value::Array(_) => "ARRAY",
        }
    }

    /// Try to convert this value to a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            Value::SmallInt(v) => Some(*v != 0),
            Value::Int(v) => Some(*v != 0),
            Value::BigInt(v) => Some(*v != 0),
            _ => None,
        }
    }

    /// Try to convert this value to an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::SmallInt(v) => Some(i64::from(*v)),
            Value::Int(v) => Some(i64::from(*v)),
            Value::BigInt(v) => Some(*v),
            Value::Bool(v) => Some(if *v { 1 } else { 0 }),
            _ => None,
        }
    }

    /// Try to convert this value to an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            Value::SmallInt(v) => Some(f64::from(*v)),
            Value::Int(v) => Some(f64::from(*v)),
            Value::BigInt(v) => Some(*v as f64),
            Value::Decimal(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Decimal(s) => Some(s),
            _ => None,
        }
    }
}

/// Hash a tuple of values, e.g. a composite identifier.
///
/// Each component is prefixed with a type discriminant so `Int(0)` and
/// `Text("")` hash differently.
pub fn hash_values(values: &[Value]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for v in values {
        hash_single_value(v, &mut hasher);
    }
    hasher.finish()
}

fn hash_single_value(v: &Value, hasher: &mut impl Hasher) {
    match v {
        Value::Null => 0u8.hash(hasher),
        Value::Bool(b) => {
            1u8.hash(hasher);
            b.hash(hasher);
        }
        Value::SmallInt(i) => {
            2u8.hash(hasher);
            i.hash(hasher);
        }
        Value::Int(i) => {
            3u8.hash(hasher);
            i.hash(hasher);
        }
        Value::BigInt(i) => {
            4u8.hash(hasher);
            i.hash(hasher);
        }
        Value::Float(f) => {
            5u8.hash(hasher);
            f.to_bits().hash(hasher);
        }
        Value::Double(f) => {
            6u8.hash(hasher);
            f.to_bits().hash(hasher);
        }
        Value::Decimal(s) => {
            7u8.hash(hasher);
            s.hash(hasher);
        }
        Value::Text(s) => {
            8u8.hash(hasher);
            s.hash(hasher);
        }
        Value::Bytes(b) => {
            9u8.hash(hasher);
            b.hash(hasher);
        }
        Value::Date(d) => {
            10u8.hash(hasher);
            d.hash(hasher);
        }
        Value::Timestamp(ts) => {
            11u8.hash(hasher);
            ts.hash(hasher);
        }
        Value::Json(j) => {
            12u8.hash(hasher);
            j.to_string().hash(hasher);
        }
        Value::Array(arr) => {
            13u8.hash(hasher);
            arr.len().hash(hasher);
            for item in arr {
                hash_single_value(item, hasher);
            }
        }
    }
}

/// A `Value` usable as a hash map key.
///
/// Floats compare and hash by bit pattern, so `ValueKey` is `Eq` even
/// though `Value` is not.
#[derive(Debug, Clone)]
pub struct ValueKey(Value);

impl ValueKey {
    /// Wrap a value for use as a key.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The wrapped value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for ValueKey {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl PartialEq for ValueKey {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (a, b) => a == b,
        }
    }
}

impl Eq for ValueKey {}

impl Hash for ValueKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_single_value(&self.0, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_and_type_names() {
        assert!(Value::Null.is_null());
        assert!(!Value::Int(0).is_null());
        assert_eq!(Value::Text("x".to_string()).type_name(), "TEXT");
        assert_eq!(Value::BigInt(1).type_name(), "BIGINT");
    }

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(Value::Int(42).as_i64(), Some(42));
        assert_eq!(Value::SmallInt(7).as_i64(), Some(7));
        assert_eq!(Value::Text("x".to_string()).as_i64(), None);
        assert_eq!(Value::Double(1.5).as_f64(), Some(1.5));
        assert_eq!(Value::Decimal("2.25".to_string()).as_f64(), Some(2.25));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(0).as_bool(), Some(false));
    }

    #[test]
    fn test_composite_hashing() {
        let a = vec![Value::BigInt(1), Value::Text("a".to_string())];
        let b = vec![Value::BigInt(1), Value::Text("a".to_string())];
        let c = vec![Value::BigInt(1), Value::Text("b".to_string())];

        assert_eq!(hash_values(&a), hash_values(&b));
        assert_ne!(hash_values(&a), hash_values(&c));
    }

    #[test]
    fn test_hash_discriminates_types() {
        // Int(0) and Null must not collide just because both are "zero-ish"
        assert_ne!(hash_values(&[Value::Int(0)]), hash_values(&[Value::Null]));
        assert_ne!(
            hash_values(&[Value::Int(1)]),
            hash_values(&[Value::BigInt(1)])
        );
    }

    #[test]
    fn test_value_key_equality() {
        use std::collections::HashMap;

        let mut map: HashMap<ValueKey, i32> = HashMap::new();
        map.insert(ValueKey::new(Value::Text("ROMANB".to_string())), 1);
        map.insert(ValueKey::new(Value::Int(2)), 2);

        assert_eq!(
            map.get(&ValueKey::new(Value::Text("ROMANB".to_string()))),
            Some(&1)
        );
        assert_eq!(map.get(&ValueKey::new(Value::Int(2))), Some(&2));
        assert_eq!(map.get(&ValueKey::new(Value::Int(3))), None);
    }

    #[test]
    fn test_value_key_float_bits() {
        let a = ValueKey::new(Value::Double(1.5));
        let b = ValueKey::new(Value::Double(1.5));
        assert_eq!(a, b);
    }
}
