use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single attribute value as stored in a record or bound into a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Integer(_) => "INTEGER",
            Self::Float(_) => "FLOAT",
            Self::Text(_) => "TEXT",
            Self::Boolean(_) => "BOOLEAN",
            Self::Timestamp(_) => "TIMESTAMP",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Canonical byte form used for shard placement.
    ///
    /// Integral floats encode like the equal integer so that `7` and `7.0`
    /// land on the same shard.
    pub fn routing_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(9);
        match self {
            Self::Null => bytes.push(0),
            Self::Integer(i) => {
                bytes.push(1);
                bytes.extend_from_slice(&i.to_le_bytes());
            }
            Self::Float(f) => match self.as_i64() {
                Some(i) => {
                    bytes.push(1);
                    bytes.extend_from_slice(&i.to_le_bytes());
                }
                None => {
                    let bits = if f.is_nan() { f64::NAN.to_bits() } else { f.to_bits() };
                    bytes.push(2);
                    bytes.extend_from_slice(&bits.to_le_bytes());
                }
            },
            Self::Text(s) => {
                bytes.push(3);
                bytes.extend_from_slice(s.as_bytes());
            }
            Self::Boolean(b) => {
                bytes.push(4);
                bytes.push(u8::from(*b));
            }
            Self::Timestamp(ts) => {
                bytes.push(5);
                bytes.extend_from_slice(&ts.timestamp_micros().to_le_bytes());
            }
        }
        bytes
    }
}

impl PartialEq for Value {
    /// Numbers compare exactly, with integral floats equal to the matching
    /// integer. Agrees with [`Value::routing_bytes`], which backs `Hash`.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Integer(_) | Self::Float(_), Self::Integer(_) | Self::Float(_)) => {
                match (self.as_i64(), other.as_i64()) {
                    (Some(a), Some(b)) => a == b,
                    (None, None) => match (self, other) {
                        (Self::Float(a), Self::Float(b)) => {
                            (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
                        }
                        _ => false,
                    },
                    _ => false,
                }
            }
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.routing_bytes().hash(state);
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(fl) => write!(f, "{}", fl),
            Self::Text(s) => write!(f, "'{}'", s),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Timestamp(ts) => write!(f, "'{}'", ts.to_rfc3339_opts(SecondsFormat::Micros, true)),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_float_routes_like_integer() {
        assert_eq!(Value::Float(7.0).routing_bytes(), Value::Integer(7).routing_bytes());
        assert_ne!(Value::Float(7.5).routing_bytes(), Value::Integer(7).routing_bytes());
    }

    #[test]
    fn test_text_display_is_quoted() {
        assert_eq!(Value::from("eu-west").to_string(), "'eu-west'");
        assert_eq!(Value::Null.to_string(), "NULL");
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3i64)), Value::Integer(3));
    }
    #[test]
    fn test_equal_values_hash_alike() {
        use std::collections::hash_map::DefaultHasher;

        fn hash_of(value: &Value) -> u64 {
            let mut hasher = DefaultHasher::new();
            value.hash(&mut hasher);
            hasher.finish()
        }

        assert_ne!(Value::Float(1e-17), Value::Float(2e-17));
        assert_eq!(Value::Float(7.0), Value::Integer(7));
        assert_eq!(hash_of(&Value::Float(7.0)), hash_of(&Value::Integer(7)));
        assert_eq!(Value::Float(0.25), Value::Float(0.25));
        assert_eq!(hash_of(&Value::Float(f64::NAN)), hash_of(&Value::Float(-f64::NAN)));
        assert_eq!(Value::Float(f64::NAN), Value::Float(-f64::NAN));
        assert_ne!(Value::Integer(9_007_199_254_740_993), Value::Float(9_007_199_254_740_992.0));
    }
}
