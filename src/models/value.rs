//! Scalar and flat-record value types
//!
//! [`Scalar`] is the primitive leaf value of the attribute model; geometry and
//! other opaque payloads pass through as `Text`. [`Value`] is what a flat
//! record maps a path to: a scalar, a list (with `Null` padding for absent
//! positions), or `Null` for an absent table cell.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::template::PrimitiveType;

/// A primitive attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => write!(f, "{s}"),
            Scalar::Integer(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Integer(i)
    }
}

impl From<f64> for Scalar {
    fn from(x: f64) -> Self {
        Scalar::Float(x)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl Scalar {
    /// The primitive type this scalar natively carries.
    pub fn primitive_type(&self) -> PrimitiveType {
        match self {
            Scalar::Text(_) => PrimitiveType::Text,
            Scalar::Integer(_) => PrimitiveType::Integer,
            Scalar::Float(_) => PrimitiveType::Float,
            Scalar::Bool(_) => PrimitiveType::Bool,
        }
    }

    /// Convert to a JSON value (for property-bag adapters).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Scalar::Text(s) => serde_json::Value::String(s.clone()),
            Scalar::Integer(i) => serde_json::Value::Number((*i).into()),
            Scalar::Float(x) => serde_json::Number::from_f64(*x)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Scalar::Bool(b) => serde_json::Value::Bool(*b),
        }
    }

    /// Convert from a JSON value. `Null`, arrays and objects yield `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Scalar> {
        match value {
            serde_json::Value::String(s) => Some(Scalar::Text(s.clone())),
            serde_json::Value::Bool(b) => Some(Scalar::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Scalar::Integer(i))
                } else {
                    n.as_f64().map(Scalar::Float)
                }
            }
            _ => None,
        }
    }

    /// Parse text into the given primitive type, falling back to `Text` when
    /// the text does not parse. Used by destringify; the object model's
    /// coercion reports the mismatch if the fallback reaches a typed slot.
    pub fn parse_as(text: &str, target: PrimitiveType) -> Scalar {
        match target {
            PrimitiveType::Text => Scalar::Text(text.to_string()),
            PrimitiveType::Integer => text
                .trim()
                .parse::<i64>()
                .map(Scalar::Integer)
                .unwrap_or_else(|_| Scalar::Text(text.to_string())),
            PrimitiveType::Float => text
                .trim()
                .parse::<f64>()
                .map(Scalar::Float)
                .unwrap_or_else(|_| Scalar::Text(text.to_string())),
            PrimitiveType::Bool => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Scalar::Bool(true),
                "false" | "0" => Scalar::Bool(false),
                _ => Scalar::Text(text.to_string()),
            },
        }
    }
}

/// A scalar that could not be converted to its target primitive type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot convert '{value}' to {target}")]
pub struct CoercionError {
    pub value: String,
    pub target: PrimitiveType,
}

/// Result of a successful coercion: the converted scalar and whether a
/// conversion actually took place (native matches pass through untouched).
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced {
    pub value: Scalar,
    pub converted: bool,
}

/// Best-effort conversion of a scalar to a target primitive type.
///
/// Native matches are free. Text parsing, numeric widening, fraction-free
/// narrowing and rendering to text succeed with `converted = true` so callers
/// can surface a coercion warning. Anything else fails.
pub fn coerce_scalar(value: Scalar, target: PrimitiveType) -> Result<Coerced, CoercionError> {
    if value.primitive_type() == target {
        return Ok(Coerced {
            value,
            converted: false,
        });
    }
    let fail = |value: &Scalar| CoercionError {
        value: value.to_string(),
        target,
    };
    let converted = match (&value, target) {
        (_, PrimitiveType::Text) => Scalar::Text(value.to_string()),
        (Scalar::Text(s), PrimitiveType::Integer) => {
            Scalar::Integer(s.trim().parse::<i64>().map_err(|_| fail(&value))?)
        }
        (Scalar::Float(x), PrimitiveType::Integer) => {
            if x.fract() == 0.0 && x.is_finite() {
                Scalar::Integer(*x as i64)
            } else {
                return Err(fail(&value));
            }
        }
        (Scalar::Text(s), PrimitiveType::Float) => {
            Scalar::Float(s.trim().parse::<f64>().map_err(|_| fail(&value))?)
        }
        (Scalar::Integer(i), PrimitiveType::Float) => Scalar::Float(*i as f64),
        (Scalar::Text(s), PrimitiveType::Bool) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Scalar::Bool(true),
            "false" | "0" => Scalar::Bool(false),
            _ => return Err(fail(&value)),
        },
        (Scalar::Integer(0), PrimitiveType::Bool) => Scalar::Bool(false),
        (Scalar::Integer(1), PrimitiveType::Bool) => Scalar::Bool(true),
        _ => return Err(fail(&value)),
    };
    Ok(Coerced {
        value: converted,
        converted: true,
    })
}

/// What a flat record maps a path to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Scalar(Scalar),
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Whether this value contains a list below the top level.
    pub fn has_nested_list(&self) -> bool {
        match self {
            Value::List(items) => items.iter().any(|v| matches!(v, Value::List(_))),
            _ => false,
        }
    }

    /// Build a list value from optional scalars (`None` becomes `Null` padding).
    pub fn from_scalars(items: Vec<Option<Scalar>>) -> Value {
        Value::List(
            items
                .into_iter()
                .map(|item| item.map(Value::Scalar).unwrap_or(Value::Null))
                .collect(),
        )
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}
