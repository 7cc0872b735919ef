use std::fmt;

use serde::{Deserialize, Serialize};

/// A compiled value: what the evaluator produces for one card.
///
/// Serializes untagged, so a deck exported as JSON reads as plain
/// numbers, strings and booleans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    String(String),
    Boolean(bool),
}

impl Value {
    /// Name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Render the value the way cards print it. Integral numbers drop their
    /// fractional part; everything else uses scientific notation with
    /// `precision` digits after the point.
    pub fn render(&self, precision: usize) -> String {
        match self {
            Value::Number(n) => crate::util::format_number(*n, precision),
            Value::String(s) => s.clone(),
            Value::Boolean(b) => b.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(crate::util::MAX_DIGITS10))
    }
}

// ── Conversions into a value ─────────────────────────────────────

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Number(f64::from(v))
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                #[allow(clippy::cast_lossless)]
                fn from(v: $ty) -> Self {
                    Value::Number(v as f64)
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<&Value> for Value {
    fn from(v: &Value) -> Self {
        v.clone()
    }
}

// ── Typed decode ─────────────────────────────────────────────────

/// Types a card value can be decoded into.
///
/// Numbers decode to every arithmetic type and to `bool` (nonzero test).
/// Booleans decode to `bool` and to integer types as 0/1. Strings only
/// decode to `String`.
pub trait FromValue: Sized {
    /// Human-readable target name for mismatch diagnostics.
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_from_value_integer {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                const EXPECTED: &'static str = stringify!($ty);

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::Number(n) => Some(*n as $ty),
                        Value::Boolean(b) => Some(<$ty>::from(*b)),
                        Value::String(_) => None,
                    }
                }
            }
        )*
    };
}

impl_from_value_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    const EXPECTED: &'static str = "f64";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_number()
    }
}

impl FromValue for f32 {
    const EXPECTED: &'static str = "f32";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_number().map(|n| n as f32)
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Boolean(b) => Some(*b),
            Value::Number(n) => Some(*n != 0.0),
            Value::String(_) => None,
        }
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "string";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromValue for Value {
    const EXPECTED: &'static str = "value";

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn numbers_decode_to_every_arithmetic_type() {
        let v = Value::Number(3.75);
        assert_eq!(f64::from_value(&v), Some(3.75));
        assert_eq!(i32::from_value(&v), Some(3));
        assert_eq!(u8::from_value(&v), Some(3));
        assert_eq!(bool::from_value(&v), Some(true));
        assert_eq!(bool::from_value(&Value::Number(0.0)), Some(false));
        assert_eq!(String::from_value(&v), None);
    }

    #[test]
    fn booleans_decode_to_integers_but_not_floats() {
        let v = Value::Boolean(true);
        assert_eq!(bool::from_value(&v), Some(true));
        assert_eq!(i64::from_value(&v), Some(1));
        assert_eq!(usize::from_value(&Value::Boolean(false)), Some(0));
        assert_eq!(f64::from_value(&v), None);
    }

    #[test]
    fn strings_only_decode_to_strings() {
        let v = Value::from("face");
        assert_eq!(String::from_value(&v).as_deref(), Some("face"));
        assert_eq!(i32::from_value(&v), None);
        assert_eq!(bool::from_value(&v), None);
    }

    #[test]
    fn untagged_json_shape() {
        let json = serde_json::to_string(&vec![Value::from(1.5), Value::from("x"), Value::from(true)]).unwrap();
        assert_eq!(json, r#"[1.5,"x",true]"#);
        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[1], Value::String("x".into()));
    }
}
