//! Format strings to value coercions.
//!
//! An action may declare a format per variable. At invocation time the format
//! is resolved through the system's [`FormatParser`] and the returned
//! [`Coercion`] is applied to the bound value.

use serde_json::{Number, Value};

use crate::error::{CoerceError, RegistryError};

/// Converts one runtime value into its declared type.
pub type Coercion = fn(&Value) -> Result<Value, CoerceError>;

pub trait FormatParser: Send + Sync {
    fn fmt_to_type(&self, format: &str) -> Result<Coercion, RegistryError>;
}

/// Understands type names (`float`, `int`, `str`, `bool`) and printf style
/// conversions (`%d`, `%.3f`, `%s`, ...).
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardParser;

impl FormatParser for StandardParser {
    fn fmt_to_type(&self, format: &str) -> Result<Coercion, RegistryError> {
        let key = format.trim().to_ascii_lowercase();
        let coercion: Option<Coercion> = match key.as_str() {
            "float" | "double" => Some(to_float),
            "int" | "integer" => Some(to_int),
            "str" | "string" => Some(to_str),
            "bool" | "boolean" => Some(to_bool),
            other => printf_coercion(other),
        };
        coercion.ok_or_else(|| RegistryError::UnknownFormat {
            format: format.to_owned(),
        })
    }
}

fn printf_coercion(spec: &str) -> Option<Coercion> {
    let body = spec.strip_prefix('%')?;
    let conversion = body.chars().last()?;
    let flags = &body[..body.len() - conversion.len_utf8()];
    if !flags
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | ' ' | '#'))
    {
        return None;
    }
    match conversion {
        'd' | 'i' | 'u' => Some(to_int),
        'f' | 'e' | 'g' => Some(to_float),
        's' => Some(to_str),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Coercions
// ---------------------------------------------------------------------------

pub fn to_float(value: &Value) -> Result<Value, CoerceError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| failed(value, "float"))
}

/// Floats are truncated toward zero. Values outside the `i64` range fail.
pub fn to_int(value: &Value) -> Result<Value, CoerceError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate_f64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    };
    parsed.map(Value::from).ok_or_else(|| failed(value, "int"))
}

fn truncate_f64(f: f64) -> Option<i64> {
    // `i64::MIN as f64` is exactly -2^63; 2^63 itself is one past `i64::MAX`.
    const LOWER: f64 = i64::MIN as f64;
    let t = f.trunc();
    (t >= LOWER && t < -LOWER).then_some(t as i64)
}

pub fn to_str(value: &Value) -> Result<Value, CoerceError> {
    Ok(match value {
        Value::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    })
}

pub fn to_bool(value: &Value) -> Result<Value, CoerceError> {
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" | "" => Some(false),
            _ => None,
        },
        Value::Null => Some(false),
        _ => None,
    };
    parsed.map(Value::Bool).ok_or_else(|| failed(value, "bool"))
}

fn failed(value: &Value, target: &'static str) -> CoerceError {
    CoerceError {
        value: value.to_string(),
        target,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn coerce(format: &str, value: Value) -> Result<Value, CoerceError> {
        let f = StandardParser.fmt_to_type(format).expect("known format");
        f(&value)
    }

    #[rstest]
    #[case("float", json!("100"), json!(100.0))]
    #[case("%.2f", json!("2.5"), json!(2.5))]
    #[case("%e", json!(3), json!(3.0))]
    #[case("int", json!("42"), json!(42))]
    #[case("%d", json!(7.9), json!(7))]
    #[case("%5i", json!(true), json!(1))]
    #[case("str", json!(3), json!("3"))]
    #[case("%s", json!("abc"), json!("abc"))]
    #[case("bool", json!("off"), json!(false))]
    #[case("BOOL", json!(2), json!(true))]
    fn known_formats_coerce(#[case] format: &str, #[case] input: Value, #[case] expected: Value) {
        assert_eq!(coerce(format, input).expect("coerce"), expected);
    }

    #[rstest]
    #[case("float", json!("hot"))]
    #[case("int", json!("3.5"))]
    #[case("bool", json!("maybe"))]
    #[case("float", json!([1, 2]))]
    #[case("int", json!(1e19))]
    #[case("%d", json!(-1e19))]
    #[case("int", json!(u64::MAX))]
    fn bad_values_are_rejected(#[case] format: &str, #[case] input: Value) {
        let err = coerce(format, input).unwrap_err();
        assert_eq!(err.target, format);
    }

    #[rstest]
    #[case("decimal")]
    #[case("%q")]
    #[case("%")]
    #[case("%abc")]
    fn unknown_formats_are_reported(#[case] format: &str) {
        let err = StandardParser.fmt_to_type(format).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownFormat { .. }), "got: {err}");
    }
}
