//! Lenient value normalizers shared by the envelope and geo pipelines.
//!
//! Search payloads arrive from a loosely typed producer, so numbers may be strings,
//! years may carry trailing noise, and presence is judged by truthiness rather than
//! by key existence. The helpers here pin those rules down in one place.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Century prefixes accepted by [`is_year`].
pub const CENTURY_PREFIXES: &[&str] = &["16", "17", "18", "19", "20", "21", "22", "23"];

static INT_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([+-]?\d+)").expect("valid integer prefix regex"));

static FLOAT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)").expect("valid float prefix regex")
});

/// Parses the leading base-10 integer of `raw`, ignoring anything after it.
///
/// `"1900"`, `" 1900"` and `"1900s"` all yield `Some(1900)`. Returns `None` when no
/// digits lead the string or the value does not fit in an `i64`.
pub fn parse_int_prefix(raw: &str) -> Option<i64> {
    let captures = INT_PREFIX.captures(raw)?;
    captures.get(1)?.as_str().parse::<i64>().ok()
}

/// Parses the leading decimal number of `raw`, ignoring anything after it.
pub fn parse_float_prefix(raw: &str) -> Option<f64> {
    let captures = FLOAT_PREFIX.captures(raw)?;
    captures.get(1)?.as_str().parse::<f64>().ok()
}

/// Coerces a JSON scalar into a finite `f64`.
///
/// Numbers pass through, strings go through [`parse_float_prefix`]. Everything else,
/// and any non-finite result, is rejected.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => parse_float_prefix(raw),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// JSON truthiness: `null`, `false`, `0` and `""` are falsy; arrays and objects are
/// truthy even when empty.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Looks up `key` on `value` and returns it only when it is present and truthy.
pub fn truthy_field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|field| is_truthy(field))
}

/// Returns true if `value` looks like a four digit calendar year with a known century.
pub fn is_year(value: &Value) -> bool {
    match value {
        Value::Number(number) => {
            let Some(n) = number.as_f64() else {
                return false;
            };
            (1000.0..=9999.0).contains(&n) && has_century_prefix(&number.to_string())
        }
        Value::String(text) => {
            text.chars().count() == 4 && text.trim().parse::<f64>().is_ok() && has_century_prefix(text)
        }
        _ => false,
    }
}

fn has_century_prefix(text: &str) -> bool {
    CENTURY_PREFIXES.iter().any(|prefix| text.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn int_prefix_is_lenient() {
        assert_eq!(parse_int_prefix("1900"), Some(1900));
        assert_eq!(parse_int_prefix("  1950s"), Some(1950));
        assert_eq!(parse_int_prefix("-12"), Some(-12));
        assert_eq!(parse_int_prefix("abc"), None);
        assert_eq!(parse_int_prefix(""), None);
    }

    #[test]
    fn float_prefix_is_lenient() {
        assert_eq!(parse_float_prefix("10"), Some(10.0));
        assert_eq!(parse_float_prefix("-73.98abc"), Some(-73.98));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("1e3"), Some(1000.0));
        assert_eq!(parse_float_prefix("north"), None);
    }

    #[test]
    fn coerce_rejects_non_scalars() {
        assert_eq!(coerce_f64(&json!("20")), Some(20.0));
        assert_eq!(coerce_f64(&json!(1.5)), Some(1.5));
        assert_eq!(coerce_f64(&json!(true)), None);
        assert_eq!(coerce_f64(&json!(null)), None);
        assert_eq!(coerce_f64(&json!([1])), None);
    }

    #[test]
    fn truthiness_matches_loose_payload_rules() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(false)));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!("0")));
    }

    #[test]
    fn year_detection() {
        assert!(is_year(&json!(1900)));
        assert!(is_year(&json!("1850")));
        assert!(!is_year(&json!(1500)));
        assert!(!is_year(&json!("19000")));
        assert!(!is_year(&json!("19ab")));
        assert!(!is_year(&json!(null)));
    }
}
