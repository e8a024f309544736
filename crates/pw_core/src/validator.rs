//! Predefined validators and value coercion helpers.
//!
//! A validator returns `Some(message)` when the value is invalid. Messages may
//! contain `{attribute}`, which the model replaces with the property name.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Validation predicate signature used by [`crate::model::ValidationRule`].
pub type Validator = fn(&Value) -> Option<String>;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?\.)+[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?$",
    )
    .expect("valid email regex")
});

/// Fails when the value is empty in the loose sense (see [`is_truthy`]).
pub fn required(value: &Value) -> Option<String> {
    if is_truthy(value) {
        None
    } else {
        Some("The {attribute} field is required.".to_string())
    }
}

/// Fails unless the value's string form is a plausible e-mail address.
pub fn email(value: &Value) -> Option<String> {
    if EMAIL_RE.is_match(&value_to_string(value)) {
        None
    } else {
        Some("Please enter a valid e-mail address.".to_string())
    }
}

/// Loose truthiness: null, `false`, `""`, `"0"`, zero and empty
/// arrays/objects are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !(text.is_empty() || text == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// String form used when a value is rendered into markup or compared.
///
/// `true` becomes `"1"`; `false` and null become `""`; containers fall back
/// to their JSON text.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Flattens a value into a list of strings (arrays element-wise, scalars as a
/// single entry, null as nothing).
pub fn value_to_strings(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().map(value_to_string).collect(),
        other => vec![value_to_string(other)],
    }
}
