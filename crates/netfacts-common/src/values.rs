//! Detected/current value bags stored on report entries.
//!
//! Each collector type writes its own keys (`mac`, `ip`, `serial_number`,
//! `remote_as`, ...). The bag is kept as JSON so it can be persisted and
//! displayed by the host without knowing the collector.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Key-value bag of fact data.
pub type FactValues = BTreeMap<String, Value>;

/// Converts a value for storage in a [`FactValues`] bag.
///
/// Values that cannot be represented as JSON are stored as `null`.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Builds a [`FactValues`] bag from key-value pairs.
///
/// ```
/// use netfacts_common::{fact_values, ValuesExt};
///
/// let vrf: Option<&str> = None;
/// let values = fact_values! {
///     "mac" => "00:1C:73:AA:00:01",
///     "vrf" => vrf,
/// };
/// assert_eq!(values.get_str("mac"), Some("00:1C:73:AA:00:01"));
/// assert_eq!(values.get_str("vrf"), None);
/// ```
#[macro_export]
macro_rules! fact_values {
    ($($field:expr => $value:expr),* $(,)?) => {{
        let mut values = $crate::values::FactValues::new();
        $( values.insert($field.to_string(), $crate::values::to_value(&$value)); )*
        values
    }};
}

/// Typed accessors for fact value bags.
pub trait ValuesExt {
    /// Returns the value as a string slice; `null` and non-strings yield `None`.
    fn get_str(&self, field: &str) -> Option<&str>;

    /// Returns the value as a non-empty string slice.
    fn get_non_empty(&self, field: &str) -> Option<&str> {
        self.get_str(field).filter(|s| !s.is_empty())
    }

    /// Gets the value for a field, returning the default if not present.
    fn get_str_or<'a>(&'a self, field: &str, default: &'a str) -> &'a str {
        self.get_str(field).unwrap_or(default)
    }

    /// Returns the value as an unsigned integer. Numeric strings are accepted.
    fn get_u64(&self, field: &str) -> Option<u64>;

    /// Returns the value as a boolean.
    fn get_bool(&self, field: &str) -> Option<bool>;

    /// Checks if a field exists and is not `null`.
    fn has_field(&self, field: &str) -> bool;
}

impl ValuesExt for FactValues {
    fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    fn get_u64(&self, field: &str) -> Option<u64> {
        match self.get(field)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn get_bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    fn has_field(&self, field: &str) -> bool {
        self.get(field).is_some_and(|v| !v.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_values_ext() {
        let values = fact_values! {
            "serial_number" => "NEW456",
            "remote_as" => 65001u32,
            "remote_as_text" => "65002",
            "is_up" => true,
            "vrf" => Option::<String>::None,
            "empty" => "",
        };

        assert_eq!(values.get_str("serial_number"), Some("NEW456"));
        assert_eq!(values.get_u64("remote_as"), Some(65001));
        assert_eq!(values.get_u64("remote_as_text"), Some(65002));
        assert_eq!(values.get_bool("is_up"), Some(true));
        assert_eq!(values.get_str("vrf"), None);
        assert!(!values.has_field("vrf"));
        assert!(values.has_field("empty"));
        assert_eq!(values.get_non_empty("empty"), None);
        assert_eq!(values.get_str_or("missing", "fallback"), "fallback");
    }

    #[test]
    fn test_serializes_as_object() {
        let values = fact_values! { "mac" => "00:1C:73:AA:00:01" };
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"{"mac":"00:1C:73:AA:00:01"}"#);
    }
}
