use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A raw request value as seen by filter rules and query targets.
///
/// Values arriving through a query string are always strings (or lists/maps of
/// strings once bracket nesting is resolved); JSON bodies may carry numbers and
/// booleans as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum FilterValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<FilterValue>),
    Map(BTreeMap<String, FilterValue>),
}

impl FilterValue {
    /// Emptiness as used for filter eligibility.
    ///
    /// `null`, `false`, `0`, `0.0`, `""`, `"0"` and empty collections are all
    /// empty. A present-but-falsy value is indistinguishable from an absent one.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Null => true,
            FilterValue::Bool(b) => !b,
            FilterValue::Int(i) => *i == 0,
            FilterValue::Float(f) => *f == 0.0,
            FilterValue::String(s) => s.is_empty() || s == "0",
            FilterValue::List(items) => items.is_empty(),
            FilterValue::Map(map) => map.is_empty(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FilterValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FilterValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FilterValue::Int(i) => Some(*i),
            FilterValue::String(s) => s.trim().parse().ok(),
            FilterValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FilterValue]> {
        match self {
            FilterValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, FilterValue>> {
        match self {
            FilterValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key when this value is a map.
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Turn the value into a sequence, splitting scalars on `delimiter`.
    ///
    /// Lists are returned as-is. Maps contribute their values in key order.
    pub fn into_list(self, delimiter: char) -> Vec<FilterValue> {
        match self {
            FilterValue::List(items) => items,
            FilterValue::Map(map) => map.into_values().collect(),
            FilterValue::Null => Vec::new(),
            FilterValue::String(s) => s
                .split(delimiter)
                .map(|part| FilterValue::String(part.to_string()))
                .collect(),
            scalar => vec![scalar],
        }
    }

    /// Render a scalar for a URL or a text bind parameter.
    ///
    /// Collections render as their comma-joined scalars; `null` renders empty.
    pub fn to_param_string(&self) -> String {
        match self {
            FilterValue::Null => String::new(),
            FilterValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            FilterValue::Int(i) => i.to_string(),
            FilterValue::Float(f) => f.to_string(),
            FilterValue::String(s) => s.clone(),
            FilterValue::List(items) => items
                .iter()
                .map(FilterValue::to_param_string)
                .collect::<Vec<_>>()
                .join(","),
            FilterValue::Map(map) => map
                .values()
                .map(FilterValue::to_param_string)
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

impl std::fmt::Display for FilterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_param_string())
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(i: i64) -> Self {
        FilterValue::Int(i)
    }
}

impl From<i32> for FilterValue {
    fn from(i: i32) -> Self {
        FilterValue::Int(i as i64)
    }
}

impl From<u64> for FilterValue {
    fn from(i: u64) -> Self {
        match i64::try_from(i) {
            Ok(i) => FilterValue::Int(i),
            Err(_) => FilterValue::String(i.to_string()),
        }
    }
}

impl From<f64> for FilterValue {
    fn from(f: f64) -> Self {
        FilterValue::Float(f)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Bool(b)
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(items: Vec<T>) -> Self {
        FilterValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FilterValue::Null)
    }
}

impl From<serde_json::Value> for FilterValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FilterValue::Null,
            serde_json::Value::Bool(b) => FilterValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FilterValue::Int(i)
                } else if let Some(f) = n.as_f64() {
                    FilterValue::Float(f)
                } else {
                    FilterValue::String(n.to_string())
                }
            }
            serde_json::Value::String(s) => FilterValue::String(s),
            serde_json::Value::Array(items) => {
                FilterValue::List(items.into_iter().map(FilterValue::from).collect())
            }
            serde_json::Value::Object(map) => FilterValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, FilterValue::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falsy_values_are_empty() {
        assert!(FilterValue::Null.is_empty());
        assert!(FilterValue::from("").is_empty());
        assert!(FilterValue::from("0").is_empty());
        assert!(FilterValue::from(0).is_empty());
        assert!(FilterValue::from(false).is_empty());
        assert!(FilterValue::List(vec![]).is_empty());
        assert!(!FilterValue::from("active").is_empty());
        assert!(!FilterValue::from(7).is_empty());
    }

    #[test]
    fn split_scalar_on_delimiter() {
        let parts = FilterValue::from("a;b;c").into_list(';');
        let expected: Vec<FilterValue> = vec!["a".into(), "b".into(), "c".into()];
        assert_eq!(parts, expected);
    }

    #[test]
    fn lists_are_not_split() {
        let list = FilterValue::from(vec!["a;b", "c"]);
        assert_eq!(list.into_list(';').len(), 2);
    }

    #[test]
    fn json_numbers_keep_their_kind() {
        let v = FilterValue::from(serde_json::json!({"n": 3, "f": 1.5, "s": "x"}));
        assert_eq!(v.get("n"), Some(&FilterValue::Int(3)));
        assert_eq!(v.get("f"), Some(&FilterValue::Float(1.5)));
        assert_eq!(v.get("s").and_then(FilterValue::as_str), Some("x"));
    }
}
