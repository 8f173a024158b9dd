/// Extracted and to-be-substituted route parameters
///
/// A parameter is either a single decoded segment or, for repeatable
/// parameters (`:path+`, `:path*`, `*`), an ordered list of segments.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Parameter name → value mapping
pub type Params = HashMap<String, ParamValue>;

/// Value of a single route parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Value of a non-repeatable parameter
    Single(String),
    /// Segments of a repeatable parameter, in path order
    List(Vec<String>),
}

impl ParamValue {
    /// Returns the scalar value, `None` for lists
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Single(value) => Some(value),
            ParamValue::List(_) => None,
        }
    }

    /// Returns the list value, `None` for scalars
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ParamValue::Single(_) => None,
            ParamValue::List(values) => Some(values),
        }
    }

    /// An empty string or empty list counts as "not provided"
    pub fn is_empty(&self) -> bool {
        match self {
            ParamValue::Single(value) => value.is_empty(),
            ParamValue::List(values) => values.iter().all(|v| v.is_empty()),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::List(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        ParamValue::List(values.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ParamValue {
    fn from(values: [&str; N]) -> Self {
        ParamValue::List(values.iter().map(|v| v.to_string()).collect())
    }
}

impl PartialEq<&str> for ParamValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

/// Builds a [`Params`] map from `(name, value)` pairs
///
/// # Examples
///
/// ```
/// use trailhead_router::{params_from, ParamValue};
///
/// let params = params_from([("id", ParamValue::from("42"))]);
/// assert_eq!(params["id"], "42");
/// ```
pub fn params_from<I, K, V>(pairs: I) -> Params
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<ParamValue>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_deserialize() {
        let params: Params = serde_json::from_str(r#"{"id": "7", "path": ["a", "b"]}"#).unwrap();
        assert_eq!(params["id"], ParamValue::from("7"));
        assert_eq!(params["path"], ParamValue::from(["a", "b"]));
    }

    #[test]
    fn test_emptiness() {
        assert!(ParamValue::from("").is_empty());
        assert!(ParamValue::List(Vec::new()).is_empty());
        assert!(!ParamValue::from(["a"]).is_empty());
    }
}
