use std::collections::BTreeMap;
use std::fmt::Display;

/// A scalar value for a single query parameter.
///
/// The API accepts only scalars in the query string; everything renders to
/// its plain text form before URL encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    String(String),
    Number(f64),
    Bool(bool),
}

impl ParamValue {
    fn render(&self) -> String {
        match self {
            ParamValue::String(value) => value.clone(),
            ParamValue::Number(value) => value.to_string(),
            ParamValue::Bool(value) => value.to_string(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Number(value as f64)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Number(f64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Number(f64::from(value))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

/// Open mapping of query parameters for a lookup request.
///
/// Keys are forwarded to the API verbatim; the client performs no schema
/// validation, so parameters the server adds later can be passed without a
/// client upgrade. Keys render in sorted order, which keeps the query string
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    params: BTreeMap<String, ParamValue>,
}

impl Query {
    /// Create an empty query. The server applies its own defaults when no
    /// parameters are sent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for the one parameter the zip codes endpoint recognizes.
    pub fn zip<S: Into<String>>(code: S) -> Self {
        Self::new().with("zip", code.into())
    }

    /// Add a parameter, consuming and returning the query for chaining.
    pub fn with<K: Into<String>, V: Into<ParamValue>>(mut self, key: K, value: V) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add or replace a parameter in place.
    pub fn set<K: Into<String>, V: Into<ParamValue>>(&mut self, key: K, value: V) {
        self.params.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Render the URL-encoded query string, or `None` when the query is
    /// empty and the request should carry no query string at all.
    pub fn to_query_string(&self) -> Option<String> {
        if self.params.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .params
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(key),
                    urlencoding::encode(&value.render())
                )
            })
            .collect();
        Some(pairs.join("&"))
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_query_string().unwrap_or_default())
    }
}
