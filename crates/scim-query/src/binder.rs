//! Placeholder allocation and bound parameter values.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Prefix of every generated placeholder name.
pub const PLACEHOLDER_PREFIX: &str = "__value_";

/// A value bound to a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => write!(f, "{s:?}"),
            ParamValue::Integer(n) => write!(f, "{n}"),
            ParamValue::Decimal(n) => write!(f, "{n}"),
            ParamValue::Boolean(b) => write!(f, "{b}"),
            ParamValue::Timestamp(t) => {
                f.write_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
        }
    }
}

/// Bound parameters in the order their placeholders appear in the SQL.
///
/// Serializes as a map from placeholder name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    entries: Vec<(String, ParamValue)>,
}

impl ParameterSet {
    /// Number of bound parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a value by placeholder name (without the leading `:`).
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Iterates over `(name, value)` pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Placeholder names in binding order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl IntoIterator for ParameterSet {
    type Item = (String, ParamValue);
    type IntoIter = std::vec::IntoIter<(String, ParamValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for ParameterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Hands out placeholder names and records the values bound to them.
///
/// One binder serves exactly one compile call; the counter starts at zero.
#[derive(Debug, Default)]
pub struct ParameterBinder {
    params: ParameterSet,
}

impl ParameterBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value` under the next placeholder name and returns the name.
    pub fn bind(&mut self, value: ParamValue) -> String {
        let name = format!("{PLACEHOLDER_PREFIX}{}", self.params.len());
        tracing::trace!(placeholder = %name, %value, "bound parameter");
        self.params.entries.push((name.clone(), value));
        name
    }

    /// Number of values bound so far.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns true if nothing has been bound yet.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Consumes the binder, returning the bound parameters.
    pub fn finish(self) -> ParameterSet {
        self.params
    }
}
