//! Value model for terminal query results

use serde::{Deserialize, Serialize};

/// A scalar cell value produced by the query engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns true for `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// A bound query parameter.
///
/// Serialized with an internally tagged representation so that both the type
/// and the value feed the fingerprint: `Binding::Int(1)` and
/// `Binding::Str("1")` encode differently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Binding {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
}

impl From<Value> for Binding {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => Binding::Null,
            Value::Bool(b) => Binding::Bool(b),
            Value::Int(i) => Binding::Int(i),
            Value::Float(f) => Binding::Float(f),
            Value::Str(s) => Binding::Str(s),
            Value::Bytes(b) => Binding::Bytes(b),
        }
    }
}

/// A single result row: ordered column/value pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, preserving insertion order.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((column.into(), value.into()));
    }

    /// Builder-style variant of [`push`](Self::push).
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    /// Look up a column by name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate over `(column, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// The final, non-chainable result of a terminal operation.
///
/// `Empty` is the explicit "no rows" sentinel: a query that legitimately
/// returned no data is cached as `Empty`, which is distinguishable from the
/// key being absent from the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryResult {
    /// A collection of rows.
    Rows(Vec<Row>),
    /// A single row.
    Row(Row),
    /// A single scalar value (e.g. one column of one row, or an aggregate).
    Scalar(Value),
    /// A row count.
    Count(u64),
    /// A boolean result (e.g. an existence check).
    Bool(bool),
    /// The query ran and produced no data.
    Empty,
}

impl QueryResult {
    /// Returns true if this is the "no rows" sentinel.
    pub fn is_empty(&self) -> bool {
        matches!(self, QueryResult::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_ordering_and_lookup() {
        let row = Row::new().with("id", 1i64).with("name", "Alice");

        assert_eq!(row.len(), 2);
        assert_eq!(row.get("id"), Some(&Value::Int(1)));
        assert_eq!(row.get("name"), Some(&Value::Str("Alice".to_string())));
        assert_eq!(row.get("missing"), None);

        let columns: Vec<&str> = row.iter().map(|(name, _)| name).collect();
        assert_eq!(columns, vec!["id", "name"]);
    }

    #[test]
    fn test_binding_encoding_preserves_type() {
        let int = serde_json::to_string(&Binding::Int(1)).unwrap();
        let string = serde_json::to_string(&Binding::Str("1".to_string())).unwrap();
        assert_ne!(int, string);
    }

    #[test]
    fn test_empty_is_distinct_from_data() {
        assert!(QueryResult::Empty.is_empty());
        assert!(!QueryResult::Rows(vec![]).is_empty());
        assert!(!QueryResult::Scalar(Value::Null).is_empty());
    }

    #[test]
    fn test_result_roundtrips_through_serde() {
        let result = QueryResult::Rows(vec![Row::new().with("id", 7i64)]);
        let encoded = serde_json::to_string(&result).unwrap();
        let decoded: QueryResult = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, result);
    }
}
