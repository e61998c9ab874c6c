//! Value types flowing through the pipeline.
//!
//! Rows arrive from the source data API as loosely typed JSON objects. They are
//! converted once into [`Record`]s holding a closed set of [`SourceValue`]
//! variants, so every later stage handles each case exhaustively. On the way
//! out, values are bound to statements as [`SqlParam`]s.

use serde_json::{Map, Value};

/// A single observed source value.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceValue {
    /// Explicit JSON `null`.
    Null,

    /// Boolean literal.
    Bool(bool),

    /// Number without a fractional part.
    Integer(i64),

    /// Number with a fractional part (or outside the i64 range).
    Decimal(f64),

    /// String, including date-like text.
    Text(String),

    /// Nested object or array, kept as JSON.
    Structured(Value),
}

impl SourceValue {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SourceValue::Null)
    }

    /// Check if this value is a nested structure.
    #[must_use]
    pub fn is_structured(&self) -> bool {
        matches!(self, SourceValue::Structured(_))
    }
}

impl From<Value> for SourceValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => SourceValue::Null,
            Value::Bool(b) => SourceValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    SourceValue::Integer(i)
                } else {
                    let f = n.as_f64().unwrap_or(f64::NAN);
                    // 3.0 is integral; u64 values past i64::MAX stay decimal
                    if f.is_finite()
                        && f.fract() == 0.0
                        && f >= i64::MIN as f64
                        && f < i64::MAX as f64
                    {
                        SourceValue::Integer(f as i64)
                    } else {
                        SourceValue::Decimal(f)
                    }
                }
            }
            Value::String(s) => SourceValue::Text(s),
            structured @ (Value::Array(_) | Value::Object(_)) => {
                SourceValue::Structured(structured)
            }
        }
    }
}

impl From<bool> for SourceValue {
    fn from(v: bool) -> Self {
        SourceValue::Bool(v)
    }
}

impl From<i64> for SourceValue {
    fn from(v: i64) -> Self {
        SourceValue::Integer(v)
    }
}

impl From<f64> for SourceValue {
    fn from(v: f64) -> Self {
        SourceValue::Decimal(v)
    }
}

impl From<&str> for SourceValue {
    fn from(v: &str) -> Self {
        SourceValue::Text(v.to_string())
    }
}

impl From<String> for SourceValue {
    fn from(v: String) -> Self {
        SourceValue::Text(v)
    }
}

/// One extracted row: column names mapped to values, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, SourceValue)>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON object, keeping key order.
    pub fn from_json_object(object: Map<String, Value>) -> Self {
        Self {
            fields: object
                .into_iter()
                .map(|(k, v)| (k, SourceValue::from(v)))
                .collect(),
        }
    }

    /// Build a record from a JSON value. Non-object values yield `None`.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(object) => Some(Self::from_json_object(object)),
            _ => None,
        }
    }

    /// Set a column, replacing an existing value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<SourceValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Builder form of [`Record::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<SourceValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up a column value.
    pub fn get(&self, name: &str) -> Option<&SourceValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Iterate columns in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SourceValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the record has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A value bound to a statement placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl SqlParam {
    /// Check if this parameter is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlParam::Null)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Int(v)
    }
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> Self {
        SqlParam::Bool(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_conversion() {
        assert_eq!(SourceValue::from(json!(42)), SourceValue::Integer(42));
        assert_eq!(SourceValue::from(json!(-7)), SourceValue::Integer(-7));
        assert_eq!(SourceValue::from(json!(3.0)), SourceValue::Integer(3));
        assert_eq!(SourceValue::from(json!(19.99)), SourceValue::Decimal(19.99));
        assert!(matches!(
            SourceValue::from(json!(u64::MAX)),
            SourceValue::Decimal(_)
        ));
    }

    #[test]
    fn test_structured_conversion() {
        assert!(SourceValue::from(json!({"tier": 1})).is_structured());
        assert!(SourceValue::from(json!([1, 2])).is_structured());
        assert!(SourceValue::from(json!(null)).is_null());
    }

    #[test]
    fn test_record_keeps_insertion_order() {
        let value = json!({"zeta": 1, "alpha": "a", "mid": true});
        let record = Record::from_json(value).unwrap();
        let keys: Vec<&str> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_record_from_non_object() {
        assert!(Record::from_json(json!([1, 2, 3])).is_none());
    }

    #[test]
    fn test_record_insert_replaces() {
        let mut record = Record::new().with("id", "1").with("name", "Acme");
        record.insert("id", "2");
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("id"), Some(&SourceValue::Text("2".into())));
        assert_eq!(record.get("missing"), None);
    }
}
