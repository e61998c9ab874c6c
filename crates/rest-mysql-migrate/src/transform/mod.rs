//! Row transformation into destination-safe values.
//!
//! Every plan column gets exactly one value: `None` for absent or null
//! fields, JSON text for structured values, and the plain text form of any
//! scalar. Type coercion for binding happens later, in the loader.

use crate::core::schema::ColumnDescriptor;
use crate::core::value::{Record, SourceValue};

/// A transformed row, aligned with the plan's columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationRow {
    fields: Vec<(String, Option<String>)>,
}

impl DestinationRow {
    /// Look up a column value. `Some(None)` is a NULL column.
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_deref())
    }

    /// Iterate values in plan order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Transform one source record against the plan's columns.
///
/// Keys of `row` that are not plan columns are ignored.
pub fn transform(row: &Record, columns: &[ColumnDescriptor]) -> DestinationRow {
    let fields = columns
        .iter()
        .map(|column| (column.name.clone(), to_destination(row.get(&column.name))))
        .collect();
    DestinationRow { fields }
}

/// Convert one value. Total over every [`SourceValue`] variant.
pub fn to_destination(value: Option<&SourceValue>) -> Option<String> {
    match value? {
        SourceValue::Null => None,
        SourceValue::Bool(b) => Some(b.to_string()),
        SourceValue::Integer(i) => Some(i.to_string()),
        SourceValue::Decimal(f) => Some(f.to_string()),
        SourceValue::Text(s) => Some(s.clone()),
        SourceValue::Structured(v) => Some(v.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::ColumnType;
    use serde_json::json;

    fn columns(names: &[&str]) -> Vec<ColumnDescriptor> {
        names
            .iter()
            .map(|n| ColumnDescriptor::new(*n, ColumnType::Text))
            .collect()
    }

    #[test]
    fn test_null_and_absent_become_none() {
        let row = Record::from_json(json!({"a": null})).unwrap();
        let out = transform(&row, &columns(&["a", "b"]));
        assert_eq!(out.get("a"), Some(None));
        assert_eq!(out.get("b"), Some(None));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_scalars_become_text() {
        let row = Record::from_json(json!({
            "i": 42, "neg": -3, "d": 19.99, "t": true, "f": false, "s": "Acme", "empty": ""
        }))
        .unwrap();
        let out = transform(&row, &columns(&["i", "neg", "d", "t", "f", "s", "empty"]));
        let values: Vec<Option<&str>> = out.iter().map(|(_, v)| v).collect();
        assert_eq!(
            values,
            vec![
                Some("42"),
                Some("-3"),
                Some("19.99"),
                Some("true"),
                Some("false"),
                Some("Acme"),
                Some("")
            ]
        );
    }

    #[test]
    fn test_extra_row_keys_are_ignored() {
        let row = Record::from_json(json!({"id": "1", "secret": "x"})).unwrap();
        let out = transform(&row, &columns(&["id"]));
        assert_eq!(out.len(), 1);
        assert_eq!(out.get("secret"), None);
    }

    #[test]
    fn test_structured_round_trip() {
        let original = json!({"tier": 1, "tags": ["a", "b"], "nested": {"x": null, "y": 2.5}});
        let row = Record::new().with("meta", SourceValue::from(original.clone()));
        let out = transform(&row, &columns(&["meta"]));
        let text = out.get("meta").flatten().unwrap();
        let decoded: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_structured_keeps_key_order() {
        let row = Record::new().with("meta", SourceValue::from(json!({"b": 1, "a": 2})));
        let out = transform(&row, &columns(&["meta"]));
        assert_eq!(out.get("meta"), Some(Some(r#"{"b":1,"a":2}"#)));
    }

    #[test]
    fn test_empty_plan_yields_empty_row() {
        let row = Record::from_json(json!({"a": 1})).unwrap();
        assert!(transform(&row, &[]).is_empty());
    }
}
