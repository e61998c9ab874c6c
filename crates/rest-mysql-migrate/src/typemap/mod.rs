//! Value classification and destination type mapping.
//!
//! [`classify`] decides the semantic type of one observed value;
//! [`mysql_type`] renders a column descriptor as a MySQL column type.

use crate::core::schema::{ColumnDescriptor, ColumnType};
use crate::core::value::SourceValue;

/// Width of the text identifier used for primary key columns.
pub const IDENTIFIER_LENGTH: usize = 36;

/// Total digits of DECIMAL columns.
pub const DECIMAL_PRECISION: u32 = 15;

/// Fractional digits of DECIMAL columns.
pub const DECIMAL_SCALE: u32 = 2;

/// Classify a single observed value.
///
/// Null is TEXT: nullability is a per-row property, and every destination
/// column is nullable except the primary key.
pub fn classify(value: Option<&SourceValue>) -> ColumnType {
    match value {
        None | Some(SourceValue::Null) => ColumnType::Text,
        Some(SourceValue::Bool(_)) => ColumnType::Boolean,
        Some(SourceValue::Integer(_)) => ColumnType::Integer,
        Some(SourceValue::Decimal(f)) if f.is_finite() && f.fract() == 0.0 => ColumnType::Integer,
        Some(SourceValue::Decimal(_)) => ColumnType::Decimal,
        Some(SourceValue::Text(_)) | Some(SourceValue::Structured(_)) => ColumnType::Text,
    }
}

/// Map a column descriptor to its MySQL column type.
pub fn mysql_type(column: &ColumnDescriptor) -> String {
    if column.is_primary_key {
        return format!("VARCHAR({})", IDENTIFIER_LENGTH);
    }
    match column.inferred_type {
        ColumnType::Integer => "BIGINT".to_string(),
        ColumnType::Decimal => format!("DECIMAL({},{})", DECIMAL_PRECISION, DECIMAL_SCALE),
        ColumnType::Boolean => "BOOLEAN".to_string(),
        ColumnType::Text => "TEXT".to_string(),
    }
}
