//! Inferred schema metadata: column descriptors and table migration plans.

use serde::{Deserialize, Serialize};

/// Name of the column treated as primary key.
pub const PRIMARY_KEY_COLUMN: &str = "id";

/// Semantic column type derived from observed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Integer,
    Decimal,
    Boolean,
    Text,
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Decimal => "DECIMAL",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Text => "TEXT",
        };
        f.write_str(name)
    }
}

/// Inferred metadata for one destination column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name, identical in source and target.
    pub name: String,

    /// Type inferred from the sample.
    pub inferred_type: ColumnType,

    /// Whether this is the primary key column.
    pub is_primary_key: bool,
}

impl ColumnDescriptor {
    /// Create a non-key column.
    pub fn new(name: impl Into<String>, inferred_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            inferred_type,
            is_primary_key: false,
        }
    }

    /// Create the primary key column. Keys are always text identifiers.
    pub fn primary_key(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inferred_type: ColumnType::Text,
            is_primary_key: true,
        }
    }
}

/// Full inferred schema for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMigrationPlan {
    /// Table name.
    pub table_name: String,

    /// Columns in sample-row order.
    pub columns: Vec<ColumnDescriptor>,

    /// Rows extracted for this table. Filled in by the caller.
    pub total_rows: usize,
}

impl TableMigrationPlan {
    /// Check if the plan has no columns (nothing to create or load).
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The primary key column, if the sample had one.
    pub fn primary_key(&self) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.is_primary_key)
    }

    /// Column names in plan order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Set the extracted row count.
    #[must_use]
    pub fn with_total_rows(mut self, total_rows: usize) -> Self {
        self.total_rows = total_rows;
        self
    }
}
