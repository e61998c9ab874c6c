//! Batch loader: schema creation plus batched per-row inserts.
//!
//! Rows are split into fixed-size batches. Inside a batch every row is
//! transformed, bound and inserted with its own statement so a failure points
//! at exactly one row. The first failure stops the table: the failing row is
//! counted as failed, everything after it is logged as skipped, and partial
//! counts are returned instead of an error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::core::schema::{ColumnDescriptor, ColumnType, TableMigrationPlan, PRIMARY_KEY_COLUMN};
use crate::core::traits::SqlExecutor;
use crate::core::value::{Record, SqlParam};
use crate::dialect::MysqlDialect;
use crate::error::{MigrateError, Result};
use crate::transform::{transform, DestinationRow};

/// Loader configuration.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Rows per batch.
    pub batch_size: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self { batch_size: 100 }
    }
}

/// Outcome of loading one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadResult {
    /// Rows inserted.
    pub loaded: usize,

    /// Rows whose INSERT failed. At most one, since the table stops there.
    pub failed: usize,

    /// Rows never attempted because an earlier row failed.
    pub skipped: usize,

    /// Batches fully inserted.
    pub batches_completed: usize,

    /// Failure message of the row that stopped the table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Loads rows for one plan into the destination.
pub struct BatchLoader {
    executor: Arc<dyn SqlExecutor>,
    dialect: MysqlDialect,
    config: TransferConfig,
}

impl BatchLoader {
    /// Create a new loader over a destination executor.
    pub fn new(executor: Arc<dyn SqlExecutor>, config: TransferConfig) -> Self {
        Self {
            executor,
            dialect: MysqlDialect::new(),
            config,
        }
    }

    /// Create the table if needed, then insert `rows` batch by batch.
    ///
    /// Returns `Err` only when the CREATE TABLE is rejected; insert failures
    /// are reported through [`LoadResult`].
    pub async fn load(&self, plan: &TableMigrationPlan, rows: &[Record]) -> Result<LoadResult> {
        let table = plan.table_name.as_str();
        let mut result = LoadResult::default();

        if plan.is_empty() {
            warn!("{}: plan has no columns, nothing to load", table);
            return Ok(result);
        }

        let ddl = self.dialect.create_table_if_not_exists(plan);
        debug!("{}: {}", table, ddl);
        self.executor
            .execute_raw(&ddl)
            .await
            .map_err(|e| MigrateError::schema_creation(table, e))?;

        let insert_sql = self.dialect.insert_row(plan);
        let batch_size = self.config.batch_size.max(1);
        let total_batches = rows.len().div_ceil(batch_size);

        for (batch_idx, batch) in rows.chunks(batch_size).enumerate() {
            let transformed: Vec<DestinationRow> =
                batch.iter().map(|row| transform(row, &plan.columns)).collect();

            for (row_idx, row) in transformed.iter().enumerate() {
                let params = bind_row(&plan.columns, row);
                if let Err(e) = self.executor.execute(&insert_sql, params).await {
                    let row_number = batch_idx * batch_size + row_idx + 1;
                    let row_label = match row.get(PRIMARY_KEY_COLUMN).flatten() {
                        Some(id) => format!("row {} (id={})", row_number, id),
                        None => format!("row {}", row_number),
                    };

                    error!(
                        "{}: batch {}/{} failed at {}: {}",
                        table,
                        batch_idx + 1,
                        total_batches,
                        row_label,
                        e
                    );

                    result.failed += 1;
                    result.skipped = rows.len() - row_number;
                    result.error = Some(format!("{}: {}", row_label, e));

                    if result.skipped > 0 {
                        warn!(
                            "{}: skipped {} remaining rows after failure at {}",
                            table, result.skipped, row_label
                        );
                    }
                    return Ok(result);
                }
                result.loaded += 1;
            }

            result.batches_completed += 1;
            debug!(
                "{}: batch {}/{} loaded ({} rows)",
                table,
                batch_idx + 1,
                total_batches,
                batch.len()
            );
        }

        info!(
            "{}: loaded {} rows in {} batches",
            table, result.loaded, result.batches_completed
        );
        Ok(result)
    }
}

/// Bind a transformed row to INSERT parameters in plan order.
pub fn bind_row(columns: &[ColumnDescriptor], row: &DestinationRow) -> Vec<SqlParam> {
    columns
        .iter()
        .map(|c| bind_param(c, row.get(&c.name).flatten()))
        .collect()
}

/// Coerce one text value to the parameter type its column expects.
///
/// Values that do not parse are passed through as text and left for the
/// database to accept or reject.
pub fn bind_param(column: &ColumnDescriptor, value: Option<&str>) -> SqlParam {
    let Some(text) = value else {
        return SqlParam::Null;
    };
    if column.is_primary_key {
        return SqlParam::Text(text.to_string());
    }
    match column.inferred_type {
        ColumnType::Boolean => match text {
            "true" => SqlParam::Bool(true),
            "false" => SqlParam::Bool(false),
            _ => SqlParam::Text(text.to_string()),
        },
        ColumnType::Integer => text
            .parse::<i64>()
            .map(SqlParam::Int)
            .unwrap_or_else(|_| SqlParam::Text(text.to_string())),
        ColumnType::Decimal | ColumnType::Text => SqlParam::Text(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_config_default() {
        assert_eq!(TransferConfig::default().batch_size, 100);
    }

    #[test]
    fn test_bind_null() {
        let col = ColumnDescriptor::new("n", ColumnType::Integer);
        assert_eq!(bind_param(&col, None), SqlParam::Null);
    }

    #[test]
    fn test_bind_boolean() {
        let col = ColumnDescriptor::new("active", ColumnType::Boolean);
        assert_eq!(bind_param(&col, Some("true")), SqlParam::Bool(true));
        assert_eq!(bind_param(&col, Some("false")), SqlParam::Bool(false));
        assert_eq!(bind_param(&col, Some("yes")), SqlParam::Text("yes".into()));
    }

    #[test]
    fn test_bind_integer() {
        let col = ColumnDescriptor::new("qty", ColumnType::Integer);
        assert_eq!(bind_param(&col, Some("12")), SqlParam::Int(12));
        assert_eq!(bind_param(&col, Some("12.5")), SqlParam::Text("12.5".into()));
    }

    #[test]
    fn test_bind_primary_key_stays_text() {
        let col = ColumnDescriptor::primary_key("id");
        assert_eq!(bind_param(&col, Some("42")), SqlParam::Text("42".into()));
    }

    #[test]
    fn test_bind_decimal_is_text() {
        let col = ColumnDescriptor::new("total", ColumnType::Decimal);
        assert_eq!(bind_param(&col, Some("19.99")), SqlParam::Text("19.99".into()));
    }
}
