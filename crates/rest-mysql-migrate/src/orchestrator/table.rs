//! Per-table migration: extract, infer, load.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::core::schema::TableMigrationPlan;
use crate::core::traits::SourceApi;
use crate::core::value::Record;
use crate::error::Result;
use crate::inference::infer_from_sample;
use crate::transfer::BatchLoader;

/// Outcome class of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    /// No error recorded.
    Migrated,
    /// Error recorded after some rows were loaded.
    Partial,
    /// Error recorded and nothing loaded.
    Failed,
}

/// Statistics for one migrated table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableReport {
    pub table_name: String,
    pub rows_extracted: usize,
    pub rows_loaded: usize,
    pub rows_failed: usize,
    pub rows_skipped: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_seconds: f64,
}

impl TableReport {
    /// Empty report for a table.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Default::default()
        }
    }

    /// Classify the outcome.
    pub fn status(&self) -> TableStatus {
        match (&self.error, self.rows_loaded) {
            (None, _) => TableStatus::Migrated,
            (Some(_), 0) => TableStatus::Failed,
            (Some(_), _) => TableStatus::Partial,
        }
    }
}

/// Migrates one table at a time from the source API into the destination.
pub struct TableMigrator {
    source: Arc<dyn SourceApi>,
    loader: BatchLoader,
    sample_rows: usize,
}

impl TableMigrator {
    pub fn new(source: Arc<dyn SourceApi>, loader: BatchLoader, sample_rows: usize) -> Self {
        Self {
            source,
            loader,
            sample_rows: sample_rows.max(1),
        }
    }

    /// Migrate one table. Never fails: every error, including a panic inside
    /// the pipeline, ends up in the returned report.
    #[instrument(skip(self))]
    pub async fn migrate_table(&self, table: &str, order_by: Option<&str>) -> TableReport {
        let started = Instant::now();
        info!("Migrating table {}", table);

        let outcome = AssertUnwindSafe(self.migrate_inner(table, order_by))
            .catch_unwind()
            .await;

        let mut report = match outcome {
            Ok(report) => report,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("{}: unexpected error during migration: {}", table, message);
                let mut report = TableReport::new(table);
                report.error = Some(format!("unexpected error: {}", message));
                report
            }
        };
        report.duration_seconds = started.elapsed().as_secs_f64();

        match report.status() {
            TableStatus::Migrated => info!(
                "{}: migrated {}/{} rows in {:.1}s",
                table, report.rows_loaded, report.rows_extracted, report.duration_seconds
            ),
            TableStatus::Partial => warn!(
                "{}: partially migrated {}/{} rows ({} failed, {} skipped)",
                table,
                report.rows_loaded,
                report.rows_extracted,
                report.rows_failed,
                report.rows_skipped
            ),
            TableStatus::Failed => error!(
                "{}: failed: {}",
                table,
                report.error.as_deref().unwrap_or("unknown error")
            ),
        }

        report
    }

    async fn migrate_inner(&self, table: &str, order_by: Option<&str>) -> TableReport {
        let mut report = TableReport::new(table);

        let rows = match self.extract(table, order_by).await {
            Ok(rows) => rows,
            Err(e) => {
                error!("{}: extraction failed: {}", table, e);
                report.error = Some(e.to_string());
                return report;
            }
        };
        report.rows_extracted = rows.len();

        if rows.is_empty() {
            info!("{}: source returned no rows, nothing to create", table);
            return report;
        }

        let plan = infer_from_sample(table, &rows, self.sample_rows).with_total_rows(rows.len());

        match self.loader.load(&plan, &rows).await {
            Ok(result) => {
                report.rows_loaded = result.loaded;
                report.rows_failed = result.failed;
                report.rows_skipped = result.skipped;
                report.error = result.error;
            }
            Err(e) => {
                error!("{}: {}", table, e);
                report.error = Some(e.to_string());
            }
        }

        report
    }

    /// Extract all rows, falling back to an unordered read when the source
    /// rejects the requested ordering.
    pub async fn extract(&self, table: &str, order_by: Option<&str>) -> Result<Vec<Record>> {
        let Some(column) = order_by else {
            return self.source.list_rows(table, None).await;
        };

        match self.source.list_rows(table, Some(column)).await {
            Ok(rows) => Ok(rows),
            Err(e) => {
                warn!(
                    "{}: ordered read by '{}' rejected ({}), retrying unordered",
                    table, column, e
                );
                self.source.list_rows(table, None).await
            }
        }
    }

    /// Extract and infer without writing anything.
    #[instrument(skip(self))]
    pub async fn plan(&self, table: &str, order_by: Option<&str>) -> Result<TableMigrationPlan> {
        let rows = self.extract(table, order_by).await?;
        Ok(infer_from_sample(table, &rows, self.sample_rows).with_total_rows(rows.len()))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status() {
        let mut report = TableReport::new("orders");
        assert_eq!(report.status(), TableStatus::Migrated);

        report.error = Some("boom".into());
        assert_eq!(report.status(), TableStatus::Failed);

        report.rows_loaded = 3;
        assert_eq!(report.status(), TableStatus::Partial);
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("bad state");
        assert_eq!(panic_message(boxed.as_ref()), "bad state");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(5_u8);
        assert_eq!(panic_message(boxed.as_ref()), "panic");
    }
}
