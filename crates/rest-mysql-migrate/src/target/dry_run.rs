//! Dry-run executor that records statements instead of running them.
//!
//! Used by `run --dry-run`: the pipeline extracts, infers and transforms as
//! usual, and every statement it would send is logged and kept for inspection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::core::traits::SqlExecutor;
use crate::core::value::SqlParam;
use crate::error::Result;

/// A statement captured by [`DryRunExecutor`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

/// Executor that accepts every statement without touching a database.
pub struct DryRunExecutor {
    statements: Mutex<Vec<RecordedStatement>>,
    warned: AtomicBool,
}

impl DryRunExecutor {
    /// Create a new dry-run executor.
    pub fn new() -> Self {
        Self {
            statements: Mutex::new(Vec::new()),
            warned: AtomicBool::new(false),
        }
    }

    fn warn_once(&self) {
        if !self.warned.swap(true, Ordering::SeqCst) {
            warn!("Dry run: statements are logged but not sent to the target database");
        }
    }

    fn record(&self, sql: &str, params: Vec<SqlParam>) {
        self.warn_once();
        debug!("dry-run: {}", sql);
        if let Ok(mut statements) = self.statements.lock() {
            statements.push(RecordedStatement {
                sql: sql.to_string(),
                params,
            });
        }
    }

    /// Statements received so far, in order.
    pub fn statements(&self) -> Vec<RecordedStatement> {
        self.statements
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl Default for DryRunExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SqlExecutor for DryRunExecutor {
    async fn execute(&self, statement: &str, params: Vec<SqlParam>) -> Result<u64> {
        self.record(statement, params);
        Ok(1)
    }

    async fn execute_raw(&self, statement: &str) -> Result<()> {
        self.record(statement, Vec::new());
        Ok(())
    }

    fn db_type(&self) -> &str {
        "dry-run"
    }
}
