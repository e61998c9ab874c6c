//! Core traits for the two external collaborators of the pipeline.
//!
//! - [`SourceApi`]: reads whole tables from the source data API
//! - [`SqlExecutor`]: runs statements against the destination database
//!
//! The pipeline only talks to these traits, so tests and dry runs can swap in
//! in-memory implementations.

use async_trait::async_trait;

use crate::error::Result;

use super::value::{Record, SqlParam};

/// Read rows from the source data API.
#[async_trait]
pub trait SourceApi: Send + Sync {
    /// Fetch every row of `table`, ordered ascending by `order_by` when given.
    ///
    /// Implementations return an error when the API rejects the ordering
    /// (for example because the column does not exist); callers decide
    /// whether to retry unordered.
    async fn list_rows(&self, table: &str, order_by: Option<&str>) -> Result<Vec<Record>>;

    /// Check connectivity to the API.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    /// Get the source type identifier (e.g. "rest").
    fn source_type(&self) -> &str;
}

/// Execute statements against the destination database.
///
/// One executor wraps one destination session. Session-level settings such
/// as foreign key checks apply to every later statement on the same executor.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Execute a parameterized statement. Returns affected rows.
    async fn execute(&self, statement: &str, params: Vec<SqlParam>) -> Result<u64>;

    /// Execute a statement without parameters (DDL, session pragmas).
    async fn execute_raw(&self, statement: &str) -> Result<()>;

    /// Check connectivity to the database.
    async fn ping(&self) -> Result<()> {
        self.execute_raw("SELECT 1").await
    }

    /// Release the session. Statements after this may fail.
    async fn close(&self) {}

    /// Get the database type identifier (e.g. "mysql").
    fn db_type(&self) -> &str;
}
