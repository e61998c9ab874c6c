//! # rest-mysql-migrate
//!
//! Schema-inferring migration from a REST data API into MySQL.
//!
//! Tables are read whole from the source API, their destination schema is
//! inferred from the observed rows, and rows are loaded in batches of
//! per-row inserts while foreign key checks are suspended:
//!
//! - **Type inference** from sample rows (INTEGER, DECIMAL, BOOLEAN, TEXT)
//! - **Idempotent DDL** via `CREATE TABLE IF NOT EXISTS`
//! - **Fail-fast loading** with per-row failure attribution
//! - **Scoped integrity suspension** re-enabled on every exit path
//!
//! ## Example
//!
//! ```rust,no_run
//! use rest_mysql_migrate::{Config, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.yaml")?;
//!     let orchestrator = Orchestrator::connect(&config).await?;
//!     let report = orchestrator.run(&config.migration.tables).await;
//!     println!("Loaded {} rows", report.rows_loaded);
//!     orchestrator.close().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod dialect;
pub mod error;
pub mod inference;
pub mod orchestrator;
pub mod source;
pub mod target;
pub mod transfer;
pub mod transform;
pub mod typemap;

// Re-exports for convenient access
pub use config::{Config, MigrationConfig, SourceConfig, TableSpec, TargetConfig};
pub use crate::core::{
    ColumnDescriptor, ColumnType, Record, SourceApi, SourceValue, SqlExecutor, SqlParam,
    TableMigrationPlan,
};
pub use dialect::MysqlDialect;
pub use error::{MigrateError, Result};
pub use inference::{infer, infer_from_sample};
pub use orchestrator::{
    HealthCheckResult, Orchestrator, RunOptions, RunReport, TableMigrator, TableReport,
    TableStatus,
};
pub use source::RestSource;
pub use target::{DryRunExecutor, MysqlExecutor};
pub use transfer::{BatchLoader, LoadResult, TransferConfig};
pub use transform::{transform, DestinationRow};
pub use typemap::classify;
