//! Core abstractions shared by every pipeline stage.
//!
//! - [`schema`]: column descriptors and table migration plans
//! - [`value`]: source values, records and bound parameters
//! - [`traits`]: the source API and destination executor seams

pub mod schema;
pub mod traits;
pub mod value;

// Re-export commonly used types for convenience
pub use schema::{ColumnDescriptor, ColumnType, TableMigrationPlan, PRIMARY_KEY_COLUMN};
pub use traits::{SourceApi, SqlExecutor};
pub use value::{Record, SourceValue, SqlParam};
