//! Error types for the migration library.

use thiserror::Error;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source data API transport error
    #[error("Source API error: {0}")]
    Source(#[from] reqwest::Error),

    /// Source data API answered with a non-success status
    #[error("Source API rejected request for {table} (HTTP {status}): {body}")]
    SourceStatus {
        table: String,
        status: u16,
        body: String,
    },

    /// Target database connection or statement error
    #[error("Target database error: {0}")]
    Target(#[from] mysql_async::Error),

    /// Connection pool error with context
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// CREATE TABLE rejected by the target
    #[error("Schema creation failed for table {table}: {message}")]
    SchemaCreation { table: String, message: String },

    /// Data transfer failed for a specific table
    #[error("Transfer failed for table {table}: {message}")]
    Transfer { table: String, message: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Exit code for configuration errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for source API errors.
pub const EXIT_SOURCE_ERROR: u8 = 2;
/// Exit code for target database errors.
pub const EXIT_TARGET_ERROR: u8 = 3;
/// Exit code for transfer failures (also used by `run --strict`).
pub const EXIT_TRANSFER_ERROR: u8 = 4;
/// Exit code for IO errors.
pub const EXIT_IO_ERROR: u8 = 7;

impl MigrateError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl ToString, context: impl Into<String>) -> Self {
        MigrateError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Transfer error
    pub fn transfer(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Transfer {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a SchemaCreation error
    pub fn schema_creation(table: impl Into<String>, message: impl ToString) -> Self {
        MigrateError::SchemaCreation {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) | MigrateError::Json(_) => {
                EXIT_CONFIG_ERROR
            }
            MigrateError::Source(_) | MigrateError::SourceStatus { .. } => EXIT_SOURCE_ERROR,
            MigrateError::Target(_) | MigrateError::Pool { .. } => EXIT_TARGET_ERROR,
            MigrateError::SchemaCreation { .. } | MigrateError::Transfer { .. } => {
                EXIT_TRANSFER_ERROR
            }
            MigrateError::Io(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
