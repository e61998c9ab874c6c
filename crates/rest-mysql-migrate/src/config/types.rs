//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source data API configuration.
    pub source: SourceConfig,

    /// Target database configuration (MySQL).
    pub target: TargetConfig,

    /// Migration behavior configuration.
    pub migration: MigrationConfig,
}

/// Source data API configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the data API (e.g. `https://project.example.co`).
    pub url: String,

    /// API key, sent both as `apikey` header and bearer token.
    #[serde(default)]
    pub api_key: String,

    /// Schema exposed by the API. Sent as `Accept-Profile` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Per-request timeout in seconds (default: 60).
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Rows per page. When unset each table is fetched with one request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .field("schema", &self.schema)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("page_size", &self.page_size)
            .finish()
    }
}

/// Target database (MySQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 3306).
    #[serde(default = "default_mysql_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// SSL mode (default: "prefer").
    #[serde(default = "default_prefer")]
    pub ssl_mode: String,
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

/// Migration behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Rows per insert batch (default: 100).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Rows inspected when inferring a table schema (default: 1).
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,

    /// Suspend foreign key checks for the duration of the run (default: true).
    #[serde(default = "default_true")]
    pub disable_foreign_key_checks: bool,

    /// Tables to migrate, in the order they are migrated.
    #[serde(default)]
    pub tables: Vec<TableSpec>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            sample_rows: default_sample_rows(),
            disable_foreign_key_checks: true,
            tables: Vec::new(),
        }
    }
}

/// One entry of the table list: a table name and an optional ordering column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Table name, identical in source and target.
    pub name: String,

    /// Column to order extraction by, when the source supports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
}

impl TableSpec {
    /// Table without ordering.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order_by: None,
        }
    }

    /// Table ordered by the given column.
    pub fn ordered(name: impl Into<String>, order_by: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order_by: Some(order_by.into()),
        }
    }
}

// Default value functions for serde
fn default_timeout_seconds() -> u64 {
    60
}

fn default_mysql_port() -> u16 {
    3306
}

fn default_prefer() -> String {
    "prefer".to_string()
}

fn default_batch_size() -> usize {
    100
}

fn default_sample_rows() -> usize {
    1
}

fn default_true() -> bool {
    true
}
