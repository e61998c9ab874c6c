//! Configuration validation.

use std::collections::HashSet;

use super::Config;
use crate::error::{MigrateError, Result};

const SSL_MODES: &[&str] = &[
    "disable",
    "prefer",
    "require",
    "verify-ca",
    "verify_ca",
    "verify-full",
    "verify_identity",
];

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    if config.source.url.is_empty() {
        return Err(MigrateError::Config("source.url is required".into()));
    }
    if !config.source.url.starts_with("http://") && !config.source.url.starts_with("https://") {
        return Err(MigrateError::Config(format!(
            "source.url must start with http:// or https://, got '{}'",
            config.source.url
        )));
    }
    if config.source.timeout_seconds == 0 {
        return Err(MigrateError::Config(
            "source.timeout_seconds must be at least 1".into(),
        ));
    }
    if let Some(0) = config.source.page_size {
        return Err(MigrateError::Config(
            "source.page_size must be at least 1".into(),
        ));
    }

    // Target validation
    if config.target.host.is_empty() {
        return Err(MigrateError::Config("target.host is required".into()));
    }
    if config.target.database.is_empty() {
        return Err(MigrateError::Config("target.database is required".into()));
    }
    if config.target.user.is_empty() {
        return Err(MigrateError::Config("target.user is required".into()));
    }
    if !SSL_MODES.contains(&config.target.ssl_mode.to_lowercase().as_str()) {
        return Err(MigrateError::Config(format!(
            "target.ssl_mode must be one of {}, got '{}'",
            SSL_MODES.join(", "),
            config.target.ssl_mode
        )));
    }

    // Migration validation
    if config.migration.batch_size == 0 {
        return Err(MigrateError::Config(
            "migration.batch_size must be at least 1".into(),
        ));
    }
    if config.migration.sample_rows == 0 {
        return Err(MigrateError::Config(
            "migration.sample_rows must be at least 1".into(),
        ));
    }
    if config.migration.tables.is_empty() {
        return Err(MigrateError::Config(
            "migration.tables must list at least one table".into(),
        ));
    }

    let mut seen = HashSet::new();
    for table in &config.migration.tables {
        if table.name.trim().is_empty() {
            return Err(MigrateError::Config(
                "migration.tables entries must have a name".into(),
            ));
        }
        if !seen.insert(table.name.as_str()) {
            return Err(MigrateError::Config(format!(
                "migration.tables lists '{}' more than once",
                table.name
            )));
        }
        if let Some(order_by) = &table.order_by {
            if order_by.trim().is_empty() {
                return Err(MigrateError::Config(format!(
                    "migration.tables '{}' has an empty order_by",
                    table.name
                )));
            }
        }
    }

    Ok(())
}
