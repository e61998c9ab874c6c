//! Destination database access.
//!
//! [`MysqlExecutor`] holds a single MySQL session for the whole run, so
//! session settings like `FOREIGN_KEY_CHECKS` stay in effect for every
//! statement. [`DryRunExecutor`] records statements instead of running them.

mod dry_run;

pub use dry_run::{DryRunExecutor, RecordedStatement};

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder, SslOpts};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::TargetConfig;
use crate::core::traits::SqlExecutor;
use crate::core::value::SqlParam;
use crate::error::{MigrateError, Result};

/// MySQL executor over one dedicated connection.
pub struct MysqlExecutor {
    conn: Mutex<Option<Conn>>,
    database: String,
}

impl MysqlExecutor {
    /// Open the destination session.
    pub async fn connect(config: &TargetConfig) -> Result<Self> {
        let ssl_opts = match config.ssl_mode.to_lowercase().as_str() {
            "disable" => {
                warn!("MySQL TLS is disabled. Credentials will be transmitted in plaintext.");
                None
            }
            "prefer" | "require" => Some(SslOpts::default().with_danger_accept_invalid_certs(true)),
            "verify-ca" | "verify_ca" | "verify-full" | "verify_identity" => {
                Some(SslOpts::default())
            }
            _ => {
                warn!(
                    "Unknown ssl_mode '{}', defaulting to Preferred",
                    config.ssl_mode
                );
                Some(SslOpts::default().with_danger_accept_invalid_certs(true))
            }
        };

        let mut builder = OptsBuilder::default()
            .ip_or_hostname(&config.host)
            .tcp_port(config.port)
            .db_name(Some(&config.database))
            .user(Some(&config.user))
            .pass(Some(&config.password))
            // Use utf8mb4 for full Unicode support
            .init(vec!["SET NAMES utf8mb4"]);

        if let Some(ssl) = ssl_opts {
            builder = builder.ssl_opts(ssl);
        }

        let opts: Opts = builder.into();
        let mut conn = Conn::new(opts)
            .await
            .map_err(|e| MigrateError::pool(e, "connecting to MySQL target"))?;

        conn.query_drop("SELECT 1")
            .await
            .map_err(|e| MigrateError::pool(e, "testing MySQL target connection"))?;

        info!(
            "Connected to MySQL target: {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            database: config.database.clone(),
        })
    }
}

#[async_trait]
impl SqlExecutor for MysqlExecutor {
    async fn execute(&self, statement: &str, params: Vec<SqlParam>) -> Result<u64> {
        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| MigrateError::pool("connection closed", "executing statement"))?;

        let values: Vec<mysql_async::Value> = params.iter().map(sql_param_to_mysql).collect();
        conn.exec_drop(statement, values).await?;
        Ok(conn.affected_rows())
    }

    async fn execute_raw(&self, statement: &str) -> Result<()> {
        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| MigrateError::pool("connection closed", "executing statement"))?;

        conn.query_drop(statement).await?;
        Ok(())
    }

    async fn close(&self) {
        if let Some(conn) = self.conn.lock().await.take() {
            if let Err(e) = conn.disconnect().await {
                debug!("Error while disconnecting from {}: {}", self.database, e);
            }
        }
    }

    fn db_type(&self) -> &str {
        "mysql"
    }
}

/// Convert SqlParam to mysql_async::Value.
fn sql_param_to_mysql(param: &SqlParam) -> mysql_async::Value {
    match param {
        SqlParam::Null => mysql_async::Value::NULL,
        SqlParam::Bool(b) => mysql_async::Value::from(*b),
        SqlParam::Int(i) => mysql_async::Value::from(*i),
        SqlParam::Text(s) => mysql_async::Value::from(s.as_str()),
    }
}
