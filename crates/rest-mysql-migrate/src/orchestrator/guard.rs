//! Scoped suspension of destination foreign key checks.

use std::sync::Arc;

use tracing::{error, info};

use crate::core::traits::SqlExecutor;
use crate::dialect::MysqlDialect;
use crate::error::Result;

/// Holds foreign key checks disabled on the destination session.
///
/// Call [`IntegrityChecksGuard::release`] on every exit path. If the guard is
/// dropped without being released (for example because the run future was
/// cancelled), the re-enable statement is spawned on the current runtime.
pub struct IntegrityChecksGuard {
    executor: Arc<dyn SqlExecutor>,
    dialect: MysqlDialect,
    released: bool,
}

impl IntegrityChecksGuard {
    /// Disable foreign key checks for the session.
    pub async fn acquire(executor: Arc<dyn SqlExecutor>) -> Result<Self> {
        let dialect = MysqlDialect::new();
        executor
            .execute_raw(dialect.foreign_key_checks(false))
            .await?;
        info!("Foreign key checks disabled for this run");

        Ok(Self {
            executor,
            dialect,
            released: false,
        })
    }

    /// Re-enable foreign key checks.
    ///
    /// The guard only counts as released once the statement has returned, so
    /// dropping this future mid-flight still triggers the `Drop` fallback.
    pub async fn release(mut self) -> Result<()> {
        let result = self
            .executor
            .execute_raw(self.dialect.foreign_key_checks(true))
            .await;
        self.released = true;
        result?;
        info!("Foreign key checks re-enabled");
        Ok(())
    }
}

impl Drop for IntegrityChecksGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        error!("Integrity guard dropped while foreign key checks were disabled, re-enabling");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let executor = self.executor.clone();
                let statement = self.dialect.foreign_key_checks(true);
                handle.spawn(async move {
                    if let Err(e) = executor.execute_raw(statement).await {
                        error!("Failed to re-enable foreign key checks: {}", e);
                    }
                });
            }
            Err(_) => {
                error!("No runtime available; foreign key checks remain disabled on this session");
            }
        }
    }
}
