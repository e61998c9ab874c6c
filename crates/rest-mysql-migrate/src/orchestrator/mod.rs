//! Migration orchestrator - main workflow coordinator.
//!
//! A run moves through [`RunPhase`]s: foreign key checks are disabled, every
//! requested table is migrated in order, and checks are re-enabled before the
//! report is returned, whatever happened to the individual tables.

mod guard;
mod table;

pub use guard::IntegrityChecksGuard;
pub use table::{TableMigrator, TableReport, TableStatus};

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::{Config, MigrationConfig, TableSpec};
use crate::core::schema::TableMigrationPlan;
use crate::core::traits::{SourceApi, SqlExecutor};
use crate::error::Result;
use crate::source::RestSource;
use crate::target::{DryRunExecutor, MysqlExecutor};
use crate::transfer::{BatchLoader, TransferConfig};

/// Tunables for a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub batch_size: usize,
    pub sample_rows: usize,
    pub disable_foreign_key_checks: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            sample_rows: 1,
            disable_foreign_key_checks: true,
        }
    }
}

impl From<&MigrationConfig> for RunOptions {
    fn from(config: &MigrationConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            sample_rows: config.sample_rows,
            disable_foreign_key_checks: config.disable_foreign_key_checks,
        }
    }
}

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    NotStarted,
    FkChecksDisabled,
    /// Migrating the table at this index.
    Migrating(usize),
    FkChecksEnabled,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::NotStarted => write!(f, "not started"),
            RunPhase::FkChecksDisabled => write!(f, "foreign key checks disabled"),
            RunPhase::Migrating(i) => write!(f, "migrating table #{}", i + 1),
            RunPhase::FkChecksEnabled => write!(f, "foreign key checks enabled"),
            RunPhase::Done => write!(f, "done"),
        }
    }
}

/// Result of a migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run identifier.
    pub run_id: String,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Per-table reports in run order.
    pub tables: Vec<TableReport>,

    /// Tables migrated without error.
    pub tables_migrated: usize,

    /// Tables that stopped after loading some rows.
    pub tables_partial: usize,

    /// Tables that loaded nothing because of an error.
    pub tables_failed: usize,

    /// Total rows inserted.
    pub rows_loaded: usize,

    /// Total rows whose insert failed.
    pub rows_failed: usize,

    /// Whether foreign key checks were suspended for the run.
    pub fk_checks_disabled: bool,

    /// Whether the suspension was lifted again. Always true when checks were
    /// never disabled.
    pub fk_checks_restored: bool,
}

impl RunReport {
    fn new(run_id: String, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            started_at,
            completed_at: started_at,
            duration_seconds: 0.0,
            tables: Vec::new(),
            tables_migrated: 0,
            tables_partial: 0,
            tables_failed: 0,
            rows_loaded: 0,
            rows_failed: 0,
            fk_checks_disabled: false,
            fk_checks_restored: true,
        }
    }

    fn push(&mut self, report: TableReport) {
        match report.status() {
            TableStatus::Migrated => self.tables_migrated += 1,
            TableStatus::Partial => self.tables_partial += 1,
            TableStatus::Failed => self.tables_failed += 1,
        }
        self.rows_loaded += report.rows_loaded;
        self.rows_failed += report.rows_failed;
        self.tables.push(report);
    }

    /// True when every table migrated without error.
    pub fn is_success(&self) -> bool {
        self.tables_partial == 0 && self.tables_failed == 0
    }

    /// Names of tables that did not fully migrate.
    pub fn unsuccessful_tables(&self) -> Vec<&str> {
        self.tables
            .iter()
            .filter(|t| t.status() != TableStatus::Migrated)
            .map(|t| t.table_name.as_str())
            .collect()
    }

    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Connectivity check result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub healthy: bool,
    pub source_type: String,
    pub source_connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_error: Option<String>,
    pub target_type: String,
    pub target_connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_error: Option<String>,
}

impl HealthCheckResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Inference result for one table, produced by [`Orchestrator::plan_tables`].
#[derive(Debug)]
pub struct TablePlanOutcome {
    pub spec: TableSpec,
    pub plan: Result<TableMigrationPlan>,
}

/// Migration orchestrator.
pub struct Orchestrator {
    source: Arc<dyn SourceApi>,
    executor: Arc<dyn SqlExecutor>,
    options: RunOptions,
}

impl Orchestrator {
    /// Create an orchestrator over explicit collaborators.
    pub fn new(
        source: Arc<dyn SourceApi>,
        executor: Arc<dyn SqlExecutor>,
        options: RunOptions,
    ) -> Self {
        Self {
            source,
            executor,
            options,
        }
    }

    /// Connect to the configured source API and MySQL target.
    pub async fn connect(config: &Config) -> Result<Self> {
        let source = RestSource::new(&config.source)?;
        let executor = MysqlExecutor::connect(&config.target).await?;
        Ok(Self::new(
            Arc::new(source),
            Arc::new(executor),
            RunOptions::from(&config.migration),
        ))
    }

    /// Connect to the source only; destination statements are logged.
    pub fn dry_run(config: &Config) -> Result<Self> {
        let source = RestSource::new(&config.source)?;
        Ok(Self::new(
            Arc::new(source),
            Arc::new(DryRunExecutor::new()),
            RunOptions::from(&config.migration),
        ))
    }

    /// Override the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.options.batch_size = batch_size.max(1);
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    fn table_migrator(&self) -> TableMigrator {
        let loader = BatchLoader::new(
            self.executor.clone(),
            TransferConfig {
                batch_size: self.options.batch_size,
            },
        );
        TableMigrator::new(self.source.clone(), loader, self.options.sample_rows)
    }

    /// Migrate `tables` in order.
    ///
    /// Per-table problems are recorded in the report; this never fails.
    pub async fn run(&self, tables: &[TableSpec]) -> RunReport {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let mut report = RunReport::new(run_id, started_at);
        let mut phase = RunPhase::NotStarted;

        info!(
            "Starting migration run {} ({} tables, batch size {}, target {})",
            report.run_id,
            tables.len(),
            self.options.batch_size,
            self.executor.db_type()
        );

        let guard = if self.options.disable_foreign_key_checks {
            match IntegrityChecksGuard::acquire(self.executor.clone()).await {
                Ok(guard) => {
                    transition(&mut phase, RunPhase::FkChecksDisabled);
                    report.fk_checks_disabled = true;
                    Some(guard)
                }
                Err(e) => {
                    warn!(
                        "Could not disable foreign key checks, continuing with checks enabled: {}",
                        e
                    );
                    None
                }
            }
        } else {
            debug!("Foreign key checks left enabled by configuration");
            None
        };

        let migrator = self.table_migrator();
        for (i, spec) in tables.iter().enumerate() {
            transition(&mut phase, RunPhase::Migrating(i));
            let table_report = migrator
                .migrate_table(&spec.name, spec.order_by.as_deref())
                .await;
            report.push(table_report);
        }

        if let Some(guard) = guard {
            if let Err(e) = guard.release().await {
                error!("Failed to re-enable foreign key checks: {}", e);
                report.fk_checks_restored = false;
            }
        }
        transition(&mut phase, RunPhase::FkChecksEnabled);

        let completed_at = Utc::now();
        report.completed_at = completed_at;
        report.duration_seconds = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;
        transition(&mut phase, RunPhase::Done);

        info!(
            "Migration {}: {} migrated, {} partial, {} failed; {} rows loaded, {} failed in {:.1}s",
            report.run_id,
            report.tables_migrated,
            report.tables_partial,
            report.tables_failed,
            report.rows_loaded,
            report.rows_failed,
            report.duration_seconds
        );
        if !report.is_success() {
            warn!(
                "Tables not fully migrated: {}",
                report.unsuccessful_tables().join(", ")
            );
        }

        report
    }

    /// Extract and infer each table without writing to the target.
    pub async fn plan_tables(&self, tables: &[TableSpec]) -> Vec<TablePlanOutcome> {
        let migrator = self.table_migrator();
        let mut outcomes = Vec::with_capacity(tables.len());
        for spec in tables {
            let plan = migrator.plan(&spec.name, spec.order_by.as_deref()).await;
            outcomes.push(TablePlanOutcome {
                spec: spec.clone(),
                plan,
            });
        }
        outcomes
    }

    /// Probe source and target connectivity.
    pub async fn health_check(&self) -> HealthCheckResult {
        let source_error = self.source.ping().await.err().map(|e| e.to_string());
        let target_error = self.executor.ping().await.err().map(|e| e.to_string());

        let result = HealthCheckResult {
            healthy: source_error.is_none() && target_error.is_none(),
            source_type: self.source.source_type().to_string(),
            source_connected: source_error.is_none(),
            source_error,
            target_type: self.executor.db_type().to_string(),
            target_connected: target_error.is_none(),
            target_error,
        };

        if result.healthy {
            info!("Health check passed");
        } else {
            warn!("Health check failed");
        }
        result
    }

    /// Health check straight from configuration. A target that cannot be
    /// reached is reported in the result rather than returned as an error.
    pub async fn check_config(config: &Config) -> Result<HealthCheckResult> {
        let source: Arc<dyn SourceApi> = Arc::new(RestSource::new(&config.source)?);

        match MysqlExecutor::connect(&config.target).await {
            Ok(executor) => {
                let orchestrator =
                    Self::new(source, Arc::new(executor), RunOptions::from(&config.migration));
                let result = orchestrator.health_check().await;
                orchestrator.close().await;
                Ok(result)
            }
            Err(target_error) => {
                warn!("Target connection failed: {}", target_error);
                let source_error = source.ping().await.err().map(|e| e.to_string());
                Ok(HealthCheckResult {
                    healthy: false,
                    source_type: source.source_type().to_string(),
                    source_connected: source_error.is_none(),
                    source_error,
                    target_type: "mysql".to_string(),
                    target_connected: false,
                    target_error: Some(target_error.to_string()),
                })
            }
        }
    }

    /// Close the target session.
    pub async fn close(&self) {
        self.executor.close().await;
    }
}

fn transition(phase: &mut RunPhase, next: RunPhase) {
    debug!("Run phase: {} -> {}", phase, next);
    *phase = next;
}
