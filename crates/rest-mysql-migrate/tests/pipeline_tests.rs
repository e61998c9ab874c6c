//! End-to-end pipeline tests over in-memory source and executor doubles.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rest_mysql_migrate::{
    BatchLoader, ColumnType, MigrateError, Orchestrator, Record, Result, RunOptions, SourceApi,
    SqlExecutor, SqlParam, TableSpec, TableStatus, TransferConfig,
};
use serde_json::json;

// =============================================================================
// Test doubles
// =============================================================================

/// Source API serving fixed tables.
#[derive(Default)]
struct MemorySource {
    tables: HashMap<String, Vec<Record>>,
    failing: HashSet<String>,
    reject_ordering: HashSet<String>,
    panicking: HashSet<String>,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl MemorySource {
    fn with_table(mut self, name: &str, rows: Vec<serde_json::Value>) -> Self {
        let rows = rows
            .into_iter()
            .map(|r| Record::from_json(r).unwrap())
            .collect();
        self.tables.insert(name.to_string(), rows);
        self
    }

    fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    fn rejecting_order(mut self, name: &str) -> Self {
        self.reject_ordering.insert(name.to_string());
        self
    }

    fn panicking(mut self, name: &str) -> Self {
        self.panicking.insert(name.to_string());
        self
    }

    fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceApi for MemorySource {
    async fn list_rows(&self, table: &str, order_by: Option<&str>) -> Result<Vec<Record>> {
        self.calls
            .lock()
            .unwrap()
            .push((table.to_string(), order_by.map(String::from)));

        if self.panicking.contains(table) {
            panic!("source double exploded on {}", table);
        }
        if self.failing.contains(table) {
            return Err(MigrateError::SourceStatus {
                table: table.to_string(),
                status: 404,
                body: "relation does not exist".into(),
            });
        }
        if order_by.is_some() && self.reject_ordering.contains(table) {
            return Err(MigrateError::SourceStatus {
                table: table.to_string(),
                status: 400,
                body: "column does not exist".into(),
            });
        }
        Ok(self.tables.get(table).cloned().unwrap_or_default())
    }

    fn source_type(&self) -> &str {
        "memory"
    }
}

/// Executor that records statements and enforces primary keys on inserts.
#[derive(Default)]
struct RecordingExecutor {
    log: Mutex<Vec<String>>,
    keys: Mutex<HashMap<String, HashSet<String>>>,
    fail_on_id: Option<String>,
    fail_ddl: bool,
}

impl RecordingExecutor {
    fn failing_on(id: &str) -> Self {
        Self {
            fail_on_id: Some(id.to_string()),
            ..Default::default()
        }
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn inserts(&self) -> usize {
        self.log()
            .iter()
            .filter(|s| s.starts_with("INSERT"))
            .count()
    }

    fn ddl(&self) -> Vec<String> {
        self.log()
            .into_iter()
            .filter(|s| s.starts_with("CREATE TABLE"))
            .collect()
    }
}

fn table_of(insert: &str) -> String {
    insert
        .trim_start_matches("INSERT INTO `")
        .split('`')
        .next()
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl SqlExecutor for RecordingExecutor {
    async fn execute(&self, statement: &str, params: Vec<SqlParam>) -> Result<u64> {
        self.log.lock().unwrap().push(statement.to_string());

        let id = match params.first() {
            Some(SqlParam::Text(id)) => id.clone(),
            _ => String::new(),
        };
        if self.fail_on_id.as_deref() == Some(id.as_str()) {
            return Err(MigrateError::transfer(table_of(statement), "constraint violation"));
        }

        let mut keys = self.keys.lock().unwrap();
        if !keys.entry(table_of(statement)).or_default().insert(id.clone()) {
            return Err(MigrateError::transfer(
                table_of(statement),
                format!("Duplicate entry '{}' for key 'PRIMARY'", id),
            ));
        }
        Ok(1)
    }

    async fn execute_raw(&self, statement: &str) -> Result<()> {
        self.log.lock().unwrap().push(statement.to_string());
        if self.fail_ddl && statement.starts_with("CREATE TABLE") {
            return Err(MigrateError::transfer("ddl", "syntax error"));
        }
        Ok(())
    }

    fn db_type(&self) -> &str {
        "recording"
    }
}

fn orchestrator(source: Arc<MemorySource>, executor: Arc<RecordingExecutor>) -> Orchestrator {
    Orchestrator::new(source, executor, RunOptions::default())
}

fn clients() -> Vec<serde_json::Value> {
    vec![
        json!({"id": "c1", "name": "Acme", "active": true, "meta": {"tier": 1}}),
        json!({"id": "c2", "name": "Globex", "active": false, "meta": null}),
        json!({"id": "c3", "name": null, "active": true, "meta": {"tier": 2}}),
    ]
}

// =============================================================================
// Batch loader
// =============================================================================

#[tokio::test]
async fn test_empty_rows_issue_no_statements() {
    let executor = Arc::new(RecordingExecutor::default());
    let source = Arc::new(MemorySource::default().with_table("empty", vec![]));

    let report = orchestrator(source, executor.clone())
        .run(&[TableSpec::new("empty")])
        .await;

    let table = &report.tables[0];
    assert_eq!(
        (table.rows_extracted, table.rows_loaded, table.rows_failed),
        (0, 0, 0)
    );
    assert!(table.error.is_none());
    assert!(executor.ddl().is_empty());
    assert_eq!(executor.inserts(), 0);
}

#[tokio::test]
async fn test_failing_row_stops_table() {
    let executor = Arc::new(RecordingExecutor::failing_on("c2"));
    let source = Arc::new(MemorySource::default().with_table("clients", clients()));

    let report = orchestrator(source, executor.clone())
        .run(&[TableSpec::new("clients")])
        .await;

    let table = &report.tables[0];
    assert_eq!(table.rows_extracted, 3);
    assert_eq!(table.rows_loaded, 1);
    assert_eq!(table.rows_failed, 1);
    assert_eq!(table.rows_skipped, 1);
    assert!(table.error.as_deref().unwrap().contains("row 2 (id=c2)"));
    assert_eq!(table.status(), TableStatus::Partial);

    // Row 3 was never attempted.
    assert_eq!(executor.inserts(), 2);
}

#[tokio::test]
async fn test_failure_in_later_batch_keeps_earlier_batches() {
    let rows: Vec<_> = (1..=5).map(|i| json!({"id": format!("r{}", i), "n": i})).collect();
    let executor = Arc::new(RecordingExecutor::failing_on("r4"));
    let loader = BatchLoader::new(executor.clone(), TransferConfig { batch_size: 2 });

    let records: Vec<Record> = rows.into_iter().map(|r| Record::from_json(r).unwrap()).collect();
    let plan = rest_mysql_migrate::infer("numbers", &records[0]);
    let result = loader.load(&plan, &records).await.unwrap();

    assert_eq!(result.loaded, 3);
    assert_eq!(result.failed, 1);
    assert_eq!(result.skipped, 1);
    assert_eq!(result.batches_completed, 1);
}

#[tokio::test]
async fn test_schema_creation_error_is_reported() {
    let executor = Arc::new(RecordingExecutor {
        fail_ddl: true,
        ..Default::default()
    });
    let source = Arc::new(MemorySource::default().with_table("clients", clients()));

    let report = orchestrator(source, executor.clone())
        .run(&[TableSpec::new("clients")])
        .await;

    let table = &report.tables[0];
    assert_eq!(table.status(), TableStatus::Failed);
    assert!(table
        .error
        .as_deref()
        .unwrap()
        .contains("Schema creation failed for table clients"));
    assert_eq!(executor.inserts(), 0);
}

#[tokio::test]
async fn test_rerun_reports_duplicates_without_raising() {
    let executor = Arc::new(RecordingExecutor::default());
    let source = Arc::new(MemorySource::default().with_table("clients", clients()));
    let orchestrator = orchestrator(source, executor.clone());

    let first = orchestrator.run(&[TableSpec::new("clients")]).await;
    assert!(first.is_success());
    assert_eq!(first.rows_loaded, 3);

    let second = orchestrator.run(&[TableSpec::new("clients")]).await;
    let table = &second.tables[0];
    assert_eq!(table.rows_loaded, 0);
    assert_eq!(table.rows_failed, 1);
    assert_eq!(table.rows_skipped, 2);
    assert!(table.error.as_deref().unwrap().contains("Duplicate entry 'c1'"));

    // DDL ran both times without error.
    assert_eq!(executor.ddl().len(), 2);
    assert!(second.fk_checks_restored);
}

// =============================================================================
// Table migrator
// =============================================================================

#[tokio::test]
async fn test_rejected_ordering_falls_back_to_unordered() {
    let executor = Arc::new(RecordingExecutor::default());
    let source = Arc::new(
        MemorySource::default()
            .with_table("clients", clients())
            .rejecting_order("clients"),
    );

    let report = orchestrator(source.clone(), executor)
        .run(&[TableSpec::ordered("clients", "created_at")])
        .await;

    assert_eq!(report.tables[0].rows_loaded, 3);
    assert_eq!(
        source.calls(),
        vec![
            ("clients".to_string(), Some("created_at".to_string())),
            ("clients".to_string(), None),
        ]
    );
}

#[tokio::test]
async fn test_inferred_schema_drives_ddl() {
    let executor = Arc::new(RecordingExecutor::default());
    let source = Arc::new(MemorySource::default().with_table("clients", clients()));

    orchestrator(source, executor.clone())
        .run(&[TableSpec::new("clients")])
        .await;

    let ddl = executor.ddl();
    assert_eq!(ddl.len(), 1);
    assert!(ddl[0].contains("`id` VARCHAR(36) NOT NULL"));
    assert!(ddl[0].contains("`name` TEXT"));
    assert!(ddl[0].contains("`active` BOOLEAN"));
    assert!(ddl[0].contains("`meta` TEXT"));
}

#[tokio::test]
async fn test_plan_tables_does_not_write() {
    let executor = Arc::new(RecordingExecutor::default());
    let source = Arc::new(MemorySource::default().with_table("clients", clients()));

    let outcomes = orchestrator(source, executor.clone())
        .plan_tables(&[TableSpec::new("clients")])
        .await;

    let plan = outcomes[0].plan.as_ref().unwrap();
    assert_eq!(plan.total_rows, 3);
    assert_eq!(plan.column_names(), vec!["id", "name", "active", "meta"]);
    assert_eq!(plan.columns[2].inferred_type, ColumnType::Boolean);
    assert!(executor.log().is_empty());
}

// =============================================================================
// Orchestrator
// =============================================================================

#[tokio::test]
async fn test_failed_extraction_does_not_stop_run() {
    let executor = Arc::new(RecordingExecutor::default());
    let source = Arc::new(
        MemorySource::default()
            .failing("missing")
            .with_table("clients", clients()),
    );

    let report = orchestrator(source, executor.clone())
        .run(&[TableSpec::new("missing"), TableSpec::new("clients")])
        .await;

    assert_eq!(report.tables.len(), 2);
    assert_eq!(report.tables[0].rows_extracted, 0);
    assert_eq!(report.tables[0].status(), TableStatus::Failed);
    assert!(report.tables[0].error.as_deref().unwrap().contains("HTTP 404"));
    assert_eq!(report.tables[1].rows_loaded, 3);
    assert_eq!(report.tables_migrated, 1);
    assert_eq!(report.tables_failed, 1);

    let log = executor.log();
    assert_eq!(log.first().map(String::as_str), Some("SET FOREIGN_KEY_CHECKS = 0"));
    assert_eq!(log.last().map(String::as_str), Some("SET FOREIGN_KEY_CHECKS = 1"));
    assert!(report.fk_checks_disabled);
    assert!(report.fk_checks_restored);
}

#[tokio::test]
async fn test_panic_in_table_is_contained() {
    let executor = Arc::new(RecordingExecutor::default());
    let source = Arc::new(
        MemorySource::default()
            .panicking("broken")
            .with_table("clients", clients()),
    );

    let report = orchestrator(source, executor.clone())
        .run(&[TableSpec::new("broken"), TableSpec::new("clients")])
        .await;

    assert!(report.tables[0]
        .error
        .as_deref()
        .unwrap()
        .contains("source double exploded on broken"));
    assert_eq!(report.tables[1].rows_loaded, 3);
    assert_eq!(
        executor.log().last().map(String::as_str),
        Some("SET FOREIGN_KEY_CHECKS = 1")
    );
}

#[tokio::test]
async fn test_tables_run_in_caller_order() {
    let executor = Arc::new(RecordingExecutor::default());
    let source = Arc::new(
        MemorySource::default()
            .with_table("orders", vec![json!({"id": "o1", "client_id": "c1", "total": 19.99})])
            .with_table("clients", clients()),
    );

    let report = orchestrator(source, executor.clone())
        .run(&[TableSpec::new("orders"), TableSpec::new("clients")])
        .await;

    let names: Vec<&str> = report.tables.iter().map(|t| t.table_name.as_str()).collect();
    assert_eq!(names, vec!["orders", "clients"]);

    let ddl = executor.ddl();
    assert!(ddl[0].contains("`orders`"));
    assert!(ddl[0].contains("`total` DECIMAL(15,2)"));
    assert!(ddl[1].contains("`clients`"));
}

#[tokio::test]
async fn test_fk_checks_left_alone_when_disabled_in_options() {
    let executor = Arc::new(RecordingExecutor::default());
    let source = Arc::new(MemorySource::default().with_table("clients", clients()));
    let options = RunOptions {
        disable_foreign_key_checks: false,
        ..RunOptions::default()
    };

    let report = Orchestrator::new(source, executor.clone(), options)
        .run(&[TableSpec::new("clients")])
        .await;

    assert!(!report.fk_checks_disabled);
    assert!(!executor
        .log()
        .iter()
        .any(|s| s.starts_with("SET FOREIGN_KEY_CHECKS")));
}

#[tokio::test]
async fn test_sampling_unions_columns() {
    let executor = Arc::new(RecordingExecutor::default());
    let source = Arc::new(MemorySource::default().with_table(
        "contacts",
        vec![
            json!({"id": "1", "email": "a@example.com"}),
            json!({"id": "2", "email": null, "phone": "555"}),
        ],
    ));
    let options = RunOptions {
        sample_rows: 2,
        ..RunOptions::default()
    };

    let report = Orchestrator::new(source, executor.clone(), options)
        .run(&[TableSpec::new("contacts")])
        .await;

    assert_eq!(report.tables[0].rows_loaded, 2);
    assert!(executor.ddl()[0].contains("`phone` TEXT"));
}

#[tokio::test]
async fn test_health_check() {
    let executor = Arc::new(RecordingExecutor::default());
    let source = Arc::new(MemorySource::default());

    let result = orchestrator(source, executor.clone()).health_check().await;

    assert!(result.healthy);
    assert_eq!(result.source_type, "memory");
    assert_eq!(result.target_type, "recording");
    assert_eq!(executor.log(), vec!["SELECT 1"]);
}
