//! rest-mysql-migrate CLI - schema-inferring migration from a REST data API into MySQL.

use clap::{Parser, Subcommand};
use rest_mysql_migrate::error::{EXIT_SOURCE_ERROR, EXIT_TARGET_ERROR, EXIT_TRANSFER_ERROR};
use rest_mysql_migrate::{
    Config, MigrateError, MysqlDialect, Orchestrator, RunReport, TableSpec, TableStatus,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "rest-mysql-migrate")]
#[command(about = "Schema-inferring migration from a REST data API into MySQL")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate the configured tables
    Run {
        /// Only migrate these tables, in this order (comma separated)
        #[arg(long, value_delimiter = ',')]
        tables: Option<Vec<String>>,

        /// Override rows per insert batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Dry run: extract and infer, log statements without writing
        #[arg(long)]
        dry_run: bool,

        /// Exit with a non-zero code if any table failed or was partial
        #[arg(long)]
        strict: bool,
    },

    /// Show the inferred schema and DDL for each table without writing
    Plan {
        /// Only plan these tables (comma separated)
        #[arg(long, value_delimiter = ',')]
        tables: Option<Vec<String>>,
    },

    /// Test source and target connections
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| MigrateError::Config(e.to_string()))?;

    let config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Run {
            tables,
            batch_size,
            dry_run,
            strict,
        } => {
            let tables = select_tables(&config, tables);

            let mut orchestrator = if dry_run {
                Orchestrator::dry_run(&config)?
            } else {
                Orchestrator::connect(&config).await?
            };
            if let Some(size) = batch_size {
                orchestrator = orchestrator.with_batch_size(size);
            }

            let report = orchestrator.run(&tables).await;
            orchestrator.close().await;

            if cli.output_json {
                println!("{}", report.to_json()?);
            } else {
                print_report(&report, dry_run);
            }

            if strict && !report.is_success() {
                return Ok(ExitCode::from(EXIT_TRANSFER_ERROR));
            }
        }

        Commands::Plan { tables } => {
            let tables = select_tables(&config, tables);
            let orchestrator = Orchestrator::dry_run(&config)?;
            let dialect = MysqlDialect::new();

            let mut plans = Vec::new();
            for outcome in orchestrator.plan_tables(&tables).await {
                match outcome.plan {
                    Ok(plan) => {
                        if !cli.output_json {
                            println!("-- {} ({} rows)", plan.table_name, plan.total_rows);
                            if plan.is_empty() {
                                println!("-- no rows or columns, table would be skipped\n");
                            } else {
                                println!("{};\n", dialect.create_table_if_not_exists(&plan));
                            }
                        }
                        plans.push(serde_json::json!({ "table": outcome.spec.name, "plan": plan }));
                    }
                    Err(e) => {
                        if !cli.output_json {
                            println!("-- {}: {}\n", outcome.spec.name, e);
                        }
                        plans.push(
                            serde_json::json!({ "table": outcome.spec.name, "error": e.to_string() }),
                        );
                    }
                }
            }

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&plans)?);
            }
        }

        Commands::HealthCheck => {
            let result = Orchestrator::check_config(&config).await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source ({}): {}",
                    result.source_type,
                    if result.source_connected { "OK" } else { "FAILED" }
                );
                if let Some(ref err) = result.source_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "  Target ({}): {}",
                    result.target_type,
                    if result.target_connected { "OK" } else { "FAILED" }
                );
                if let Some(ref err) = result.target_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if !result.source_connected {
                return Ok(ExitCode::from(EXIT_SOURCE_ERROR));
            }
            if !result.target_connected {
                return Ok(ExitCode::from(EXIT_TARGET_ERROR));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Resolve the table list: the configured list, or the named subset in the
/// given order. Names missing from the configuration are migrated unordered.
fn select_tables(config: &Config, names: Option<Vec<String>>) -> Vec<TableSpec> {
    let Some(names) = names else {
        return config.migration.tables.clone();
    };

    names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .map(|name| {
            config
                .migration
                .tables
                .iter()
                .find(|t| t.name == name)
                .cloned()
                .unwrap_or_else(|| TableSpec::new(name))
        })
        .collect()
}

fn print_report(report: &RunReport, dry_run: bool) {
    let status_msg = if dry_run {
        "Dry run completed!"
    } else {
        "Migration completed!"
    };
    println!("\n{}", status_msg);
    println!("  Run ID: {}", report.run_id);
    println!("  Duration: {:.2}s", report.duration_seconds);
    println!(
        "  Tables: {} migrated, {} partial, {} failed",
        report.tables_migrated, report.tables_partial, report.tables_failed
    );
    println!(
        "  Rows: {} loaded, {} failed",
        report.rows_loaded, report.rows_failed
    );
    for table in &report.tables {
        let status = match table.status() {
            TableStatus::Migrated => "OK",
            TableStatus::Partial => "PARTIAL",
            TableStatus::Failed => "FAILED",
        };
        println!(
            "    {:<8} {} ({}/{} rows)",
            status, table.table_name, table.rows_loaded, table.rows_extracted
        );
        if let Some(ref err) = table.error {
            println!("             {}", err);
        }
    }
    if report.fk_checks_disabled && !report.fk_checks_restored {
        println!("  WARNING: foreign key checks could not be re-enabled");
    }
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}
