//! sqlbridge - command-line entry point.
//!
//! Runs a single statement against PostgreSQL, MySQL or SQLite and prints the
//! result as JSON on stdout.

use clap::Parser;
use sqlbridge::config::{Cli, Command, parse_cli_param};
use sqlbridge::{ConnectionManager, Context, DbError, DbResult, Executor, QueryParam};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr so stdout stays parseable.
fn init_tracing(log_level: &str, json_logs: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn run(cli: &Cli, manager: &ConnectionManager) -> DbResult<serde_json::Value> {
    let ctx = match cli.timeout_duration() {
        Some(timeout) => Context::background().with_timeout(timeout),
        None => Context::background(),
    };

    match &cli.command {
        Command::Query { sql, args } => {
            let args: Vec<QueryParam> = args.iter().map(|a| parse_cli_param(a)).collect();
            let db = manager.single_executor();
            let sql = db.rebind(sql);
            let rows = db.query(&ctx, &sql, &args).await?;
            Ok(serde_json::Value::Array(
                rows.map(|row| serde_json::Value::Object(row.to_json_map()))
                    .collect(),
            ))
        }
        Command::Exec {
            sql,
            args,
            rollback,
        } => {
            let args: Vec<QueryParam> = args.iter().map(|a| parse_cli_param(a)).collect();
            let result = if *rollback {
                let tx = manager.transaction();
                let sql = tx.rebind(sql);
                tx.begin(&ctx).await?;
                let result = tx.exec(&ctx, &sql, &args).await;
                tx.rollback_and_close(&ctx).await?;
                info!(transaction_id = tx.id(), "Rolled back");
                result?
            } else {
                let db = manager.single_executor();
                let sql = db.rebind(sql);
                db.exec(&ctx, &sql, &args).await?
            };
            Ok(serde_json::to_value(result)?)
        }
    }
}

fn report(err: &DbError) {
    error!(error = %err, "Command failed");
    eprintln!("Error: {}", err);
    if let Some(suggestion) = err.suggestion() {
        eprintln!("Hint: {}", suggestion);
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    let manager = match cli.database_config() {
        Ok(config) => ConnectionManager::new(config).await,
        Err(e) => Err(e),
    };
    let manager = match manager {
        Ok(manager) => manager,
        Err(e) => {
            report(&e);
            std::process::exit(1);
        }
    };

    let result = run(&cli, &manager).await;
    manager.close().await;

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            report(&e);
            std::process::exit(1);
        }
    }
}
