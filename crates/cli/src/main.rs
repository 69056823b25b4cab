//! Portex CLI - one command that snapshots the service database.
//!
//! Reads every registry table, stages the CSV files under the backup root
//! and publishes a timestamped `.tar.gz` archive. Exit code 0 on COMPLETE,
//! 1 on FAILED.

mod commands;

use std::path::PathBuf;
use std::process;

use tracing_subscriber::EnvFilter;

use portex_core::ExportError;
use portex_engine::{Compression, Consistency, ExportConfig, ExportEngine, SqliteSession};

use commands::build_cli;

fn main() {
    let matches = build_cli().get_matches();

    let default_level = if matches.get_flag("quiet") { "error" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let db_path = matches
        .get_one::<String>("db")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("service.db"));

    let backup_root = matches
        .get_one::<String>("root")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("PORTEX_BACKUP_ROOT").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("backups"));

    let mut config = ExportConfig::default().with_backup_root(backup_root);
    if matches.get_flag("tar-command") {
        config = config.with_compression(Compression::TarCommand);
    }
    if matches.get_flag("per-table") {
        config = config.with_consistency(Consistency::PerTable);
    }

    let session = match SqliteSession::open(&db_path) {
        Ok(session) => session.with_query_timeout(config.query_timeout),
        Err(e) => {
            eprintln!("portex: cannot open {}: {e}", db_path.display());
            process::exit(1);
        }
    };

    let mut engine = ExportEngine::new(config, session);
    match engine.run() {
        Ok(report) => {
            if matches.get_flag("json") {
                // report is plain data; serialization cannot fail
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        eprintln!("portex: report serialization failed: {e}");
                        process::exit(1);
                    }
                }
            } else {
                print_report(&report);
            }
        }
        Err(e) => {
            print_failure(&e);
            process::exit(1);
        }
    }
}

fn print_report(report: &portex_engine::ExportReport) {
    println!(
        "snapshot {} -> {} ({} bytes)",
        report.stamp,
        report.archive_path.display(),
        report.archive_size_bytes
    );
    for table in &report.tables {
        println!("  {:<20} {:>8} rows", table.file_name, table.rows);
    }
    println!("{} tables, {} rows total", report.tables.len(), report.total_rows());
}

fn print_failure(err: &ExportError) {
    eprintln!("portex: {}: {err}", err.kind());
}
