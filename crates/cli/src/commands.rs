//! Clap command tree definition.

use clap::{Arg, ArgAction, Command};

/// Build the `portex` command.
///
/// One command, no required flags; everything has a default or an
/// environment fallback.
pub fn build_cli() -> Command {
    Command::new("portex")
        .about("Export the service database in a portable format")
        .arg(
            Arg::new("db")
                .long("db")
                .value_name("PATH")
                .help("SQLite database file (default: service.db)"),
        )
        .arg(
            Arg::new("root")
                .long("root")
                .value_name("DIR")
                .help("Backup root directory (default: $PORTEX_BACKUP_ROOT, then ./backups)"),
        )
        .arg(
            Arg::new("tar-command")
                .long("tar-command")
                .help("Archive via the external tar process instead of the embedded writer")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("per-table")
                .long("per-table")
                .help("One independent query per table instead of a single read snapshot")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the run report as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Only log errors")
                .action(ArgAction::SetTrue),
        )
}
