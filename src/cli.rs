use clap::{command, Parser, Subcommand};

// ///////////// //
// CLI interface //
// ///////////// //

/// cupsmeter - A service that intercepts new CUPS print jobs, prices them against a remote budget ledger, and releases or cancels them.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dumps the current printer/job snapshot to stdout.
    Dump,
}
