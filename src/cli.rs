use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::poller::Timeout;

/// tablerescue - disaster recovery for the parks reporting tables
#[derive(Parser)]
#[command(name = "tablerescue")]
#[command(about = "Back up, duplicate, delete and restore tables with verified, step-by-step workflows")]
#[command(version)]
pub struct Cli {
    /// Path to the recovery configuration file
    #[arg(short, long, global = true, default_value = "tablerescue.json")]
    pub config: PathBuf,

    /// Rehearsal mode: run against a simulated cloud seeded from this JSON fixture.
    ///
    /// No real services are contacted and polling waits use a virtual clock,
    /// so whole workflows can be practiced in seconds.
    #[arg(long, global = true, value_name = "FIXTURE")]
    pub simulate: Option<PathBuf>,

    /// Poll window before asking to keep waiting (seconds, or -1 for unbounded).
    /// Overrides `timeout_seconds` from the config file.
    #[arg(long, global = true, allow_hyphen_values = true)]
    pub timeout: Option<Timeout>,

    /// Disable colored console output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// More log output on stderr (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the interactive recovery menu (default)
    Run,
    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        config: PathBuf,
    },
    /// List tables
    Tables,
    /// List on-demand backups
    Backups {
        /// Only backups of this table
        #[arg(short, long)]
        table: Option<String>,
    },
    /// List recovery points in the configured vault, with their storage tier
    RecoveryPoints {
        /// Only recovery points of this table
        #[arg(short, long)]
        table: Option<String>,
    },
    /// Remove the transient resources recorded in a run journal
    Cleanup {
        /// Journal file written by an earlier run
        #[arg(short, long)]
        journal: PathBuf,
    },
}

impl Cli {
    /// The subcommand, defaulting to the interactive menu
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }
}
