//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tenure: time-limited group membership.
///
/// Enrolls members into groups for a number of days, reminds them before
/// their membership ends, and revokes it once it has.
#[derive(Parser, Debug)]
#[command(name = "tenure")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, short, global = true, env = "TENURE_CONFIG", default_value = "tenure.toml")]
    pub config: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the sweep scheduler until interrupted
    Run,

    /// Run exactly one sweep cycle and print the report
    Sweep,

    /// Grant a member time-limited membership in a group
    Enroll {
        /// Member identifier
        subject: String,
        /// Group identifier from the catalog
        group: String,
        /// Duration in days
        #[arg(allow_negative_numbers = true)]
        days: i64,
    },

    /// List every live grant
    List,

    /// Show the configured group catalog
    Groups,
}
