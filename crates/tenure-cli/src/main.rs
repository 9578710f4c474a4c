//! tenure - time-limited group membership manager.
//!
//! Runs the reminder and revocation scheduler, and offers one-shot commands
//! for sweeping, enrolling, and inspecting grants.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;
mod config;
mod directory;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json)?;

    let config = config::Config::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    match cli.command {
        Commands::Run => commands::run::execute(&config).await,
        Commands::Sweep => commands::sweep::execute(&config).await,
        Commands::Enroll {
            subject,
            group,
            days,
        } => commands::enroll::execute(&subject, &group, days, &config).await,
        Commands::List => commands::list::execute(&config).await,
        Commands::Groups => commands::groups::execute(&config).await,
    }
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("tenure=info".parse()?);
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
    Ok(())
}
