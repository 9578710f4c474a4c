//! Run the scheduler until Ctrl-C.

use anyhow::{Context, Result};
use tenure::Scheduler;

use crate::config::Config;

pub async fn execute(config: &Config) -> Result<()> {
    let manager = super::build_manager(config)?;
    let scheduler = Scheduler::spawn(manager);

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    tracing::info!("shutdown requested, finishing current cycle");
    scheduler
        .shutdown()
        .await
        .context("Scheduler task panicked")?;
    Ok(())
}
