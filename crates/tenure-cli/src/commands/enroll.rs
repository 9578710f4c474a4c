//! Enroll a member.

use anyhow::{Context, Result};
use tenure_adapters::format_millis;

use crate::config::Config;

pub async fn execute(subject: &str, group: &str, days: i64, config: &Config) -> Result<()> {
    let manager = super::build_manager(config)?;
    let grant = manager
        .enroll(subject, group, days)
        .await
        .with_context(|| format!("Failed to enroll {} in {}", subject, group))?;

    println!(
        "Enrolled {} in {} until {}",
        grant.subject_id,
        grant.group_id,
        format_millis(grant.expires_at)
    );
    Ok(())
}
