//! List live grants.

use anyhow::Result;
use tenure_adapters::format_millis;
use tenure_core::{Grant, GroupCatalog};
use tenure_store::GrantStore;

use crate::config::Config;

pub async fn execute(config: &Config) -> Result<()> {
    let store = super::open_store(config)?;
    let mut grants = store.all().await?;
    grants.sort_by_key(|g| g.expires_at);

    if grants.is_empty() {
        println!("No grants.");
        return Ok(());
    }
    for grant in &grants {
        println!("{}", render(grant, &config.groups));
    }
    Ok(())
}

fn render(grant: &Grant, catalog: &GroupCatalog) -> String {
    let group = catalog
        .get(&grant.group_id)
        .map(|g| g.display_name.as_str())
        .unwrap_or("(unknown group)");
    format!(
        "{:<24} {:<20} {:<28} expires {}{}",
        grant.subject_id,
        grant.group_id,
        group,
        format_millis(grant.expires_at),
        if grant.reminded() { "  [reminded]" } else { "" }
    )
}
