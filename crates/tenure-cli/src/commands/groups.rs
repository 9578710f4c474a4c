//! Show the group catalog.

use anyhow::Result;

use crate::config::Config;

pub async fn execute(config: &Config) -> Result<()> {
    for (id, group) in config.groups.iter() {
        println!(
            "{:<20} {:<28} role={} color={} contact={}",
            id, group.display_name, group.role_id, group.color, group.contact
        );
    }
    Ok(())
}
