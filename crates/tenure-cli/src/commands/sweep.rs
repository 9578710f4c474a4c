//! Run one sweep cycle.

use anyhow::{Context, Result};
use tenure::SweepReport;

use crate::config::Config;

pub async fn execute(config: &Config) -> Result<()> {
    let manager = super::build_manager(config)?;
    let report = manager.sweep().await.context("Sweep failed")?;
    print!("{}", render(&report));
    Ok(())
}

fn render(report: &SweepReport) -> String {
    format!(
        "examined:       {}\n\
         held:           {}\n\
         reminded:       {}\n\
         notify failed:  {}\n\
         unresolved:     {}\n\
         expired:        {}\n\
         revoke failed:  {}\n\
         revoke skipped: {}\n\
         errors:         {}\n",
        report.examined,
        report.held,
        report.reminded,
        report.notify_failed,
        report.unresolved,
        report.expired,
        report.revoke_failed,
        report.revoke_skipped,
        report.errors,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_report() {
        let report = SweepReport {
            examined: 3,
            reminded: 1,
            expired: 2,
            ..Default::default()
        };
        let text = render(&report);
        assert!(text.starts_with("examined:       3\n"));
        assert!(text.contains("expired:        2\n"));
        assert_eq!(text.lines().count(), 9);
    }
}
