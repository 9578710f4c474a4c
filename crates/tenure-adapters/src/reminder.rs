//! The pre-expiry reminder message.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tenure_core::{Grant, GroupCatalog, GroupId, FALLBACK_COLOR, FALLBACK_CONTACT};

/// Everything a notifier needs to tell a member their membership is ending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub group_id: GroupId,
    pub display_name: String,
    /// Accent color as `#RRGGBB`.
    pub color: String,
    /// Where to renew.
    pub contact: String,
    /// Absolute expiry, Unix milliseconds.
    pub expires_at: i64,
    /// Whole hours left when the reminder was built.
    pub hours_left: i64,
}

impl Reminder {
    /// Build the reminder for `grant` at `now`.
    ///
    /// A group missing from the catalog still gets a reminder, named after
    /// its id and using the fallback color and contact.
    pub fn for_grant(grant: &Grant, catalog: &GroupCatalog, now: i64) -> Self {
        let (display_name, color, contact) = match catalog.lookup(&grant.group_id) {
            Some(def) => (def.display_name.clone(), def.color.clone(), def.contact.clone()),
            None => (
                grant.group_id.to_string(),
                FALLBACK_COLOR.to_string(),
                FALLBACK_CONTACT.to_string(),
            ),
        };

        Self {
            group_id: grant.group_id.clone(),
            display_name,
            color,
            contact,
            expires_at: grant.expires_at,
            hours_left: grant.hours_left(now),
        }
    }

    pub fn title(&self) -> &'static str {
        "Membership Expiring Soon"
    }

    pub fn description(&self) -> String {
        format!(
            "Your membership in {} is expiring soon!",
            self.display_name
        )
    }

    pub fn footer(&self) -> &'static str {
        "Please renew your membership to maintain access."
    }

    /// Expiry rendered as RFC 3339 in UTC.
    pub fn expires_display(&self) -> String {
        format_millis(self.expires_at)
    }

    /// "1 hour" / "23 hours".
    pub fn time_left_display(&self) -> String {
        if self.hours_left == 1 {
            "1 hour".to_string()
        } else {
            format!("{} hours", self.hours_left)
        }
    }

    /// Plain-text rendering for transports without rich formatting.
    pub fn to_text(&self) -> String {
        format!(
            "{}\n{}\nExpires: {}\nTime left: {}\nContact for payment: {}\n{}",
            self.title(),
            self.description(),
            self.expires_display(),
            self.time_left_display(),
            self.contact,
            self.footer(),
        )
    }
}

/// Render Unix milliseconds as RFC 3339 (UTC). Out-of-range values fall
/// back to the raw number.
pub fn format_millis(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| ms.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenure_core::{GroupDefinition, HOUR_MS};

    const NOW: i64 = 1_700_000_000_000;

    fn catalog() -> GroupCatalog {
        GroupCatalog::new().with_group(
            "smartfx",
            GroupDefinition::new("SmartFX Premium", "222")
                .with_color("#00BFFF")
                .with_contact("Telegram: SmartFX Support"),
        )
    }

    #[test]
    fn test_reminder_uses_catalog_metadata() {
        let grant = Grant::new("42".into(), "smartfx".into(), NOW + 23 * HOUR_MS);
        let r = Reminder::for_grant(&grant, &catalog(), NOW);

        assert_eq!(r.display_name, "SmartFX Premium");
        assert_eq!(r.color, "#00BFFF");
        assert_eq!(r.hours_left, 23);
        assert_eq!(r.time_left_display(), "23 hours");
        assert!(r.description().contains("SmartFX Premium"));
    }

    #[test]
    fn test_reminder_for_legacy_group_name() {
        let grant = Grant::new("42".into(), "SmartFX Premium".into(), NOW + HOUR_MS);
        let r = Reminder::for_grant(&grant, &catalog(), NOW);

        assert_eq!(r.color, "#00BFFF");
        assert_eq!(r.contact, "Telegram: SmartFX Support");
    }

    #[test]
    fn test_reminder_falls_back_for_unknown_group() {
        let grant = Grant::new("42".into(), "retired".into(), NOW + HOUR_MS);
        let r = Reminder::for_grant(&grant, &catalog(), NOW);

        assert_eq!(r.display_name, "retired");
        assert_eq!(r.color, FALLBACK_COLOR);
        assert_eq!(r.contact, FALLBACK_CONTACT);
        assert_eq!(r.time_left_display(), "1 hour");
    }

    #[test]
    fn test_text_rendering() {
        let grant = Grant::new("42".into(), "smartfx".into(), NOW + 23 * HOUR_MS);
        let text = Reminder::for_grant(&grant, &catalog(), NOW).to_text();

        assert!(text.starts_with("Membership Expiring Soon"));
        assert!(text.contains("Expires: 2023-11-15T21:13:20Z"));
        assert!(text.contains("Telegram: SmartFX Support"));
    }

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(0), "1970-01-01T00:00:00Z");
        assert_eq!(format_millis(i64::MAX), i64::MAX.to_string());
    }
}
