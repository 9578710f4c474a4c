//! The static group catalog.
//!
//! Groups are configured once at startup and are read-only afterwards.
//! Grants reference them by [`GroupId`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::types::GroupId;

/// Color used when a grant references a group the catalog no longer has.
pub const FALLBACK_COLOR: &str = "#FFFF00";

/// Contact line used when a grant references an unknown group.
pub const FALLBACK_CONTACT: &str = "Contact support";

/// Display and authority metadata for one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDefinition {
    /// Human-readable group name.
    pub display_name: String,

    /// Identifier of the externally held role that carries the membership.
    pub role_id: String,

    /// Accent color as `#RRGGBB`.
    #[serde(default = "default_color")]
    pub color: String,

    /// Where members go to renew.
    #[serde(default = "default_contact")]
    pub contact: String,
}

fn default_color() -> String {
    FALLBACK_COLOR.to_string()
}

fn default_contact() -> String {
    FALLBACK_CONTACT.to_string()
}

impl GroupDefinition {
    /// Create a group definition with default color and contact.
    pub fn new(display_name: impl Into<String>, role_id: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            role_id: role_id.into(),
            color: default_color(),
            contact: default_contact(),
        }
    }

    /// Set the accent color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Set the renewal contact line.
    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = contact.into();
        self
    }

    /// Parse the color into an RGB integer.
    pub fn color_rgb(&self) -> Result<u32> {
        parse_color(&self.color)
    }
}

/// Mapping from group identifier to its definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupCatalog {
    groups: BTreeMap<GroupId, GroupDefinition>,
}

impl GroupCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group, replacing any definition with the same id.
    pub fn insert(&mut self, id: impl Into<GroupId>, definition: GroupDefinition) {
        self.groups.insert(id.into(), definition);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_group(mut self, id: impl Into<GroupId>, definition: GroupDefinition) -> Self {
        self.insert(id, definition);
        self
    }

    /// Look up a group.
    pub fn get(&self, id: &GroupId) -> Option<&GroupDefinition> {
        self.groups.get(id)
    }

    /// Find the group a stored grant refers to.
    ///
    /// Tries `group` as an id first, then as a display name. Grants read
    /// from legacy `members.json` files carry the display name.
    pub fn lookup(&self, group: &GroupId) -> Option<&GroupDefinition> {
        self.groups.get(group).or_else(|| {
            self.groups
                .values()
                .find(|def| def.display_name == group.as_str())
        })
    }

    /// Whether the catalog defines `id`.
    pub fn contains(&self, id: &GroupId) -> bool {
        self.groups.contains_key(id)
    }

    /// Iterate over groups in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&GroupId, &GroupDefinition)> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Check every definition.
    ///
    /// An empty catalog, a blank display name or role id, or a malformed
    /// color is a configuration error.
    pub fn validate(&self) -> Result<()> {
        if self.groups.is_empty() {
            return Err(CoreError::InvalidCatalog("no groups configured".into()));
        }

        for (id, def) in &self.groups {
            if id.as_str().trim().is_empty() {
                return Err(CoreError::InvalidCatalog("group id must not be blank".into()));
            }
            if def.display_name.trim().is_empty() {
                return Err(CoreError::InvalidCatalog(format!(
                    "group {} has a blank display_name",
                    id
                )));
            }
            if def.role_id.trim().is_empty() {
                return Err(CoreError::InvalidCatalog(format!(
                    "group {} has a blank role_id",
                    id
                )));
            }
            def.color_rgb()?;
        }

        Ok(())
    }
}

/// Parse `#RRGGBB` into an RGB integer.
pub fn parse_color(color: &str) -> Result<u32> {
    let hex = color
        .strip_prefix('#')
        .ok_or_else(|| CoreError::InvalidColor(color.to_string()))?;
    if hex.len() != 6 {
        return Err(CoreError::InvalidColor(color.to_string()));
    }
    u32::from_str_radix(hex, 16).map_err(|_| CoreError::InvalidColor(color.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> GroupCatalog {
        GroupCatalog::new()
            .with_group(
                "tempo",
                GroupDefinition::new("Tempo Trades Livestream", "111")
                    .with_color("#FFD700")
                    .with_contact("Telegram: CRT Course"),
            )
            .with_group("orderflow", GroupDefinition::new("OrderFlow VIP", "333"))
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains(&GroupId::from("tempo")));
        assert!(!catalog.contains(&GroupId::from("missing")));

        let def = catalog.get(&GroupId::from("orderflow")).unwrap();
        assert_eq!(def.color, FALLBACK_COLOR);
        assert_eq!(def.contact, FALLBACK_CONTACT);
    }

    #[test]
    fn test_lookup_falls_back_to_display_name() {
        let catalog = catalog();

        let by_id = catalog.lookup(&GroupId::from("orderflow")).unwrap();
        let by_name = catalog.lookup(&GroupId::from("OrderFlow VIP")).unwrap();
        assert_eq!(by_id, by_name);
        assert_eq!(by_name.role_id, "333");

        assert!(catalog.get(&GroupId::from("OrderFlow VIP")).is_none());
        assert!(catalog.lookup(&GroupId::from("orderflow vip")).is_none());
    }

    #[test]
    fn test_validate_ok() {
        catalog().validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_empty_catalog() {
        let err = GroupCatalog::new().validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidCatalog(_)));
    }

    #[test]
    fn test_validate_rejects_blank_role() {
        let catalog = GroupCatalog::new().with_group("x", GroupDefinition::new("X", "  "));
        assert!(matches!(
            catalog.validate(),
            Err(CoreError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#FFD700").unwrap(), 0xFFD700);
        assert_eq!(parse_color("#00bfff").unwrap(), 0x00BFFF);
        assert!(parse_color("FFD700").is_err());
        assert!(parse_color("#FFF").is_err());
        assert!(parse_color("#GGGGGG").is_err());
    }

    #[test]
    fn test_catalog_deserializes_from_map() {
        let json = r#"{"gold": {"display_name": "Gold", "role_id": "42"}}"#;
        let catalog: GroupCatalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.get(&GroupId::from("gold")).unwrap().role_id, "42");
    }
}
