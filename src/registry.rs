//! Static club catalog.
//!
//! Loaded from configuration at startup and read-only afterwards. The
//! registry is the authority on which club keys exist; every engine
//! operation validates its club argument here first.

use crate::config::ClubConfig;
use crate::error::EngineError;
use std::collections::BTreeMap;

/// Display metadata for one club.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Club {
    /// Stable key (e.g., "science").
    pub key: String,
    /// Display name (e.g., "Science Club").
    pub name: String,
    pub emoji: String,
    /// Accent color as 0xRRGGBB.
    pub color: u32,
}

/// Read-only catalog of clubs, keyed by club identifier.
#[derive(Debug, Clone)]
pub struct ClubRegistry {
    clubs: BTreeMap<String, Club>,
}

impl ClubRegistry {
    /// Build a registry from configured clubs, falling back to the built-in
    /// campus catalog when the config carries none.
    pub fn from_config(clubs: &BTreeMap<String, ClubConfig>) -> Self {
        if clubs.is_empty() {
            return Self::campus_catalog();
        }
        let clubs = clubs
            .iter()
            .map(|(key, c)| {
                (
                    key.clone(),
                    Club {
                        key: key.clone(),
                        name: c.name.clone(),
                        emoji: c.emoji.clone(),
                        color: c.color,
                    },
                )
            })
            .collect();
        Self { clubs }
    }

    /// The default campus catalog.
    pub fn campus_catalog() -> Self {
        const CATALOG: &[(&str, &str, &str, u32)] = &[
            ("debate", "Debate Club", "\u{1f3a4}", 0xff6b6b),
            ("drama", "Drama Club", "\u{1f3ad}", 0x4ecdc4),
            ("music", "Music Club", "\u{1f3b5}", 0x45b7d1),
            ("art", "Art Club", "\u{1f3a8}", 0x96ceb4),
            ("science", "Science Club", "\u{1f52c}", 0xfeca57),
            ("sports", "Sports Club", "\u{26bd}", 0xff9ff3),
            ("literature", "Literature Club", "\u{1f4da}", 0x54a0ff),
        ];
        let clubs = CATALOG
            .iter()
            .map(|&(key, name, emoji, color)| {
                (
                    key.to_string(),
                    Club {
                        key: key.to_string(),
                        name: name.to_string(),
                        emoji: emoji.to_string(),
                        color,
                    },
                )
            })
            .collect();
        Self { clubs }
    }

    pub fn get(&self, key: &str) -> Option<&Club> {
        self.clubs.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.clubs.contains_key(key)
    }

    /// Look up a club or fail with `InvalidClub`.
    pub fn require(&self, key: &str) -> Result<&Club, EngineError> {
        self.clubs
            .get(key)
            .ok_or_else(|| EngineError::InvalidClub(key.to_string()))
    }

    /// Clubs in stable key order.
    pub fn iter(&self) -> impl Iterator<Item = &Club> {
        self.clubs.values()
    }

    pub fn len(&self) -> usize {
        self.clubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clubs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_campus_catalog() {
        let registry = ClubRegistry::campus_catalog();
        assert_eq!(registry.len(), 7);
        assert_eq!(registry.get("science").unwrap().name, "Science Club");
        assert!(registry.contains("debate"));
    }

    #[test]
    fn test_require_unknown_club() {
        let registry = ClubRegistry::campus_catalog();
        assert_eq!(
            registry.require("chess"),
            Err(EngineError::InvalidClub("chess".to_string()))
        );
    }

    #[test]
    fn test_config_catalog_overrides_default() {
        let mut clubs = BTreeMap::new();
        clubs.insert(
            "chess".to_string(),
            ClubConfig {
                name: "Chess Club".to_string(),
                emoji: "C".to_string(),
                color: 0x123456,
            },
        );
        let registry = ClubRegistry::from_config(&clubs);
        assert_eq!(registry.len(), 1);
        assert!(!registry.contains("science"));
    }
}
