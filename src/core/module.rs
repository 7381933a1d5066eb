//! Statistic module tags.
//!
//! Every statistic category, built-in or hook-provided, is identified by a
//! `Module` tag. Config enablement, hook bookkeeping, and diagnostics all key
//! off this tag.

use serde::{Deserialize, Serialize};

/// A statistic module tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    /// Player-versus-player kill tracking.
    Pvp,
    /// Player-versus-environment kill/death tracking.
    Pve,
    /// Item drop tracking.
    Items,
    /// McMMO skill statistics (hook).
    McMmo,
    /// Jobs occupation statistics (hook).
    Jobs,
    /// Vault economy statistics (hook).
    Vault,
    /// MobArena participation statistics (hook).
    MobArena,
    /// PvpArena participation statistics (hook).
    PvpArena,
    /// Factions allegiance statistics (hook).
    Factions,
}

impl Module {
    /// All built-in categories, in registration order.
    ///
    /// Hook modules are not listed here; they come from the descriptor table
    /// passed to the hook registry.
    pub const CATEGORIES: &'static [Module] = &[Module::Pvp, Module::Pve, Module::Items];

    /// Get the module name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pvp => "pvp",
            Self::Pve => "pve",
            Self::Items => "items",
            Self::McMmo => "mcmmo",
            Self::Jobs => "jobs",
            Self::Vault => "vault",
            Self::MobArena => "mob_arena",
            Self::PvpArena => "pvp_arena",
            Self::Factions => "factions",
        }
    }

    /// Parse a module name from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pvp" => Some(Self::Pvp),
            "pve" => Some(Self::Pve),
            "items" => Some(Self::Items),
            "mcmmo" => Some(Self::McMmo),
            "jobs" => Some(Self::Jobs),
            "vault" => Some(Self::Vault),
            "mob_arena" | "mobarena" => Some(Self::MobArena),
            "pvp_arena" | "pvparena" => Some(Self::PvpArena),
            "factions" => Some(Self::Factions),
            _ => None,
        }
    }
}

impl std::fmt::Display for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str_parse_roundtrip() {
        for module in [
            Module::Pvp,
            Module::Pve,
            Module::Items,
            Module::McMmo,
            Module::Jobs,
            Module::Vault,
            Module::MobArena,
            Module::PvpArena,
            Module::Factions,
        ] {
            assert_eq!(Module::parse(module.as_str()), Some(module));
        }
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(Module::parse("MobArena"), Some(Module::MobArena));
        assert_eq!(Module::parse("pvparena"), Some(Module::PvpArena));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Module::parse("scoreboard"), None);
    }

    #[test]
    fn test_categories_exclude_hooks() {
        assert!(!Module::CATEGORIES.contains(&Module::McMmo));
        assert_eq!(Module::CATEGORIES.len(), 3);
    }
}
