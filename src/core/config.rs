//! Engine tuning loaded from JSON.
//!
//! Every field has a default, so a config file only needs the values it
//! overrides.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::constants::*;
use super::error::{CombatError, CombatResult};
use crate::combat::types::BossCurse;

/// Binds a boss identity (its display name) to the curse it arms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossCurseEntry {
    pub enemy_name: String,
    pub curse: BossCurse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Enemy HP per challenge in the level, for normal enemies
    pub base_enemy_hp: u32,
    /// Enemy HP per challenge in the level, for bosses
    pub base_boss_hp: u32,
    /// Fallback character damage table (basic, second, third, special)
    pub default_damage_table: [u32; 4],
    pub second_tier_min_length: usize,
    pub third_tier_min_length: usize,
    /// A curse arms whenever the wrong-answer streak hits a multiple of this
    pub curse_streak: u32,
    pub energy_restore_seconds: i64,
    pub boss_curses: Vec<BossCurseEntry>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_enemy_hp: BASE_ENEMY_HP,
            base_boss_hp: BASE_BOSS_HP,
            default_damage_table: DEFAULT_DAMAGE_TABLE,
            second_tier_min_length: SECOND_TIER_MIN_ANSWER_LEN,
            third_tier_min_length: THIRD_TIER_MIN_ANSWER_LEN,
            curse_streak: CURSE_STREAK,
            energy_restore_seconds: ENERGY_RESTORE_SECONDS,
            boss_curses: DEFAULT_BOSS_CURSES
                .iter()
                .filter_map(|(name, tag)| {
                    BossCurse::from_tag(tag).map(|curse| BossCurseEntry {
                        enemy_name: name.to_string(),
                        curse,
                    })
                })
                .collect(),
        }
    }
}

impl EngineConfig {
    /// Parses a config from a JSON string.
    pub fn from_json(json: &str) -> CombatResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CombatError::invalid(format!("engine config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file, surfacing read and parse failures.
    pub fn load(path: &Path) -> CombatResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            CombatError::invalid(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Loads a config file, returning defaults if it is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "using default engine config");
                Self::default()
            }
        }
    }

    fn validate(&self) -> CombatResult<()> {
        if self.curse_streak == 0 {
            return Err(CombatError::invalid("curse_streak must be at least 1"));
        }
        if self.second_tier_min_length > self.third_tier_min_length {
            return Err(CombatError::invalid(
                "second_tier_min_length must not exceed third_tier_min_length",
            ));
        }
        Ok(())
    }

    /// Curse armed by the named boss, if it has one.
    pub fn curse_for(&self, enemy_name: &str) -> Option<BossCurse> {
        self.boss_curses
            .iter()
            .find(|entry| entry.enemy_name == enemy_name)
            .map(|entry| entry.curse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_matches_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.base_enemy_hp, 30);
        assert_eq!(config.default_damage_table, [10, 15, 25, 25]);
        assert_eq!(config.curse_streak, 3);
        assert_eq!(config.boss_curses.len(), DEFAULT_BOSS_CURSES.len());
    }

    #[test]
    fn test_curse_lookup_by_name() {
        let config = EngineConfig::default();
        assert_eq!(config.curse_for("Boss Joshy"), Some(BossCurse::Shield));
        assert_eq!(config.curse_for("Slime"), None);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"base_enemy_hp": 40}"#).unwrap();
        assert_eq!(config.base_enemy_hp, 40);
        assert_eq!(config.base_boss_hp, BASE_BOSS_HP);
        assert_eq!(config.third_tier_min_length, 8);
    }

    #[test]
    fn test_custom_curse_table() {
        let json = r#"{"boss_curses": [{"enemy_name": "Boss Nul", "curse": "mutual_damage"}]}"#;
        let config = EngineConfig::from_json(json).unwrap();
        assert_eq!(config.curse_for("Boss Nul"), Some(BossCurse::MutualDamage));
        assert_eq!(config.curse_for("Boss Joshy"), None);
    }

    #[test]
    fn test_zero_curse_streak_rejected() {
        let result = EngineConfig::from_json(r#"{"curse_streak": 0}"#);
        assert!(matches!(result, Err(CombatError::InvalidInput(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"curse_streak": 4}}"#).unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.curse_streak, 4);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = EngineConfig::load_or_default(Path::new("/nonexistent/quizbattle.json"));
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_load_or_default_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let config = EngineConfig::load_or_default(file.path());
        assert_eq!(config, EngineConfig::default());
    }
}
