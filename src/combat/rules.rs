//! Normal/boss rule sets. One resolver runs both, parameterised by these.

use crate::catalog::{EnemyDifficulty, EnemyTemplate};
use crate::core::EngineConfig;

use super::types::BossCurse;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombatRules {
    pub is_boss: bool,
    /// Enemy HP per challenge in the level
    pub base_hp: u32,
    /// Curse this enemy arms; `None` for normal enemies and curse-less bosses
    pub curse: Option<BossCurse>,
    pub special_skill_enabled: bool,
    pub curse_streak: u32,
}

impl CombatRules {
    pub fn normal(config: &EngineConfig) -> Self {
        Self {
            is_boss: false,
            base_hp: config.base_enemy_hp,
            curse: None,
            special_skill_enabled: false,
            curse_streak: config.curse_streak,
        }
    }

    pub fn boss(enemy: &EnemyTemplate, config: &EngineConfig) -> Self {
        let curse = config.curse_for(&enemy.name);
        Self {
            is_boss: true,
            base_hp: config.base_boss_hp,
            curse,
            special_skill_enabled: curse.is_some(),
            curse_streak: config.curse_streak,
        }
    }

    /// Picks the rule set from the level's difficulty classification.
    pub fn for_encounter(
        difficulty: EnemyDifficulty,
        enemy: &EnemyTemplate,
        config: &EngineConfig,
    ) -> Self {
        if difficulty.is_boss() {
            Self::boss(enemy, config)
        } else {
            Self::normal(config)
        }
    }

    /// Enemy max HP scales with the number of challenges in the level.
    pub fn enemy_max_hp(&self, total_challenges: u32) -> u32 {
        self.base_hp.saturating_mul(total_challenges)
    }
}
