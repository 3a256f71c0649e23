use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::combat::types::AttackTier;
use crate::core::error::{CombatError, CombatResult};

pub type PlayerId = Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub id: PlayerId,
    /// Character template the player fights with
    pub character_id: u32,
    pub energy: u32,
    #[serde(default)]
    pub max_energy: u32,
    /// When the next energy point comes back; `None` when full
    #[serde(default)]
    pub next_energy_restore_at: Option<DateTime<Utc>>,
}

impl PlayerProfile {
    /// Whole seconds until the next energy point, never negative. A player
    /// below max with no scheduled restore waits a full `restore_interval`.
    pub fn seconds_to_next_energy(&self, now: DateTime<Utc>, restore_interval: i64) -> u64 {
        if self.energy >= self.max_energy {
            return 0;
        }
        match self.next_energy_restore_at {
            Some(at) => (at - now).num_seconds().max(0) as u64,
            None => restore_interval.max(0) as u64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterTemplate {
    pub id: u32,
    pub name: String,
    pub max_hp: u32,
    /// Damage per attack tier (basic, second, third, special)
    #[serde(default)]
    pub damage: Vec<u32>,
}

impl CharacterTemplate {
    /// Damage for a tier, using `fallback` when the template's table is too short.
    pub fn damage_for(&self, tier: AttackTier, fallback: &[u32; 4]) -> u32 {
        let index = tier.index();
        if self.damage.len() > index {
            self.damage[index]
        } else {
            fallback[index]
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyTemplate {
    pub id: u32,
    /// Display name; also the boss identity that selects its curse
    pub name: String,
    pub damage: u32,
    /// Damage of the themed special attack; defaults to `damage`
    #[serde(default)]
    pub special_damage: Option<u32>,
}

impl EnemyTemplate {
    pub fn special_damage(&self) -> u32 {
        self.special_damage.unwrap_or(self.damage)
    }
}

/// Rewards accumulated for the first correct answer to a challenge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub coins: u32,
    pub points: u32,
    pub exp: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeTemplate {
    pub id: u32,
    pub correct_answer: String,
    #[serde(default)]
    pub reward: Reward,
}

impl ChallengeTemplate {
    /// Length in characters, not bytes.
    pub fn answer_length(&self) -> usize {
        self.correct_answer.chars().count()
    }
}

/// Points at a level on a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelRef {
    pub map_id: u32,
    pub level_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelTemplate {
    pub id: u32,
    pub map_id: u32,
    pub enemy_id: u32,
    pub challenge_ids: Vec<u32>,
    /// Raw classification string; parsed with `EnemyDifficulty::parse`
    pub difficulty: String,
    /// Level unlocked when this one is won
    #[serde(default)]
    pub next_level: Option<LevelRef>,
}

impl LevelTemplate {
    pub fn total_challenges(&self) -> u32 {
        self.challenge_ids.len() as u32
    }

    pub fn enemy_difficulty(&self) -> CombatResult<EnemyDifficulty> {
        EnemyDifficulty::parse(&self.difficulty)
    }
}

/// Enemy-difficulty classification of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyDifficulty {
    Easy,
    Medium,
    Hard,
    Boss,
}

impl EnemyDifficulty {
    /// Parses a classification. Unknown values are rejected rather than
    /// defaulted.
    pub fn parse(raw: &str) -> CombatResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(EnemyDifficulty::Easy),
            "medium" => Ok(EnemyDifficulty::Medium),
            "hard" => Ok(EnemyDifficulty::Hard),
            "boss" => Ok(EnemyDifficulty::Boss),
            other => Err(CombatError::invalid(format!(
                "unrecognized enemy difficulty '{}'",
                other
            ))),
        }
    }

    pub fn is_boss(&self) -> bool {
        matches!(self, EnemyDifficulty::Boss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn character(damage: Vec<u32>) -> CharacterTemplate {
        CharacterTemplate {
            id: 1,
            name: "Ryron".to_string(),
            max_hp: 100,
            damage,
        }
    }

    #[test]
    fn test_damage_for_uses_template_table() {
        let c = character(vec![12, 18, 30, 40]);
        assert_eq!(c.damage_for(AttackTier::Basic, &[10, 15, 25, 25]), 12);
        assert_eq!(c.damage_for(AttackTier::Special, &[10, 15, 25, 25]), 40);
    }

    #[test]
    fn test_damage_for_short_table_falls_back() {
        let c = character(vec![12]);
        assert_eq!(c.damage_for(AttackTier::Basic, &[10, 15, 25, 25]), 12);
        assert_eq!(c.damage_for(AttackTier::Third, &[10, 15, 25, 25]), 25);
        let empty = character(vec![]);
        assert_eq!(empty.damage_for(AttackTier::Second, &[10, 15, 25, 25]), 15);
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!(EnemyDifficulty::parse("easy").unwrap(), EnemyDifficulty::Easy);
        assert_eq!(EnemyDifficulty::parse(" Boss ").unwrap(), EnemyDifficulty::Boss);
        assert!(EnemyDifficulty::parse("boss").unwrap().is_boss());
        assert!(!EnemyDifficulty::parse("hard").unwrap().is_boss());
    }

    #[test]
    fn test_unknown_difficulty_is_invalid_input() {
        let err = EnemyDifficulty::parse("legendary").unwrap_err();
        assert!(matches!(err, CombatError::InvalidInput(_)));
    }

    #[test]
    fn test_answer_length_counts_chars() {
        let challenge = ChallengeTemplate {
            id: 1,
            correct_answer: "naïve".to_string(),
            reward: Reward::default(),
        };
        assert_eq!(challenge.answer_length(), 5);
    }

    #[test]
    fn test_seconds_to_next_energy_never_negative() {
        let now = Utc::now();
        let mut profile = PlayerProfile {
            id: Uuid::new_v4(),
            character_id: 1,
            energy: 3,
            max_energy: 5,
            next_energy_restore_at: Some(now + Duration::seconds(90)),
        };
        assert_eq!(profile.seconds_to_next_energy(now, 300), 90);

        profile.next_energy_restore_at = Some(now - Duration::seconds(5));
        assert_eq!(profile.seconds_to_next_energy(now, 300), 0);

        profile.next_energy_restore_at = None;
        assert_eq!(profile.seconds_to_next_energy(now, 300), 300);

        profile.energy = 5;
        assert_eq!(profile.seconds_to_next_energy(now, 300), 0);
    }
}
