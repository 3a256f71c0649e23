//! Persisted per-(player, level) combat record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use super::types::{BattleStatus, Potion};
use crate::catalog::{PlayerId, Reward};
use crate::progression::QuestType;

/// What the player submitted for a challenge. Recorded on first submission;
/// later submissions update it in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub answer: String,
    /// Correctness of the latest submission
    pub correct: bool,
    pub ever_correct: bool,
    pub ever_wrong: bool,
    pub first_answered_at: DateTime<Utc>,
}

/// History of a challenge before the current submission was recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriorAnswer {
    /// The challenge was not in `answered_challenges` before this submission
    pub newly_recorded: bool,
    pub already_answered_correctly: bool,
    pub was_ever_wrong: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatProgress {
    pub id: Uuid,
    pub player_id: PlayerId,
    pub level_id: u32,
    /// Bumped on every successful store write
    #[serde(default)]
    pub version: u64,

    pub enemy_hp: u32,
    pub enemy_max_hp: u32,
    pub player_hp: u32,
    pub player_max_hp: u32,
    pub battle_status: BattleStatus,

    pub answered_challenges: BTreeMap<u32, AnswerRecord>,
    pub wrong_challenge_ids: BTreeSet<u32>,
    pub consecutive_correct: u32,
    pub consecutive_wrong: u32,

    // Boss curses
    pub reversed_curse: bool,
    pub boss_shield: bool,
    pub force_basic_attack: bool,
    pub both_hp_decrease: bool,
    pub shuffle_options: bool,

    // Potion effects, consumed when they apply
    pub has_freeze_effect: bool,
    pub has_strong_effect: bool,

    /// Sticky: player HP dropped below max at some point this run
    pub took_damage: bool,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    // Win effects that went through; failed ones are retried later
    #[serde(default)]
    pub rewards_granted: bool,
    #[serde(default)]
    pub credited_quests: BTreeSet<QuestType>,
    #[serde(default)]
    pub level_unlocked: bool,

    pub coins_earned: u32,
    pub points_earned: u32,
    pub exp_earned: u32,

    pub created_at: DateTime<Utc>,
}

impl CombatProgress {
    /// Fresh record with full HP and zeroed counters.
    pub fn new(
        player_id: PlayerId,
        level_id: u32,
        enemy_max_hp: u32,
        player_max_hp: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id,
            level_id,
            version: 0,
            enemy_hp: enemy_max_hp,
            enemy_max_hp,
            player_hp: player_max_hp,
            player_max_hp,
            battle_status: BattleStatus::InProgress,
            answered_challenges: BTreeMap::new(),
            wrong_challenge_ids: BTreeSet::new(),
            consecutive_correct: 0,
            consecutive_wrong: 0,
            reversed_curse: false,
            boss_shield: false,
            force_basic_attack: false,
            both_hp_decrease: false,
            shuffle_options: false,
            has_freeze_effect: false,
            has_strong_effect: false,
            took_damage: false,
            is_completed: false,
            completed_at: None,
            rewards_granted: false,
            credited_quests: BTreeSet::new(),
            level_unlocked: false,
            coins_earned: 0,
            points_earned: 0,
            exp_earned: 0,
            created_at: now,
        }
    }

    pub fn answered_count(&self) -> u32 {
        self.answered_challenges.len() as u32
    }

    pub fn is_terminal(&self) -> bool {
        self.battle_status.is_terminal()
    }

    /// Records a submission. Membership is decided by insertion, so a
    /// challenge counts as answered whether or not it was correct.
    pub fn record_answer(
        &mut self,
        challenge_id: u32,
        answer: &str,
        correct: bool,
        now: DateTime<Utc>,
    ) -> PriorAnswer {
        let prior = match self.answered_challenges.get_mut(&challenge_id) {
            Some(record) => {
                let prior = PriorAnswer {
                    newly_recorded: false,
                    already_answered_correctly: record.ever_correct,
                    was_ever_wrong: record.ever_wrong,
                };
                record.answer = answer.to_string();
                record.correct = correct;
                record.ever_correct |= correct;
                record.ever_wrong |= !correct;
                prior
            }
            None => {
                self.answered_challenges.insert(
                    challenge_id,
                    AnswerRecord {
                        answer: answer.to_string(),
                        correct,
                        ever_correct: correct,
                        ever_wrong: !correct,
                        first_answered_at: now,
                    },
                );
                PriorAnswer {
                    newly_recorded: true,
                    ..PriorAnswer::default()
                }
            }
        };

        if correct {
            self.wrong_challenge_ids.remove(&challenge_id);
        } else {
            self.wrong_challenge_ids.insert(challenge_id);
        }
        prior
    }

    /// Updates the mutually exclusive answer streaks.
    pub fn record_streak(&mut self, correct: bool) {
        if correct {
            self.consecutive_correct += 1;
            self.consecutive_wrong = 0;
        } else {
            self.consecutive_wrong += 1;
            self.consecutive_correct = 0;
        }
    }

    pub fn arm_potion(&mut self, potion: Potion) {
        match potion {
            Potion::Strong => self.has_strong_effect = true,
            Potion::Freeze => self.has_freeze_effect = true,
        }
    }

    /// Takes the strong-potion flag, clearing it.
    pub fn consume_strong_effect(&mut self) -> bool {
        std::mem::take(&mut self.has_strong_effect)
    }

    /// Takes the freeze-potion flag, clearing it.
    pub fn consume_freeze_effect(&mut self) -> bool {
        std::mem::take(&mut self.has_freeze_effect)
    }

    pub fn add_reward(&mut self, reward: Reward) {
        self.coins_earned = self.coins_earned.saturating_add(reward.coins);
        self.points_earned = self.points_earned.saturating_add(reward.points);
        self.exp_earned = self.exp_earned.saturating_add(reward.exp);
    }

    pub fn damage_enemy(&mut self, amount: u32) {
        self.enemy_hp = self.enemy_hp.saturating_sub(amount);
    }

    /// Applies damage to the player and marks the run imperfect once HP
    /// falls below max.
    pub fn damage_player(&mut self, amount: u32) {
        self.player_hp = self.player_hp.saturating_sub(amount);
        if self.player_hp < self.player_max_hp {
            self.took_damage = true;
        }
    }

    /// No wrong answers outstanding and never hurt.
    pub fn is_perfect_run(&self) -> bool {
        self.wrong_challenge_ids.is_empty() && !self.took_damage
    }

    pub fn accumulated_reward(&self) -> Reward {
        Reward {
            coins: self.coins_earned,
            points: self.points_earned,
            exp: self.exp_earned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> CombatProgress {
        CombatProgress::new(Uuid::new_v4(), 1, 60, 100, Utc::now())
    }

    #[test]
    fn test_new_record_has_full_hp() {
        let p = fresh();
        assert_eq!(p.enemy_hp, 60);
        assert_eq!(p.player_hp, 100);
        assert_eq!(p.battle_status, BattleStatus::InProgress);
        assert_eq!(p.answered_count(), 0);
        assert!(!p.took_damage);
        assert!(!p.is_completed);
    }

    #[test]
    fn test_wrong_answer_counts_as_answered() {
        let mut p = fresh();
        let prior = p.record_answer(5, "print(x)", false, Utc::now());
        assert!(prior.newly_recorded);
        assert_eq!(p.answered_count(), 1);
        assert!(p.wrong_challenge_ids.contains(&5));
    }

    #[test]
    fn test_resubmission_does_not_grow_answered_set() {
        let mut p = fresh();
        p.record_answer(5, "a", false, Utc::now());
        let prior = p.record_answer(5, "b", true, Utc::now());
        assert!(!prior.newly_recorded);
        assert!(prior.was_ever_wrong);
        assert!(!prior.already_answered_correctly);
        assert_eq!(p.answered_count(), 1);
        assert!(p.wrong_challenge_ids.is_empty());
        let record = &p.answered_challenges[&5];
        assert!(record.ever_correct && record.ever_wrong && record.correct);
        assert_eq!(record.answer, "b");
    }

    #[test]
    fn test_streaks_are_mutually_exclusive() {
        let mut p = fresh();
        p.record_streak(false);
        p.record_streak(false);
        assert_eq!((p.consecutive_correct, p.consecutive_wrong), (0, 2));
        p.record_streak(true);
        assert_eq!((p.consecutive_correct, p.consecutive_wrong), (1, 0));
    }

    #[test]
    fn test_potion_flags_are_single_use() {
        let mut p = fresh();
        p.arm_potion(Potion::Strong);
        p.arm_potion(Potion::Freeze);
        assert!(p.consume_strong_effect());
        assert!(!p.consume_strong_effect());
        assert!(p.consume_freeze_effect());
        assert!(!p.has_freeze_effect);
    }

    #[test]
    fn test_damage_floors_at_zero_and_marks_took_damage() {
        let mut p = fresh();
        p.damage_player(0);
        assert!(!p.took_damage);
        p.damage_player(250);
        assert_eq!(p.player_hp, 0);
        assert!(p.took_damage);
        p.damage_enemy(1000);
        assert_eq!(p.enemy_hp, 0);
    }

    #[test]
    fn test_perfect_run() {
        let mut p = fresh();
        assert!(p.is_perfect_run());
        p.record_answer(1, "x", false, Utc::now());
        assert!(!p.is_perfect_run());
        p.record_answer(1, "y", true, Utc::now());
        assert!(p.is_perfect_run());
        p.damage_player(1);
        assert!(!p.is_perfect_run());
    }

    #[test]
    fn test_rewards_accumulate() {
        let mut p = fresh();
        p.add_reward(Reward { coins: 5, points: 10, exp: 2 });
        p.add_reward(Reward { coins: 1, points: 1, exp: 1 });
        assert_eq!(p.accumulated_reward(), Reward { coins: 6, points: 11, exp: 3 });
    }
}
