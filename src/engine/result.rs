//! Presentation DTOs handed to the client after a turn.

use serde::Serialize;

use crate::catalog::{CardMetadata, CharacterTemplate, EnemyTemplate, Reward};
use crate::combat::resolver::TurnReport;
use crate::combat::{is_bonus_round, AttackTier, BattleStatus, BossCurse, CombatProgress, EnemyAttack};
use crate::progression::SideEffect;

/// Formats elapsed seconds as `mm:ss`, floored. Negative or non-finite
/// input shows as `00:00`.
pub fn format_timer(elapsed_seconds: f64) -> String {
    let secs = if elapsed_seconds.is_finite() && elapsed_seconds > 0.0 {
        elapsed_seconds.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyView {
    pub id: u32,
    pub name: String,
    pub health: u32,
    pub max_health: u32,
    /// Damage dealt to the player this turn
    pub damage: u32,
    pub attack: Option<EnemyAttack>,
    pub animation_cue_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterView {
    pub id: u32,
    pub name: String,
    pub health: u32,
    pub max_health: u32,
    /// Damage dealt to the enemy this turn
    pub damage: u32,
    pub attack_tier: Option<AttackTier>,
    pub card: Option<CardMetadata>,
    pub animation_cue_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResult {
    pub status: BattleStatus,
    pub enemy: EnemyView,
    pub character: CharacterView,
    pub boss_special_skill: Option<BossCurse>,
    pub curse_armed: Option<BossCurse>,
    pub timer_display: String,
    pub energy: u32,
    pub time_to_next_energy_restore: u64,
    pub is_enemy_frozen: bool,
    pub is_bonus_round: bool,
    pub answered_challenges: u32,
    pub total_challenges: u32,
    pub rewards: Reward,
    pub side_effects: Vec<SideEffect>,
}

/// Inputs for assembling a `TurnResult` from final values.
pub(crate) struct ResultParts<'a> {
    pub progress: &'a CombatProgress,
    pub report: &'a TurnReport,
    pub character: &'a CharacterTemplate,
    pub enemy: &'a EnemyTemplate,
    pub total_challenges: u32,
    pub elapsed_seconds: f64,
    pub energy: u32,
    pub time_to_next_energy_restore: u64,
    pub side_effects: Vec<SideEffect>,
}

impl TurnResult {
    pub(crate) fn assemble(parts: ResultParts<'_>) -> Self {
        let ResultParts {
            progress,
            report,
            character,
            enemy,
            total_challenges,
            elapsed_seconds,
            energy,
            time_to_next_energy_restore,
            side_effects,
        } = parts;

        Self {
            status: progress.battle_status,
            enemy: EnemyView {
                id: enemy.id,
                name: enemy.name.clone(),
                health: progress.enemy_hp,
                max_health: progress.enemy_max_hp,
                damage: report.damage_taken,
                attack: report.enemy_attack,
                animation_cue_ids: report.enemy_cues.clone(),
            },
            character: CharacterView {
                id: character.id,
                name: character.name.clone(),
                health: progress.player_hp,
                max_health: progress.player_max_hp,
                damage: report.damage_dealt,
                attack_tier: report.attack.as_ref().map(|a| a.tier),
                card: report.attack.as_ref().and_then(|a| a.card.clone()),
                animation_cue_ids: report.character_cues.clone(),
            },
            boss_special_skill: report.boss_special_skill,
            curse_armed: report.curse_armed,
            timer_display: format_timer(elapsed_seconds),
            energy,
            time_to_next_energy_restore,
            is_enemy_frozen: report.is_enemy_frozen,
            is_bonus_round: is_bonus_round(
                progress.enemy_hp,
                progress.answered_count(),
                total_challenges,
            ) && !progress.is_terminal(),
            answered_challenges: progress.answered_count(),
            total_challenges,
            rewards: progress.accumulated_reward(),
            side_effects,
        }
    }
}

/// Snapshot returned when entering or retrying a level.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatState {
    pub progress: CombatProgress,
    pub is_boss: bool,
    pub is_bonus_round: bool,
    pub total_challenges: u32,
    pub energy: u32,
    pub time_to_next_energy_restore: u64,
}
