//! Per-turn combat resolution.
//!
//! `resolve_turn` is pure: it takes the persisted record and one answer
//! event and returns the next record, a report for presentation and the
//! side effects a win requests. Normal enemies and bosses share this path;
//! `CombatRules` carries the differences.
//!
//! State machine:
//! `in_progress -> in_progress (stunned, enemy at 0 HP) -> won | lost`.
//! Nothing leaves `won` or `lost`.

use chrono::{DateTime, Utc};

use super::bonus::{is_bonus_round, is_encounter_cleared};
use super::curse;
use super::progress::{CombatProgress, PriorAnswer};
use super::rules::CombatRules;
use super::tiers::{attack_for_tier, select_tier, AttackSelection, TierContext};
use super::types::{animation_cue, AttackTier, BattleStatus, BossCurse, EnemyAttack};
use crate::catalog::{CardTable, ChallengeTemplate, CharacterTemplate, EnemyTemplate, LevelRef};
use crate::core::constants::STRONG_EFFECT_MULTIPLIER;
use crate::core::EngineConfig;
use crate::progression::{plan_finalization, SideEffect};

/// Flags a caller may send along with an answer. They are hints: the
/// resolver derives the real values from the record. Only `is_bonus_round`
/// can widen the phase, and only while the stored enemy is down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundHints {
    pub is_bonus_round: bool,
    pub is_completing_bonus: bool,
    pub bonus_all_correct: bool,
    pub bonus_total_questions: u32,
    pub already_answered_correctly: Option<bool>,
    pub was_ever_wrong: Option<bool>,
}

/// One answer event plus the templates it is resolved against.
#[derive(Debug, Clone, Copy)]
pub struct TurnContext<'a> {
    pub character: &'a CharacterTemplate,
    pub enemy: &'a EnemyTemplate,
    pub challenge: Option<&'a ChallengeTemplate>,
    pub answer: &'a str,
    pub answer_correct: bool,
    pub total_challenges: u32,
    pub next_level: Option<LevelRef>,
    pub hints: RoundHints,
    pub now: DateTime<Utc>,
}

/// What happened during a turn, in final values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnReport {
    /// Character attack; set on correct answers
    pub attack: Option<AttackSelection>,
    pub damage_dealt: u32,
    /// Enemy counterattack; unset in the bonus phase and on correct answers
    pub enemy_attack: Option<EnemyAttack>,
    pub damage_taken: u32,
    /// Damage reflected onto the player by the mutual-damage curse
    pub mutual_damage: u32,
    /// Curse that took effect this turn
    pub boss_special_skill: Option<BossCurse>,
    /// Curse armed at the end of this turn
    pub curse_armed: Option<BossCurse>,
    pub is_enemy_frozen: bool,
    /// The turn was answered while the enemy was stunned
    pub was_bonus_turn: bool,
    /// Enemy reached 0 HP this turn with challenges left
    pub entered_bonus_round: bool,
    pub status_changed: bool,
    /// Record was already won or lost; nothing was applied
    pub ignored: bool,
    pub character_cues: Vec<String>,
    pub enemy_cues: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub progress: CombatProgress,
    pub report: TurnReport,
    pub side_effects: Vec<SideEffect>,
}

/// Phase information derived fresh at the start of every turn.
#[derive(Debug, Clone, Copy)]
struct Phase {
    in_bonus: bool,
    completing_bonus: bool,
    answered_after: u32,
}

fn derive_phase(before: &CombatProgress, after: &CombatProgress, ctx: &TurnContext) -> Phase {
    let answered_before = before.answered_count();
    let answered_after = after.answered_count();
    let enemy_down = before.enemy_hp == 0;
    let in_bonus = is_bonus_round(before.enemy_hp, answered_before, ctx.total_challenges)
        || (enemy_down && ctx.hints.is_bonus_round);
    let completing_bonus = in_bonus && answered_after >= ctx.total_challenges;
    if ctx.hints.is_completing_bonus != completing_bonus && in_bonus {
        tracing::debug!(
            answered = answered_after,
            total = ctx.total_challenges,
            hinted = ctx.hints.is_completing_bonus,
            "completing-bonus hint differs from record"
        );
    }
    if ctx.hints.bonus_total_questions > 0 && in_bonus {
        let remaining = ctx.total_challenges.saturating_sub(answered_before);
        if remaining > ctx.hints.bonus_total_questions {
            tracing::debug!(
                remaining,
                hinted = ctx.hints.bonus_total_questions,
                "bonus question count differs from record"
            );
        }
    }
    Phase {
        in_bonus,
        completing_bonus,
        answered_after,
    }
}

/// Resolves one answer against the record.
pub fn resolve_turn(
    progress: &CombatProgress,
    rules: &CombatRules,
    ctx: &TurnContext,
    config: &EngineConfig,
    cards: &CardTable,
) -> TurnOutcome {
    let mut next = progress.clone();
    let mut report = TurnReport::default();

    if progress.is_terminal() {
        report.ignored = true;
        report.character_cues.push(animation_cue(&ctx.character.name, "idle"));
        report.enemy_cues.push(animation_cue(&ctx.enemy.name, "idle"));
        return TurnOutcome {
            progress: next,
            report,
            side_effects: Vec::new(),
        };
    }

    let prior = match ctx.challenge {
        Some(challenge) => next.record_answer(challenge.id, ctx.answer, ctx.answer_correct, ctx.now),
        None => PriorAnswer::default(),
    };
    next.record_streak(ctx.answer_correct);

    let phase = derive_phase(progress, &next, ctx);
    report.was_bonus_turn = phase.in_bonus;

    if ctx.answer_correct {
        resolve_correct(&mut next, &mut report, rules, ctx, config, cards, &prior, phase);
    } else {
        resolve_wrong(&mut next, &mut report, rules, ctx, phase);
    }

    // Any path that left the enemy down with every challenge answered wins
    if next.battle_status == BattleStatus::InProgress
        && is_encounter_cleared(next.enemy_hp, phase.answered_after, ctx.total_challenges)
    {
        next.battle_status = BattleStatus::Won;
    }

    report.status_changed = next.battle_status != progress.battle_status;
    let side_effects = match next.battle_status {
        BattleStatus::Won => {
            tracing::info!(
                player = %next.player_id,
                level = next.level_id,
                boss = rules.is_boss,
                "battle won"
            );
            report.enemy_cues.push(animation_cue(&ctx.enemy.name, "dies"));
            plan_finalization(&mut next, rules.is_boss, ctx.next_level, ctx.now)
        }
        BattleStatus::Lost => {
            tracing::info!(player = %next.player_id, level = next.level_id, "battle lost");
            report.character_cues.push(animation_cue(&ctx.character.name, "dies"));
            Vec::new()
        }
        BattleStatus::InProgress => Vec::new(),
    };

    if !next.is_terminal() && ctx.answer_correct {
        // Stunned enemies show as hurt, never dying
        report.enemy_cues.push(animation_cue(&ctx.enemy.name, "hurt"));
    }

    tracing::debug!(
        player = %next.player_id,
        level = next.level_id,
        correct = ctx.answer_correct,
        enemy_hp = next.enemy_hp,
        player_hp = next.player_hp,
        answered = phase.answered_after,
        bonus = phase.in_bonus,
        status = ?next.battle_status,
        "turn resolved"
    );

    TurnOutcome {
        progress: next,
        report,
        side_effects,
    }
}

#[allow(clippy::too_many_arguments)]
fn resolve_correct(
    next: &mut CombatProgress,
    report: &mut TurnReport,
    rules: &CombatRules,
    ctx: &TurnContext,
    config: &EngineConfig,
    cards: &CardTable,
    prior: &PriorAnswer,
    phase: Phase,
) {
    let tier_ctx = TierContext {
        is_bonus_round: phase.in_bonus,
        is_completing_bonus: phase.completing_bonus,
        bonus_all_correct: ctx.hints.bonus_all_correct,
        already_answered_correctly: prior.already_answered_correctly
            || ctx.hints.already_answered_correctly.unwrap_or(false),
        was_ever_wrong: prior.was_ever_wrong || ctx.hints.was_ever_wrong.unwrap_or(false),
        correct_answer_length: ctx.challenge.map_or(0, |c| c.answer_length()),
    };
    let (mut tier, is_finale) = select_tier(&tier_ctx, config);
    // A stunned boss cannot curse
    let boss_active = rules.is_boss && !phase.in_bonus;

    if boss_active && curse::consume(next, BossCurse::ForceBasicAttack) {
        tier = AttackTier::Basic;
        report.boss_special_skill = Some(BossCurse::ForceBasicAttack);
    }
    let attack = attack_for_tier(tier, is_finale && tier == AttackTier::Special, ctx.character, config, cards);

    let mut damage = attack.damage;
    if next.consume_strong_effect() {
        damage = damage.saturating_mul(STRONG_EFFECT_MULTIPLIER);
    }

    if boss_active && curse::consume(next, BossCurse::MutualDamage) {
        next.damage_player(damage);
        report.mutual_damage = damage;
        report.boss_special_skill = Some(BossCurse::MutualDamage);
        report
            .character_cues
            .push(animation_cue(&ctx.character.name, "hurt"));
    }

    if let Some(challenge) = ctx.challenge {
        if !prior.already_answered_correctly {
            next.add_reward(challenge.reward);
        }
    }

    next.damage_enemy(damage);
    report.damage_dealt = damage;
    report.character_cues.insert(0, attack.animation_cue.clone());
    report.attack = Some(attack);

    if next.enemy_hp == 0 {
        if phase.answered_after >= ctx.total_challenges {
            next.battle_status = BattleStatus::Won;
        } else if !phase.in_bonus {
            report.entered_bonus_round = true;
            tracing::debug!(
                player = %next.player_id,
                level = next.level_id,
                remaining = ctx.total_challenges - phase.answered_after,
                "enemy stunned, bonus round"
            );
        }
    }

    // Mutual damage can still kill the player if the enemy survived
    if next.battle_status == BattleStatus::InProgress && next.player_hp == 0 {
        next.battle_status = BattleStatus::Lost;
    }
}

fn resolve_wrong(
    next: &mut CombatProgress,
    report: &mut TurnReport,
    rules: &CombatRules,
    ctx: &TurnContext,
    phase: Phase,
) {
    if phase.in_bonus {
        // Stunned enemies cannot counterattack. A wrong last answer does
        // not undo the kill.
        if phase.completing_bonus {
            next.battle_status = BattleStatus::Won;
        }
        report.enemy_cues.push(animation_cue(&ctx.enemy.name, "idle"));
    } else if next.enemy_hp > 0 {
        let (attack, damage) = if next.consume_freeze_effect() {
            report.is_enemy_frozen = true;
            (EnemyAttack::Frozen, 0)
        } else {
            match armed_special(next, rules) {
                Some(curse) => {
                    report.boss_special_skill = Some(curse);
                    (EnemyAttack::Special(curse), ctx.enemy.special_damage())
                }
                None => (EnemyAttack::Basic, ctx.enemy.damage),
            }
        };

        let action = match attack {
            EnemyAttack::Basic => "attack".to_string(),
            EnemyAttack::Special(curse) => format!("curse_{}", curse.tag()),
            EnemyAttack::Frozen => "frozen".to_string(),
        };
        if matches!(attack, EnemyAttack::Special(_)) {
            report.enemy_cues.push(animation_cue(&ctx.enemy.name, "special_attack"));
        }
        report.enemy_cues.push(animation_cue(&ctx.enemy.name, &action));

        next.damage_player(damage);
        report.enemy_attack = Some(attack);
        report.damage_taken = damage;
        if damage > 0 {
            report
                .character_cues
                .push(animation_cue(&ctx.character.name, "hurt"));
        }

        if next.player_hp == 0 {
            next.battle_status = BattleStatus::Lost;
        }
    }

    if !phase.in_bonus && !next.is_terminal() {
        report.curse_armed = curse::activate_on_wrong(next, rules);
    }
}

/// Spends this boss's armed curse in place of the basic attack.
fn armed_special(next: &mut CombatProgress, rules: &CombatRules) -> Option<BossCurse> {
    if !rules.is_boss || !rules.special_skill_enabled {
        return None;
    }
    let curse = rules.curse?;
    // Curses that act on the player's next hit are not spent by a counterattack
    if matches!(curse, BossCurse::ForceBasicAttack | BossCurse::MutualDamage) {
        return None;
    }
    curse::consume(next, curse).then_some(curse)
}
