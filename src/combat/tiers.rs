//! Attack tier selection for correct answers.

use crate::catalog::{CardMetadata, CardTable, CharacterTemplate};
use crate::core::EngineConfig;

use super::types::{animation_cue, AttackTier};

/// Everything the tier choice depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierContext {
    pub is_bonus_round: bool,
    pub is_completing_bonus: bool,
    pub bonus_all_correct: bool,
    pub already_answered_correctly: bool,
    pub was_ever_wrong: bool,
    pub correct_answer_length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackSelection {
    pub tier: AttackTier,
    pub damage: u32,
    pub animation_cue: String,
    /// `None` for the card-less finale and for tiers without art
    pub card: Option<CardMetadata>,
    /// Bonus sequence finished with every answer correct
    pub is_finale: bool,
}

/// Escalates by answer length: longer answers hit harder.
fn tier_by_length(length: usize, config: &EngineConfig) -> AttackTier {
    if length >= config.third_tier_min_length {
        AttackTier::Third
    } else if length >= config.second_tier_min_length {
        AttackTier::Second
    } else {
        AttackTier::Basic
    }
}

/// Picks the tier and whether it is the finale variant.
pub fn select_tier(ctx: &TierContext, config: &EngineConfig) -> (AttackTier, bool) {
    if ctx.is_bonus_round && ctx.is_completing_bonus {
        if ctx.bonus_all_correct {
            return (AttackTier::Special, true);
        }
        return (AttackTier::Third, false);
    }
    if ctx.is_bonus_round {
        return (tier_by_length(ctx.correct_answer_length, config), false);
    }
    // Only a clean first solve escalates outside the bonus round
    if !ctx.already_answered_correctly && !ctx.was_ever_wrong {
        return (tier_by_length(ctx.correct_answer_length, config), false);
    }
    (AttackTier::Basic, false)
}

/// Resolves tier, damage, animation cue and card for a correct answer.
pub fn select_attack(
    ctx: &TierContext,
    character: &CharacterTemplate,
    config: &EngineConfig,
    cards: &CardTable,
) -> AttackSelection {
    let (tier, is_finale) = select_tier(ctx, config);
    attack_for_tier(tier, is_finale, character, config, cards)
}

/// Builds the selection for an already chosen tier.
pub fn attack_for_tier(
    tier: AttackTier,
    is_finale: bool,
    character: &CharacterTemplate,
    config: &EngineConfig,
    cards: &CardTable,
) -> AttackSelection {
    let damage = character.damage_for(tier, &config.default_damage_table);
    let (cue, card) = if is_finale {
        (animation_cue(&character.name, "special_attack_finale"), None)
    } else {
        (
            animation_cue(&character.name, tier.action()),
            cards.get(character.id, tier).cloned(),
        )
    };
    AttackSelection {
        tier,
        damage,
        animation_cue: cue,
        card,
        is_finale,
    }
}
