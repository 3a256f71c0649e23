use serde::{Deserialize, Serialize};

/// Builds an animation cue id like `boss_joshy_special_attack`.
pub fn animation_cue(subject: &str, action: &str) -> String {
    let subject: String = subject
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("{}_{}", subject, action)
}

/// Outcome state of an encounter. `Won` and `Lost` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleStatus {
    #[default]
    InProgress,
    Won,
    Lost,
}

impl BattleStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BattleStatus::InProgress)
    }
}

/// Strength of a character attack, chosen per correct answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackTier {
    Basic,
    Second,
    Third,
    Special,
}

impl AttackTier {
    pub const ALL: [AttackTier; 4] = [
        AttackTier::Basic,
        AttackTier::Second,
        AttackTier::Third,
        AttackTier::Special,
    ];

    /// Position in a character damage table.
    pub fn index(&self) -> usize {
        match self {
            AttackTier::Basic => 0,
            AttackTier::Second => 1,
            AttackTier::Third => 2,
            AttackTier::Special => 3,
        }
    }

    /// Animation action name for this tier.
    pub fn action(&self) -> &'static str {
        match self {
            AttackTier::Basic => "basic_attack",
            AttackTier::Second => "second_attack",
            AttackTier::Third => "third_attack",
            AttackTier::Special => "special_attack",
        }
    }
}

/// Boss-specific status armed by a wrong-answer streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossCurse {
    Shield,
    Reverse,
    Shuffle,
    Permuted,
    ForceBasicAttack,
    MutualDamage,
}

impl BossCurse {
    pub const ALL: [BossCurse; 6] = [
        BossCurse::Shield,
        BossCurse::Reverse,
        BossCurse::Shuffle,
        BossCurse::Permuted,
        BossCurse::ForceBasicAttack,
        BossCurse::MutualDamage,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            BossCurse::Shield => "shield",
            BossCurse::Reverse => "reverse",
            BossCurse::Shuffle => "shuffle",
            BossCurse::Permuted => "permuted",
            BossCurse::ForceBasicAttack => "force_basic_attack",
            BossCurse::MutualDamage => "mutual_damage",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.tag() == tag)
    }
}

/// How the enemy answered a wrong answer this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "curse")]
pub enum EnemyAttack {
    Basic,
    /// Themed attack replacing the basic one while a curse is armed
    Special(BossCurse),
    /// Freeze potion held the enemy in place
    Frozen,
}

/// Single-use consumables that arm a transient combat flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Potion {
    /// Doubles the damage of the next correct answer
    Strong,
    /// Cancels the next enemy counterattack
    Freeze,
}
