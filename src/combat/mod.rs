//! Combat resolution: per-turn state machine, attack tiers, bonus rounds
//! and boss curses.

pub mod bonus;
pub mod curse;
pub mod progress;
pub mod resolver;
pub mod rules;
pub mod tiers;
pub mod types;

pub use bonus::is_bonus_round;
pub use progress::{AnswerRecord, CombatProgress};
pub use resolver::{resolve_turn, TurnContext, TurnOutcome, TurnReport};
pub use rules::CombatRules;
pub use tiers::{select_attack, AttackSelection, TierContext};
pub use types::*;
