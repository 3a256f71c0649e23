//! quizbattle - combat resolution engine for a quiz-driven RPG.
//!
//! Each answer to a coding challenge is one combat turn: correct answers
//! attack the enemy, wrong ones let it counterattack. Knocking the enemy
//! out before every challenge is answered starts a bonus round; bosses arm
//! curses on wrong-answer streaks; wins grant rewards and unlock the next
//! level exactly once.

pub mod catalog;
pub mod combat;
pub mod core;
pub mod engine;
pub mod progression;
pub mod store;

pub use crate::core::error::{CombatError, CombatResult};
pub use engine::{CombatEngine, TurnRequest, TurnResult};
