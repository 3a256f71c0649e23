//! Turn orchestration: loads templates and progress, serializes turns per
//! record, resolves, writes back and finalizes wins.

pub mod request;
pub mod result;
mod runner;

pub use request::TurnRequest;
pub use result::{format_timer, CharacterView, CombatState, EnemyView, TurnResult};
pub use runner::CombatEngine;
