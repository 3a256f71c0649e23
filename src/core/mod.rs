//! Core constants, configuration and error types shared by every engine module.

pub mod config;
pub mod constants;
pub mod error;

pub use config::{BossCurseEntry, EngineConfig};
pub use constants::*;
pub use error::{CombatError, CombatResult, Missing};
