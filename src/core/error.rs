//! Error taxonomy for combat turns and their collaborators.

use std::fmt;
use thiserror::Error;

/// Which lookup came back empty. Each one is reported separately so a
/// missing level is never confused with a missing progress record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Player,
    Character,
    Level,
    Enemy,
    Challenge,
    Progress,
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Missing::Player => "player",
            Missing::Character => "character",
            Missing::Level => "level",
            Missing::Enemy => "enemy",
            Missing::Challenge => "challenge",
            Missing::Progress => "combat progress",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while resolving a combat turn.
#[derive(Debug, Error)]
pub enum CombatError {
    /// A referenced record does not exist.
    #[error("{0} not found")]
    NotFound(Missing),

    /// Identifiers could not be parsed, or a template carries an
    /// unrecognized classification.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A rewards, quest or unlock collaborator failed.
    #[error("dependency failure: {0}")]
    DependencyFailure(String),

    /// The progress record changed between read and write.
    #[error("combat progress was modified concurrently; retry the turn")]
    StaleWrite,
}

impl CombatError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        CombatError::InvalidInput(msg.into())
    }

    pub fn dependency(msg: impl Into<String>) -> Self {
        CombatError::DependencyFailure(msg.into())
    }
}

/// Result type for combat operations.
pub type CombatResult<T> = Result<T, CombatError>;
