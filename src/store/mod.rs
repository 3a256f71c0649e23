//! Combat progress persistence.

pub mod memory;

pub use memory::InMemoryProgressStore;

use crate::catalog::PlayerId;
use crate::combat::CombatProgress;
use crate::core::error::CombatResult;

/// Storage for one `CombatProgress` per (player, level).
///
/// `update` is a compare-and-swap on `CombatProgress::version`: it fails
/// with `CombatError::StaleWrite` if the stored record moved on since it
/// was read, and bumps the version on success.
#[allow(async_fn_in_trait)]
pub trait ProgressStore {
    async fn get(&self, player: PlayerId, level_id: u32) -> CombatResult<Option<CombatProgress>>;

    /// Stores a fresh record, replacing any existing one for the key.
    async fn create(&self, progress: CombatProgress) -> CombatResult<CombatProgress>;

    async fn update(&self, progress: &CombatProgress) -> CombatResult<CombatProgress>;
}
