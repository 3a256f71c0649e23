//! Read-only template data: characters, enemies, challenges, levels,
//! player profiles and the character card table.

pub mod cards;
pub mod memory;
pub mod types;

pub use cards::{CardMetadata, CardTable};
pub use memory::InMemoryCatalog;
pub use types::*;

/// Template lookups consumed by the engine. Implementations are read-only
/// from the engine's point of view.
#[allow(async_fn_in_trait)]
pub trait TemplateCatalog {
    async fn player(&self, id: PlayerId) -> Option<PlayerProfile>;
    async fn character(&self, id: u32) -> Option<CharacterTemplate>;
    async fn enemy(&self, id: u32) -> Option<EnemyTemplate>;
    async fn level(&self, id: u32) -> Option<LevelTemplate>;
    async fn challenge(&self, id: u32) -> Option<ChallengeTemplate>;
}
