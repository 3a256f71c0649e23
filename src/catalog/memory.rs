//! HashMap-backed catalog for tests and the simulator.

use std::collections::HashMap;

use super::types::*;
use super::TemplateCatalog;

#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    players: HashMap<PlayerId, PlayerProfile>,
    characters: HashMap<u32, CharacterTemplate>,
    enemies: HashMap<u32, EnemyTemplate>,
    levels: HashMap<u32, LevelTemplate>,
    challenges: HashMap<u32, ChallengeTemplate>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_player(mut self, player: PlayerProfile) -> Self {
        self.players.insert(player.id, player);
        self
    }

    pub fn with_character(mut self, character: CharacterTemplate) -> Self {
        self.characters.insert(character.id, character);
        self
    }

    pub fn with_enemy(mut self, enemy: EnemyTemplate) -> Self {
        self.enemies.insert(enemy.id, enemy);
        self
    }

    pub fn with_level(mut self, level: LevelTemplate) -> Self {
        self.levels.insert(level.id, level);
        self
    }

    pub fn with_challenge(mut self, challenge: ChallengeTemplate) -> Self {
        self.challenges.insert(challenge.id, challenge);
        self
    }
}

impl TemplateCatalog for InMemoryCatalog {
    async fn player(&self, id: PlayerId) -> Option<PlayerProfile> {
        self.players.get(&id).cloned()
    }

    async fn character(&self, id: u32) -> Option<CharacterTemplate> {
        self.characters.get(&id).cloned()
    }

    async fn enemy(&self, id: u32) -> Option<EnemyTemplate> {
        self.enemies.get(&id).cloned()
    }

    async fn level(&self, id: u32) -> Option<LevelTemplate> {
        self.levels.get(&id).cloned()
    }

    async fn challenge(&self, id: u32) -> Option<ChallengeTemplate> {
        self.challenges.get(&id).cloned()
    }
}
