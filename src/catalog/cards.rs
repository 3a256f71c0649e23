//! Card art shown for each character attack tier.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::combat::types::AttackTier;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardMetadata {
    pub name: String,
    pub image: String,
}

/// Immutable `(character, tier) -> card` lookup injected into the engine.
#[derive(Debug, Clone, Default)]
pub struct CardTable {
    cards: HashMap<(u32, AttackTier), CardMetadata>,
}

impl CardTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_card(mut self, character_id: u32, tier: AttackTier, card: CardMetadata) -> Self {
        self.cards.insert((character_id, tier), card);
        self
    }

    pub fn get(&self, character_id: u32, tier: AttackTier) -> Option<&CardMetadata> {
        self.cards.get(&(character_id, tier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_per_character_and_tier() {
        let table = CardTable::new().with_card(
            7,
            AttackTier::Second,
            CardMetadata {
                name: "Syntax Slash".to_string(),
                image: "cards/7/second.png".to_string(),
            },
        );
        assert_eq!(
            table.get(7, AttackTier::Second).map(|c| c.name.as_str()),
            Some("Syntax Slash")
        );
        assert!(table.get(7, AttackTier::Basic).is_none());
        assert!(table.get(8, AttackTier::Second).is_none());
    }
}
