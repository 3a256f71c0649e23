//! Reward, quest and unlock collaborators.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::catalog::{LevelRef, PlayerId, Reward};
use crate::core::error::{CombatError, CombatResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestType {
    DefeatEnemy,
    DefeatBoss,
    PerfectRun,
}

#[allow(async_fn_in_trait)]
pub trait RewardsLedger {
    async fn grant(&self, player: PlayerId, reward: Reward) -> CombatResult<()>;
}

#[allow(async_fn_in_trait)]
pub trait QuestTracker {
    async fn increment(&self, player: PlayerId, quest: QuestType, amount: u32) -> CombatResult<()>;
}

/// Unlocking an already unlocked level must be a no-op.
#[allow(async_fn_in_trait)]
pub trait LevelUnlocker {
    async fn unlock(&self, player: PlayerId, map_id: u32, level_id: u32) -> CombatResult<()>;
}

#[derive(Debug, Default)]
struct LedgerState {
    grants: Vec<(PlayerId, Reward)>,
    quests: HashMap<(PlayerId, QuestType), u32>,
    unlocked: HashSet<(PlayerId, LevelRef)>,
    unlock_calls: u32,
}

/// In-memory implementation of all three collaborators. Each collaborator
/// can be switched into a failing mode to exercise error paths.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    fail_grants: AtomicBool,
    fail_quests: AtomicBool,
    fail_unlocks: AtomicBool,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_grants(&self, fail: bool) {
        self.fail_grants.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_quests(&self, fail: bool) {
        self.fail_quests.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_unlocks(&self, fail: bool) {
        self.fail_unlocks.store(fail, Ordering::SeqCst);
    }

    /// Sum of everything granted to a player.
    pub async fn total_granted(&self, player: PlayerId) -> Reward {
        let state = self.state.lock().await;
        state
            .grants
            .iter()
            .filter(|(p, _)| *p == player)
            .fold(Reward::default(), |acc, (_, r)| Reward {
                coins: acc.coins + r.coins,
                points: acc.points + r.points,
                exp: acc.exp + r.exp,
            })
    }

    pub async fn grant_count(&self, player: PlayerId) -> usize {
        let state = self.state.lock().await;
        state.grants.iter().filter(|(p, _)| *p == player).count()
    }

    pub async fn quest_progress(&self, player: PlayerId, quest: QuestType) -> u32 {
        let state = self.state.lock().await;
        state.quests.get(&(player, quest)).copied().unwrap_or(0)
    }

    pub async fn is_unlocked(&self, player: PlayerId, level: LevelRef) -> bool {
        let state = self.state.lock().await;
        state.unlocked.contains(&(player, level))
    }

    /// Successful unlock calls, including no-op repeats.
    pub async fn unlock_calls(&self) -> u32 {
        self.state.lock().await.unlock_calls
    }
}

impl RewardsLedger for InMemoryLedger {
    async fn grant(&self, player: PlayerId, reward: Reward) -> CombatResult<()> {
        if self.fail_grants.load(Ordering::SeqCst) {
            return Err(CombatError::dependency("rewards ledger unavailable"));
        }
        self.state.lock().await.grants.push((player, reward));
        Ok(())
    }
}

impl QuestTracker for InMemoryLedger {
    async fn increment(&self, player: PlayerId, quest: QuestType, amount: u32) -> CombatResult<()> {
        if self.fail_quests.load(Ordering::SeqCst) {
            return Err(CombatError::dependency("quest tracker unavailable"));
        }
        *self
            .state
            .lock()
            .await
            .quests
            .entry((player, quest))
            .or_insert(0) += amount;
        Ok(())
    }
}

impl LevelUnlocker for InMemoryLedger {
    async fn unlock(&self, player: PlayerId, map_id: u32, level_id: u32) -> CombatResult<()> {
        if self.fail_unlocks.load(Ordering::SeqCst) {
            return Err(CombatError::dependency("level unlock service unavailable"));
        }
        let mut state = self.state.lock().await;
        state.unlock_calls += 1;
        state.unlocked.insert((player, LevelRef { map_id, level_id }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_grants_accumulate_per_player() {
        let ledger = InMemoryLedger::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        ledger.grant(alice, Reward { coins: 5, points: 1, exp: 2 }).await.unwrap();
        ledger.grant(alice, Reward { coins: 5, points: 1, exp: 2 }).await.unwrap();
        ledger.grant(bob, Reward { coins: 1, points: 1, exp: 1 }).await.unwrap();
        assert_eq!(ledger.total_granted(alice).await, Reward { coins: 10, points: 2, exp: 4 });
        assert_eq!(ledger.grant_count(bob).await, 1);
    }

    #[tokio::test]
    async fn test_unlock_is_idempotent() {
        let ledger = InMemoryLedger::new();
        let player = Uuid::new_v4();
        ledger.unlock(player, 1, 2).await.unwrap();
        ledger.unlock(player, 1, 2).await.unwrap();
        assert!(ledger.is_unlocked(player, LevelRef { map_id: 1, level_id: 2 }).await);
        assert_eq!(ledger.state.lock().await.unlocked.len(), 1);
    }

    #[tokio::test]
    async fn test_failing_mode_surfaces_dependency_failure() {
        let ledger = InMemoryLedger::new();
        ledger.set_fail_quests(true);
        let err = ledger
            .increment(Uuid::new_v4(), QuestType::DefeatEnemy, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CombatError::DependencyFailure(_)));
    }
}
