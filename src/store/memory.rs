use std::collections::HashMap;
use tokio::sync::RwLock;

use super::ProgressStore;
use crate::catalog::PlayerId;
use crate::combat::CombatProgress;
use crate::core::error::{CombatError, CombatResult, Missing};

#[derive(Debug, Default)]
pub struct InMemoryProgressStore {
    records: RwLock<HashMap<(PlayerId, u32), CombatProgress>>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl ProgressStore for InMemoryProgressStore {
    async fn get(&self, player: PlayerId, level_id: u32) -> CombatResult<Option<CombatProgress>> {
        Ok(self.records.read().await.get(&(player, level_id)).cloned())
    }

    async fn create(&self, mut progress: CombatProgress) -> CombatResult<CombatProgress> {
        let mut records = self.records.write().await;
        let key = (progress.player_id, progress.level_id);
        // Keep versions increasing across re-creation so stale writers fail
        progress.version = records.get(&key).map_or(0, |old| old.version + 1);
        records.insert(key, progress.clone());
        Ok(progress)
    }

    async fn update(&self, progress: &CombatProgress) -> CombatResult<CombatProgress> {
        let mut records = self.records.write().await;
        let key = (progress.player_id, progress.level_id);
        let stored = records
            .get_mut(&key)
            .ok_or(CombatError::NotFound(Missing::Progress))?;
        if stored.version != progress.version || stored.id != progress.id {
            return Err(CombatError::StaleWrite);
        }
        let mut next = progress.clone();
        next.version += 1;
        *stored = next.clone();
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn record(player: PlayerId) -> CombatProgress {
        CombatProgress::new(player, 4, 60, 100, Utc::now())
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = InMemoryProgressStore::new();
        let player = Uuid::new_v4();
        assert!(store.get(player, 4).await.unwrap().is_none());
        store.create(record(player)).await.unwrap();
        let loaded = store.get(player, 4).await.unwrap().unwrap();
        assert_eq!(loaded.enemy_hp, 60);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_bumps_version() {
        let store = InMemoryProgressStore::new();
        let player = Uuid::new_v4();
        let mut p = store.create(record(player)).await.unwrap();
        p.enemy_hp = 50;
        let written = store.update(&p).await.unwrap();
        assert_eq!(written.version, p.version + 1);
        assert_eq!(store.get(player, 4).await.unwrap().unwrap().enemy_hp, 50);
    }

    #[tokio::test]
    async fn test_stale_write_rejected() {
        let store = InMemoryProgressStore::new();
        let player = Uuid::new_v4();
        let p = store.create(record(player)).await.unwrap();
        let mut first = p.clone();
        first.enemy_hp = 40;
        store.update(&first).await.unwrap();

        let mut second = p;
        second.enemy_hp = 30;
        let err = store.update(&second).await.unwrap_err();
        assert!(matches!(err, CombatError::StaleWrite));
        assert_eq!(store.get(player, 4).await.unwrap().unwrap().enemy_hp, 40);
    }

    #[tokio::test]
    async fn test_recreate_invalidates_old_copies() {
        let store = InMemoryProgressStore::new();
        let player = Uuid::new_v4();
        let old = store.create(record(player)).await.unwrap();
        store.create(record(player)).await.unwrap();
        assert!(matches!(
            store.update(&old).await,
            Err(CombatError::StaleWrite)
        ));
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let store = InMemoryProgressStore::new();
        let err = store.update(&record(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, CombatError::NotFound(Missing::Progress)));
    }
}
