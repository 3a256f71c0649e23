use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::request::TurnRequest;
use super::result::{CombatState, ResultParts, TurnResult};
use crate::catalog::{
    CardTable, CharacterTemplate, EnemyDifficulty, EnemyTemplate, LevelTemplate, PlayerId,
    PlayerProfile, TemplateCatalog,
};
use crate::combat::resolver::{resolve_turn, TurnContext, TurnReport};
use crate::combat::types::animation_cue;
use crate::combat::{is_bonus_round, CombatProgress, CombatRules, Potion};
use crate::core::error::{CombatError, CombatResult, Missing};
use crate::core::EngineConfig;
use crate::progression::{
    pending_effects, Finalizer, LevelUnlocker, QuestTracker, RewardsLedger, SideEffect,
};
use crate::store::ProgressStore;

type RecordKey = (PlayerId, u32);

/// Templates for one (player, level) encounter, looked up before any
/// mutation so a missing piece never leaves a partial write.
struct Encounter {
    player: PlayerProfile,
    character: CharacterTemplate,
    level: LevelTemplate,
    enemy: EnemyTemplate,
    rules: CombatRules,
}

impl Encounter {
    fn total_challenges(&self) -> u32 {
        self.level.total_challenges()
    }
}

/// Runs combat turns against the progress store and collaborators.
///
/// Turns for the same (player, level) are serialized through a per-record
/// lock, and every write is a versioned compare-and-swap, so turn N's write
/// is always what turn N+1 reads.
pub struct CombatEngine<S, C, L> {
    store: S,
    catalog: C,
    ledger: L,
    config: EngineConfig,
    cards: CardTable,
    locks: Mutex<HashMap<RecordKey, Arc<Mutex<()>>>>,
}

impl<S, C, L> CombatEngine<S, C, L>
where
    S: ProgressStore,
    C: TemplateCatalog,
    L: RewardsLedger + QuestTracker + LevelUnlocker,
{
    pub fn new(store: S, catalog: C, ledger: L, config: EngineConfig, cards: CardTable) -> Self {
        Self {
            store,
            catalog,
            ledger,
            config,
            cards,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    async fn record_lock(&self, key: RecordKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(key).or_default().clone()
    }

    /// Drops the record's lock entry unless another caller is holding or
    /// waiting on it.
    async fn release_lock(&self, key: RecordKey, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // One reference in the map, one here
        if Arc::strong_count(&lock) <= 2 {
            locks.remove(&key);
        }
    }

    async fn load_encounter(&self, player_id: PlayerId, level_id: u32) -> CombatResult<Encounter> {
        let player = self
            .catalog
            .player(player_id)
            .await
            .ok_or(CombatError::NotFound(Missing::Player))?;
        let character = self
            .catalog
            .character(player.character_id)
            .await
            .ok_or(CombatError::NotFound(Missing::Character))?;
        let level = self
            .catalog
            .level(level_id)
            .await
            .ok_or(CombatError::NotFound(Missing::Level))?;
        let difficulty: EnemyDifficulty = level.enemy_difficulty()?;
        let enemy = self
            .catalog
            .enemy(level.enemy_id)
            .await
            .ok_or(CombatError::NotFound(Missing::Enemy))?;
        let rules = CombatRules::for_encounter(difficulty, &enemy, &self.config);
        Ok(Encounter {
            player,
            character,
            level,
            enemy,
            rules,
        })
    }

    fn fresh_progress(&self, encounter: &Encounter) -> CombatProgress {
        CombatProgress::new(
            encounter.player.id,
            encounter.level.id,
            encounter.rules.enemy_max_hp(encounter.total_challenges()),
            encounter.character.max_hp,
            Utc::now(),
        )
    }

    fn state_view(&self, encounter: &Encounter, progress: CombatProgress) -> CombatState {
        let total = encounter.total_challenges();
        CombatState {
            is_bonus_round: is_bonus_round(progress.enemy_hp, progress.answered_count(), total)
                && !progress.is_terminal(),
            progress,
            is_boss: encounter.rules.is_boss,
            total_challenges: total,
            energy: encounter.player.energy,
            time_to_next_energy_restore: encounter
                .player
                .seconds_to_next_energy(Utc::now(), self.config.energy_restore_seconds),
        }
    }

    /// Returns the record for (player, level), creating it with full HP on
    /// first entry.
    pub async fn fetch_combat_state(
        &self,
        player_id: PlayerId,
        level_id: u32,
    ) -> CombatResult<CombatState> {
        let key = (player_id, level_id);
        let lock = self.record_lock(key).await;
        let result = {
            let _guard = lock.lock().await;
            self.fetch_locked(player_id, level_id).await
        };
        self.release_lock(key, lock).await;
        result
    }

    async fn fetch_locked(&self, player_id: PlayerId, level_id: u32) -> CombatResult<CombatState> {
        let encounter = self.load_encounter(player_id, level_id).await?;
        let progress = match self.store.get(player_id, level_id).await? {
            Some(existing) => existing,
            None => {
                tracing::debug!(player = %player_id, level = level_id, "creating combat progress");
                self.store.create(self.fresh_progress(&encounter)).await?
            }
        };
        Ok(self.state_view(&encounter, progress))
    }

    /// Replaces the record with a fresh one.
    pub async fn retry_level(&self, player_id: PlayerId, level_id: u32) -> CombatResult<CombatState> {
        let key = (player_id, level_id);
        let lock = self.record_lock(key).await;
        let result = {
            let _guard = lock.lock().await;
            self.retry_locked(player_id, level_id).await
        };
        self.release_lock(key, lock).await;
        result
    }

    async fn retry_locked(&self, player_id: PlayerId, level_id: u32) -> CombatResult<CombatState> {
        let encounter = self.load_encounter(player_id, level_id).await?;
        let progress = self.store.create(self.fresh_progress(&encounter)).await?;
        tracing::info!(player = %player_id, level = level_id, "level retried");
        Ok(self.state_view(&encounter, progress))
    }

    /// Arms a single-use potion effect for the next applicable turn.
    pub async fn use_potion(
        &self,
        player_id: PlayerId,
        level_id: u32,
        potion: Potion,
    ) -> CombatResult<CombatProgress> {
        let key = (player_id, level_id);
        let lock = self.record_lock(key).await;
        let result = {
            let _guard = lock.lock().await;
            self.potion_locked(player_id, level_id, potion).await
        };
        self.release_lock(key, lock).await;
        result
    }

    async fn potion_locked(
        &self,
        player_id: PlayerId,
        level_id: u32,
        potion: Potion,
    ) -> CombatResult<CombatProgress> {
        let mut progress = self
            .store
            .get(player_id, level_id)
            .await?
            .ok_or(CombatError::NotFound(Missing::Progress))?;
        if progress.is_terminal() {
            return Err(CombatError::invalid("battle is already over"));
        }
        progress.arm_potion(potion);
        self.store.update(&progress).await
    }

    /// Resolves one answer event and persists the result.
    pub async fn resolve_turn(&self, request: &TurnRequest) -> CombatResult<TurnResult> {
        let key = (request.player_id, request.level_id);
        let lock = self.record_lock(key).await;
        let result = {
            let _guard = lock.lock().await;
            self.resolve_locked(request).await
        };
        self.release_lock(key, lock).await;
        result
    }

    async fn resolve_locked(&self, request: &TurnRequest) -> CombatResult<TurnResult> {
        let encounter = self
            .load_encounter(request.player_id, request.level_id)
            .await?;
        if request.enemy_id != encounter.enemy.id {
            return Err(CombatError::invalid(format!(
                "enemy {} does not belong to level {}",
                request.enemy_id, request.level_id
            )));
        }
        let challenge = match request.challenge_id {
            Some(id) => {
                if !encounter.level.challenge_ids.contains(&id) {
                    return Err(CombatError::invalid(format!(
                        "challenge {} is not part of level {}",
                        id, request.level_id
                    )));
                }
                Some(
                    self.catalog
                        .challenge(id)
                        .await
                        .ok_or(CombatError::NotFound(Missing::Challenge))?,
                )
            }
            None => None,
        };
        let progress = self
            .store
            .get(request.player_id, request.level_id)
            .await?
            .ok_or(CombatError::NotFound(Missing::Progress))?;

        if progress.is_terminal() {
            return self.replay_terminal(&encounter, progress, request).await;
        }

        let ctx = TurnContext {
            character: &encounter.character,
            enemy: &encounter.enemy,
            challenge: challenge.as_ref(),
            answer: &request.answer,
            answer_correct: request.answer_correct,
            total_challenges: encounter.total_challenges(),
            next_level: encounter.level.next_level,
            hints: request.hints(),
            now: Utc::now(),
        };
        let outcome = resolve_turn(&progress, &encounter.rules, &ctx, &self.config, &self.cards);
        let mut written = self.store.update(&outcome.progress).await?;

        if !outcome.side_effects.is_empty() {
            written = self
                .finalize(&encounter, written, &outcome.side_effects)
                .await;
        }

        Ok(self.assemble(&encounter, &written, &outcome.report, request, outcome.side_effects))
    }

    /// A turn against a finished record changes nothing, but resends win
    /// effects that failed when the win was finalized.
    async fn replay_terminal(
        &self,
        encounter: &Encounter,
        progress: CombatProgress,
        request: &TurnRequest,
    ) -> CombatResult<TurnResult> {
        let mut report = TurnReport {
            ignored: true,
            ..TurnReport::default()
        };
        report
            .character_cues
            .push(animation_cue(&encounter.character.name, "idle"));
        report
            .enemy_cues
            .push(animation_cue(&encounter.enemy.name, "idle"));

        let effects =
            pending_effects(&progress, encounter.rules.is_boss, encounter.level.next_level);
        let progress = if effects.is_empty() {
            progress
        } else {
            self.finalize(encounter, progress, &effects).await
        };
        Ok(self.assemble(encounter, &progress, &report, request, effects))
    }

    /// Executes finalization effects and settles the ones that went
    /// through. Collaborator failures never fail the turn.
    async fn finalize(
        &self,
        encounter: &Encounter,
        progress: CombatProgress,
        effects: &[SideEffect],
    ) -> CombatProgress {
        let report = Finalizer::new(&self.ledger)
            .execute(progress.player_id, effects)
            .await;

        let mut settled = progress.clone();
        if !report.settle(&mut settled) {
            return progress;
        }
        match self.store.update(&settled).await {
            Ok(written) => written,
            Err(e) => {
                // The effects went through; they may be resent on the next turn
                tracing::warn!(
                    player = %progress.player_id,
                    level = encounter.level.id,
                    error = %e,
                    "could not record settled win effects"
                );
                progress
            }
        }
    }

    fn assemble(
        &self,
        encounter: &Encounter,
        progress: &CombatProgress,
        report: &TurnReport,
        request: &TurnRequest,
        side_effects: Vec<SideEffect>,
    ) -> TurnResult {
        TurnResult::assemble(ResultParts {
            progress,
            report,
            character: &encounter.character,
            enemy: &encounter.enemy,
            total_challenges: encounter.total_challenges(),
            elapsed_seconds: request.elapsed_seconds,
            energy: encounter.player.energy,
            time_to_next_energy_restore: encounter
                .player
                .seconds_to_next_energy(Utc::now(), self.config.energy_restore_seconds),
            side_effects,
        })
    }
}
