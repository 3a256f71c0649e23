//! Once-per-win finalization.
//!
//! Planning is pure and guarded by `is_completed`; execution talks to the
//! collaborators and swallows their failures so a finished fight is never
//! rolled back because a ledger call failed. Effects that went through are
//! settled on the record; the rest stay pending and are resent later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ledger::{LevelUnlocker, QuestTracker, QuestType, RewardsLedger};
use crate::catalog::{LevelRef, PlayerId, Reward};
use crate::combat::progress::CombatProgress;
use crate::combat::types::BattleStatus;

/// A request for a collaborator, produced by a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum SideEffect {
    QuestProgress { quest: QuestType, amount: u32 },
    GrantRewards { reward: Reward },
    UnlockLevel { level: LevelRef },
}

/// Marks a won record completed and lists what it earned. Returns nothing
/// for a record that is not won or was already completed.
pub fn plan_finalization(
    progress: &mut CombatProgress,
    is_boss: bool,
    next_level: Option<LevelRef>,
    now: DateTime<Utc>,
) -> Vec<SideEffect> {
    if progress.battle_status != BattleStatus::Won || progress.is_completed {
        return Vec::new();
    }
    progress.is_completed = true;
    progress.completed_at = Some(now);
    pending_effects(progress, is_boss, next_level)
}

/// Effects a completed win earned that have not gone through yet. The
/// record is frozen once won, so the list is stable across retries.
pub fn pending_effects(
    progress: &CombatProgress,
    is_boss: bool,
    next_level: Option<LevelRef>,
) -> Vec<SideEffect> {
    if progress.battle_status != BattleStatus::Won || !progress.is_completed {
        return Vec::new();
    }

    let mut quests = vec![QuestType::DefeatEnemy];
    if is_boss {
        quests.push(QuestType::DefeatBoss);
    }
    let perfect = progress.is_perfect_run();

    let mut effects: Vec<SideEffect> = quests
        .into_iter()
        .filter(|quest| !progress.credited_quests.contains(quest))
        .map(|quest| SideEffect::QuestProgress { quest, amount: 1 })
        .collect();
    if !progress.rewards_granted {
        effects.push(SideEffect::GrantRewards {
            reward: progress.accumulated_reward(),
        });
    }
    if perfect && !progress.credited_quests.contains(&QuestType::PerfectRun) {
        effects.push(SideEffect::QuestProgress {
            quest: QuestType::PerfectRun,
            amount: 1,
        });
    }
    if !progress.level_unlocked {
        effects.extend(next_level.map(|level| SideEffect::UnlockLevel { level }));
    }
    effects
}

/// What actually went through when the side effects were executed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalizationReport {
    pub granted: Option<Reward>,
    pub quests: Vec<QuestType>,
    pub unlocked: Option<LevelRef>,
    pub failures: Vec<String>,
}

impl FinalizationReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Marks what went through on the record so it is never sent again.
    /// Returns whether anything changed.
    pub fn settle(&self, progress: &mut CombatProgress) -> bool {
        let mut changed = false;
        if self.granted.is_some() && !progress.rewards_granted {
            progress.rewards_granted = true;
            changed = true;
        }
        for quest in &self.quests {
            changed |= progress.credited_quests.insert(*quest);
        }
        if self.unlocked.is_some() && !progress.level_unlocked {
            progress.level_unlocked = true;
            changed = true;
        }
        changed
    }
}

pub struct Finalizer<'a, L> {
    ledger: &'a L,
}

impl<'a, L> Finalizer<'a, L>
where
    L: RewardsLedger + QuestTracker + LevelUnlocker,
{
    pub fn new(ledger: &'a L) -> Self {
        Self { ledger }
    }

    /// Runs every effect in order. Failures are logged and collected, never
    /// returned.
    pub async fn execute(&self, player: PlayerId, effects: &[SideEffect]) -> FinalizationReport {
        let mut report = FinalizationReport::default();
        for effect in effects {
            let result = match *effect {
                SideEffect::QuestProgress { quest, amount } => self
                    .ledger
                    .increment(player, quest, amount)
                    .await
                    .map(|_| report.quests.push(quest)),
                SideEffect::GrantRewards { reward } => self
                    .ledger
                    .grant(player, reward)
                    .await
                    .map(|_| report.granted = Some(reward)),
                SideEffect::UnlockLevel { level } => self
                    .ledger
                    .unlock(player, level.map_id, level.level_id)
                    .await
                    .map(|_| report.unlocked = Some(level)),
            };
            if let Err(e) = result {
                tracing::warn!(player = %player, effect = ?effect, error = %e, "finalization step failed");
                report.failures.push(e.to_string());
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::ledger::InMemoryLedger;
    use uuid::Uuid;

    const NEXT: LevelRef = LevelRef {
        map_id: 1,
        level_id: 2,
    };

    fn won_progress() -> CombatProgress {
        let mut p = CombatProgress::new(Uuid::new_v4(), 1, 60, 100, Utc::now());
        p.enemy_hp = 0;
        p.battle_status = BattleStatus::Won;
        p.add_reward(Reward { coins: 10, points: 20, exp: 5 });
        p
    }

    #[test]
    fn test_plan_for_perfect_boss_win() {
        let mut p = won_progress();
        let effects = plan_finalization(&mut p, true, Some(NEXT), Utc::now());
        assert!(p.is_completed);
        assert!(p.completed_at.is_some());
        assert_eq!(
            effects,
            vec![
                SideEffect::QuestProgress { quest: QuestType::DefeatEnemy, amount: 1 },
                SideEffect::QuestProgress { quest: QuestType::DefeatBoss, amount: 1 },
                SideEffect::GrantRewards { reward: Reward { coins: 10, points: 20, exp: 5 } },
                SideEffect::QuestProgress { quest: QuestType::PerfectRun, amount: 1 },
                SideEffect::UnlockLevel { level: NEXT },
            ]
        );
    }

    #[test]
    fn test_plan_skips_perfect_run_after_damage() {
        let mut p = won_progress();
        p.damage_player(5);
        let effects = plan_finalization(&mut p, false, None, Utc::now());
        assert!(!effects.contains(&SideEffect::QuestProgress {
            quest: QuestType::PerfectRun,
            amount: 1
        }));
        assert!(!effects
            .iter()
            .any(|e| matches!(e, SideEffect::QuestProgress { quest: QuestType::DefeatBoss, .. })));
    }

    #[test]
    fn test_plan_is_once_only() {
        let mut p = won_progress();
        let first = plan_finalization(&mut p, false, Some(NEXT), Utc::now());
        assert!(!first.is_empty());
        let completed_at = p.completed_at;
        let second = plan_finalization(&mut p, false, Some(NEXT), Utc::now());
        assert!(second.is_empty());
        assert_eq!(p.completed_at, completed_at);
    }

    #[test]
    fn test_plan_ignores_unfinished_records() {
        let mut p = won_progress();
        p.battle_status = BattleStatus::Lost;
        assert!(plan_finalization(&mut p, false, Some(NEXT), Utc::now()).is_empty());
        assert!(!p.is_completed);
    }

    #[test]
    fn test_pending_effects_skip_settled() {
        let mut p = won_progress();
        let all = plan_finalization(&mut p, true, Some(NEXT), Utc::now());
        assert_eq!(pending_effects(&p, true, Some(NEXT)), all);

        p.rewards_granted = true;
        p.credited_quests.insert(QuestType::DefeatEnemy);
        p.credited_quests.insert(QuestType::PerfectRun);
        assert_eq!(
            pending_effects(&p, true, Some(NEXT)),
            vec![
                SideEffect::QuestProgress { quest: QuestType::DefeatBoss, amount: 1 },
                SideEffect::UnlockLevel { level: NEXT },
            ]
        );
        assert_eq!(pending_effects(&p, true, None).len(), 1);

        p.credited_quests.insert(QuestType::DefeatBoss);
        p.level_unlocked = true;
        assert!(pending_effects(&p, true, Some(NEXT)).is_empty());
    }

    #[test]
    fn test_pending_effects_need_completed_win() {
        let p = won_progress();
        assert!(pending_effects(&p, false, Some(NEXT)).is_empty());
    }

    #[tokio::test]
    async fn test_execute_applies_all_effects() {
        let ledger = InMemoryLedger::new();
        let mut p = won_progress();
        let effects = plan_finalization(&mut p, true, Some(NEXT), Utc::now());
        let report = Finalizer::new(&ledger).execute(p.player_id, &effects).await;
        assert!(report.is_clean());
        assert_eq!(report.unlocked, Some(NEXT));
        assert_eq!(ledger.quest_progress(p.player_id, QuestType::DefeatBoss).await, 1);
        assert_eq!(
            ledger.total_granted(p.player_id).await,
            Reward { coins: 10, points: 20, exp: 5 }
        );
        assert!(ledger.is_unlocked(p.player_id, NEXT).await);
    }

    #[tokio::test]
    async fn test_unlock_failure_is_swallowed() {
        let ledger = InMemoryLedger::new();
        ledger.set_fail_unlocks(true);
        let mut p = won_progress();
        let effects = plan_finalization(&mut p, false, Some(NEXT), Utc::now());
        let report = Finalizer::new(&ledger).execute(p.player_id, &effects).await;
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.unlocked, None);
        assert!(report.granted.is_some());
        assert_eq!(ledger.quest_progress(p.player_id, QuestType::DefeatEnemy).await, 1);

        assert!(report.settle(&mut p));
        assert_eq!(
            pending_effects(&p, false, Some(NEXT)),
            vec![SideEffect::UnlockLevel { level: NEXT }]
        );
    }

    #[tokio::test]
    async fn test_failed_grant_is_resent_once() {
        let ledger = InMemoryLedger::new();
        ledger.set_fail_grants(true);
        let mut p = won_progress();
        let finalizer = Finalizer::new(&ledger);
        let effects = plan_finalization(&mut p, false, None, Utc::now());
        finalizer.execute(p.player_id, &effects).await.settle(&mut p);
        assert!(!p.rewards_granted);
        assert_eq!(ledger.grant_count(p.player_id).await, 0);

        ledger.set_fail_grants(false);
        let retry = pending_effects(&p, false, None);
        assert_eq!(retry.len(), 1);
        finalizer.execute(p.player_id, &retry).await.settle(&mut p);
        assert!(p.rewards_granted);
        assert!(pending_effects(&p, false, None).is_empty());
        assert_eq!(ledger.grant_count(p.player_id).await, 1);
        assert_eq!(ledger.quest_progress(p.player_id, QuestType::DefeatEnemy).await, 1);
    }

    #[tokio::test]
    async fn test_second_finalization_grants_nothing() {
        let ledger = InMemoryLedger::new();
        let mut p = won_progress();
        let finalizer = Finalizer::new(&ledger);
        let effects = plan_finalization(&mut p, false, None, Utc::now());
        finalizer.execute(p.player_id, &effects).await;
        let again = plan_finalization(&mut p, false, None, Utc::now());
        finalizer.execute(p.player_id, &again).await;
        assert_eq!(ledger.grant_count(p.player_id).await, 1);
    }
}
