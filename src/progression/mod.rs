//! Win finalization: quest credit, reward grants and next-level unlocks.

pub mod finalizer;
pub mod ledger;

pub use finalizer::{pending_effects, plan_finalization, FinalizationReport, Finalizer, SideEffect};
pub use ledger::{InMemoryLedger, LevelUnlocker, QuestTracker, QuestType, RewardsLedger};
