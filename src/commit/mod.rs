//! Transactional commit of confirmed rewards and programs.

pub mod engine;
pub mod staged;
pub mod store;

pub use engine::{CommitEngine, CommitError, CommitSelection, CommitSummary};
pub use staged::{PersistedReward, RewardStatus, CATEGORY_INDIVIDUAL};
pub use store::{RewardStore, SqliteRewardStore};
