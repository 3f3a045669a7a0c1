//! Commit engine: PIN-gated, identifier-generating, atomic persistence of
//! a confirmed reward or program selection.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use crate::core::errors::AgentError;
use crate::core::ids::{MerchantId, ProgramId, RewardId};
use crate::domain::{Program, Reward};

use super::staged::{PersistedReward, RewardStatus};
use super::store::RewardStore;

/// What the user confirmed for commit.
#[derive(Clone, Debug, PartialEq)]
pub enum CommitSelection {
    /// A single reward.
    Reward(Reward),
    /// A program; every member reward is committed under one program id.
    Program(Program),
}

/// Summary returned after a successful commit.
#[derive(Clone, Debug, PartialEq)]
pub struct CommitSummary {
    /// Number of rewards written.
    pub rewards_committed: usize,
    /// Shared program id, when a program was committed.
    pub program_id: Option<ProgramId>,
}

/// Errors returned by [`CommitEngine::commit`].
#[derive(Debug, Error)]
pub enum CommitError {
    /// The PIN was empty; nothing was written.
    #[error("pin must not be empty")]
    InvalidPin,
    /// No merchant identity was resolved; nothing was written.
    #[error("merchant identity is not resolved")]
    NotAuthorized,
    /// A program selection with no rewards; nothing was written.
    #[error("a program commit requires at least one reward")]
    EmptySelection,
    /// The batch failed; the store guarantees no partial state.
    #[error("failed to persist rewards: {0}")]
    Persistence(#[source] AgentError),
}

/// Engine fanning a confirmed selection out to storage.
pub struct CommitEngine {
    store: Arc<dyn RewardStore>,
}

impl CommitEngine {
    /// Create an engine over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn RewardStore>) -> Self {
        Self { store }
    }

    /// Commit a confirmed selection.
    ///
    /// Callers keep the pending selection and PIN on failure so the user
    /// can retry without re-entering data; they are cleared only after a
    /// summary is returned.
    ///
    /// # Errors
    /// Returns [`CommitError::InvalidPin`], [`CommitError::NotAuthorized`],
    /// or [`CommitError::EmptySelection`] before any write is attempted;
    /// [`CommitError::Persistence`] when the atomic batch fails.
    pub async fn commit(
        &self,
        merchant: Option<&MerchantId>,
        selection: &CommitSelection,
        pin: &str,
        status: RewardStatus,
    ) -> Result<CommitSummary, CommitError> {
        let merchant = merchant.ok_or(CommitError::NotAuthorized)?;
        let pin = pin.trim();
        if pin.is_empty() {
            return Err(CommitError::InvalidPin);
        }

        let now = Utc::now();
        let base_ms = now.timestamp_millis();

        let (staged, program_id) = match selection {
            CommitSelection::Reward(reward) => {
                let staged = PersistedReward::stage(
                    reward,
                    RewardId::standalone(base_ms),
                    None,
                    merchant.clone(),
                    pin,
                    status,
                    now,
                );
                (vec![staged], None)
            }
            CommitSelection::Program(program) => {
                if program.rewards.is_empty() {
                    return Err(CommitError::EmptySelection);
                }
                let program_id = ProgramId::generate(base_ms);
                let staged = program
                    .rewards
                    .iter()
                    .enumerate()
                    .map(|(index, reward)| {
                        PersistedReward::stage(
                            reward,
                            RewardId::in_program(&program_id, base_ms, index),
                            Some((program_id.clone(), program.program_name.clone())),
                            merchant.clone(),
                            pin,
                            status,
                            now,
                        )
                    })
                    .collect();
                (staged, Some(program_id))
            }
        };

        let rewards_committed = staged.len();
        self.store
            .commit_batch(staged)
            .await
            .map_err(CommitError::Persistence)?;

        info!(
            "Committed {rewards_committed} reward(s) for merchant {merchant} as {status}{}",
            program_id
                .as_ref()
                .map(|id| format!(" (program {id})"))
                .unwrap_or_default()
        );

        Ok(CommitSummary {
            rewards_committed,
            program_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::store::{SqliteRewardStore, StoreFuture};
    use crate::core::config::StorageConfig;
    use crate::core::errors::AgentResult;
    use std::collections::HashSet;
    use tokio_rusqlite::Connection;

    async fn engine_with_store() -> (CommitEngine, Arc<SqliteRewardStore>) {
        let conn = Arc::new(Connection::open(":memory:").await.unwrap());
        let store = Arc::new(
            SqliteRewardStore::new(conn, &StorageConfig::default())
                .await
                .unwrap(),
        );
        (CommitEngine::new(store.clone()), store)
    }

    fn merchant() -> MerchantId {
        MerchantId::new("merchant-1").unwrap()
    }

    fn program_with(n: usize) -> Program {
        let rewards = (0..n)
            .map(|i| format!(r#"{{"rewardName":"Reward {i}","pointsCost":10}}"#))
            .collect::<Vec<_>>()
            .join(",");
        serde_json::from_str(&format!(
            r#"{{"programName":"Bundle","rewards":[{rewards}]}}"#
        ))
        .unwrap()
    }

    fn single_reward() -> Reward {
        serde_json::from_str(r#"{"rewardName":"Solo","voucherAmount":5}"#).unwrap()
    }

    #[tokio::test]
    async fn empty_pin_is_rejected_before_any_write() {
        let (engine, store) = engine_with_store().await;
        let result = engine
            .commit(
                Some(&merchant()),
                &CommitSelection::Reward(single_reward()),
                "   ",
                RewardStatus::Draft,
            )
            .await;
        assert!(matches!(result, Err(CommitError::InvalidPin)));
        assert!(store.merchant_rewards(&merchant()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_merchant_is_not_authorized() {
        let (engine, _store) = engine_with_store().await;
        let result = engine
            .commit(
                None,
                &CommitSelection::Reward(single_reward()),
                "1234",
                RewardStatus::Draft,
            )
            .await;
        assert!(matches!(result, Err(CommitError::NotAuthorized)));
    }

    #[tokio::test]
    async fn single_reward_commit_writes_one_row_per_location() {
        let (engine, store) = engine_with_store().await;
        let summary = engine
            .commit(
                Some(&merchant()),
                &CommitSelection::Reward(single_reward()),
                " 1234 ",
                RewardStatus::Live,
            )
            .await
            .unwrap();

        assert_eq!(summary.rewards_committed, 1);
        assert!(summary.program_id.is_none());

        let rows = store.merchant_rewards(&merchant()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pin, "1234");
        assert!(rows[0].program_id.is_none());
        assert!(rows[0].reward.is_active);
        assert_eq!(rows[0].category, "individual");
    }

    #[tokio::test]
    async fn program_commit_fans_out_with_shared_program_id() {
        let (engine, store) = engine_with_store().await;
        let summary = engine
            .commit(
                Some(&merchant()),
                &CommitSelection::Program(program_with(3)),
                "1234",
                RewardStatus::Draft,
            )
            .await
            .unwrap();

        assert_eq!(summary.rewards_committed, 3);
        let program_id = summary.program_id.expect("program id");

        let rows = store.merchant_rewards(&merchant()).await.unwrap();
        assert_eq!(rows.len(), 3);
        let ids: HashSet<_> = rows.iter().map(|r| r.id.as_str().to_owned()).collect();
        assert_eq!(ids.len(), 3);
        for row in &rows {
            assert_eq!(row.program_id.as_ref(), Some(&program_id));
            assert_eq!(row.program_name.as_deref(), Some("Bundle"));
            assert_eq!(row.status, RewardStatus::Draft);
            assert!(!row.reward.is_active);
        }
    }

    #[tokio::test]
    async fn repeated_program_commit_never_reuses_ids() {
        let (engine, store) = engine_with_store().await;
        let selection = CommitSelection::Program(program_with(4));

        engine
            .commit(Some(&merchant()), &selection, "1234", RewardStatus::Draft)
            .await
            .unwrap();
        engine
            .commit(Some(&merchant()), &selection, "1234", RewardStatus::Draft)
            .await
            .unwrap();

        let rows = store.merchant_rewards(&merchant()).await.unwrap();
        assert_eq!(rows.len(), 8);
        let ids: HashSet<_> = rows.iter().map(|r| r.id.as_str().to_owned()).collect();
        assert_eq!(ids.len(), 8, "a second click must mint fresh ids");
    }

    #[tokio::test]
    async fn empty_program_is_rejected() {
        let (engine, _store) = engine_with_store().await;
        let program: Program =
            serde_json::from_str(r#"{"programName":"Empty","rewards":[]}"#).unwrap();
        let result = engine
            .commit(
                Some(&merchant()),
                &CommitSelection::Program(program),
                "1234",
                RewardStatus::Draft,
            )
            .await;
        assert!(matches!(result, Err(CommitError::EmptySelection)));
    }

    struct FailingRewardStore;

    impl RewardStore for FailingRewardStore {
        fn commit_batch(
            &self,
            _rewards: Vec<PersistedReward>,
        ) -> StoreFuture<'_, AgentResult<()>> {
            Box::pin(async { Err(AgentError::InvalidRecord("simulated outage".to_string())) })
        }

        fn merchant_rewards(
            &self,
            _merchant: &MerchantId,
        ) -> StoreFuture<'_, AgentResult<Vec<PersistedReward>>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn global_reward(
            &self,
            _id: &RewardId,
        ) -> StoreFuture<'_, AgentResult<Option<PersistedReward>>> {
            Box::pin(async { Ok(None) })
        }

        fn assistant_rewards(
            &self,
            _merchant: &MerchantId,
        ) -> StoreFuture<'_, AgentResult<Vec<PersistedReward>>> {
            Box::pin(async { Ok(Vec::new()) })
        }
    }

    #[tokio::test]
    async fn persistence_failure_surfaces_as_typed_error() {
        let engine = CommitEngine::new(Arc::new(FailingRewardStore));
        let result = engine
            .commit(
                Some(&merchant()),
                &CommitSelection::Reward(single_reward()),
                "1234",
                RewardStatus::Live,
            )
            .await;
        assert!(matches!(result, Err(CommitError::Persistence(_))));
    }
}
