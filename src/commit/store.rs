//! SQLite-backed reward storage with three mirrored locations.
//!
//! Every committed reward is written to the merchant-scoped collection, the
//! global rewards index, and the assistant-specific index, keyed by the
//! same id. One serialized payload is reused for all three rows and the
//! whole batch runs inside a single transaction, so either every row of a
//! commit is visible afterwards or none is.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_rusqlite::Connection;

use crate::core::config::StorageConfig;
use crate::core::errors::AgentResult;
use crate::core::ids::{MerchantId, RewardId};

use super::staged::PersistedReward;

/// Boxed future type for store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Reward storage trait.
pub trait RewardStore: Send + Sync {
    /// Write a batch of rewards to all three locations atomically.
    ///
    /// # Errors
    /// Returns an error if any write fails; no partial state is left
    /// behind.
    fn commit_batch(&self, rewards: Vec<PersistedReward>) -> StoreFuture<'_, AgentResult<()>>;

    /// Read a merchant's rewards from the merchant-scoped collection.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn merchant_rewards(
        &self,
        merchant: &MerchantId,
    ) -> StoreFuture<'_, AgentResult<Vec<PersistedReward>>>;

    /// Read one reward from the global index.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn global_reward(
        &self,
        id: &RewardId,
    ) -> StoreFuture<'_, AgentResult<Option<PersistedReward>>>;

    /// Read a merchant's rewards from the assistant-specific index.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn assistant_rewards(
        &self,
        merchant: &MerchantId,
    ) -> StoreFuture<'_, AgentResult<Vec<PersistedReward>>>;
}

/// `SQLite` implementation of reward storage.
pub struct SqliteRewardStore {
    conn: Arc<Connection>,
    merchant_table: String,
    global_table: String,
    assistant_table: String,
}

impl SqliteRewardStore {
    /// Initialize the store and create its tables if needed.
    ///
    /// # Errors
    /// Returns an error if database operations fail.
    pub async fn new(conn: Arc<Connection>, config: &StorageConfig) -> AgentResult<Self> {
        let merchant_table = config.merchant_rewards_table.clone();
        let global_table = config.global_rewards_table.clone();
        let assistant_table = config.assistant_rewards_table.clone();

        let (m, g, a) = (
            merchant_table.clone(),
            global_table.clone(),
            assistant_table.clone(),
        );
        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {m} (
                    merchant_id TEXT NOT NULL,
                    id TEXT NOT NULL,
                    payload TEXT NOT NULL,
                    PRIMARY KEY (merchant_id, id)
                );
                CREATE TABLE IF NOT EXISTS {g} (
                    id TEXT PRIMARY KEY,
                    payload TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS {a} (
                    merchant_id TEXT NOT NULL,
                    id TEXT NOT NULL,
                    payload TEXT NOT NULL,
                    PRIMARY KEY (merchant_id, id)
                );"
            ))?;
            Ok(())
        })
        .await?;

        Ok(Self {
            conn,
            merchant_table,
            global_table,
            assistant_table,
        })
    }

    fn parse_rows(rows: Vec<String>) -> AgentResult<Vec<PersistedReward>> {
        rows.into_iter()
            .map(|payload| Ok(serde_json::from_str(&payload)?))
            .collect()
    }
}

impl RewardStore for SqliteRewardStore {
    fn commit_batch(&self, rewards: Vec<PersistedReward>) -> StoreFuture<'_, AgentResult<()>> {
        Box::pin(async move {
            if rewards.is_empty() {
                return Ok(());
            }

            // Serialize once per reward; the identical payload is written
            // to all three locations.
            let mut rows = Vec::with_capacity(rewards.len());
            for reward in &rewards {
                rows.push((
                    reward.merchant_id.as_str().to_owned(),
                    reward.id.as_str().to_owned(),
                    serde_json::to_string(reward)?,
                ));
            }

            let merchant_table = self.merchant_table.clone();
            let global_table = self.global_table.clone();
            let assistant_table = self.assistant_table.clone();

            self.conn
                .call(move |conn| {
                    let tx = conn.transaction()?;
                    {
                        let mut merchant_stmt = tx.prepare(&format!(
                            "INSERT INTO {merchant_table} (merchant_id, id, payload)
                             VALUES (?1, ?2, ?3)"
                        ))?;
                        let mut global_stmt = tx.prepare(&format!(
                            "INSERT INTO {global_table} (id, payload) VALUES (?1, ?2)"
                        ))?;
                        let mut assistant_stmt = tx.prepare(&format!(
                            "INSERT INTO {assistant_table} (merchant_id, id, payload)
                             VALUES (?1, ?2, ?3)"
                        ))?;

                        for (merchant_id, id, payload) in rows {
                            merchant_stmt.execute(rusqlite::params![merchant_id, id, payload])?;
                            global_stmt.execute(rusqlite::params![id, payload])?;
                            assistant_stmt.execute(rusqlite::params![merchant_id, id, payload])?;
                        }
                    }
                    tx.commit()?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }

    fn merchant_rewards(
        &self,
        merchant: &MerchantId,
    ) -> StoreFuture<'_, AgentResult<Vec<PersistedReward>>> {
        let merchant = merchant.clone();
        Box::pin(async move {
            let table = self.merchant_table.clone();
            let rows = self
                .conn
                .call(move |conn| {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT payload FROM {table} WHERE merchant_id = ?1 ORDER BY id"
                    ))?;
                    let rows = stmt
                        .query_map([merchant.as_str()], |row| row.get::<_, String>(0))?
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(rows)
                })
                .await?;
            Self::parse_rows(rows)
        })
    }

    fn global_reward(
        &self,
        id: &RewardId,
    ) -> StoreFuture<'_, AgentResult<Option<PersistedReward>>> {
        let id = id.clone();
        Box::pin(async move {
            let table = self.global_table.clone();
            let row = self
                .conn
                .call(move |conn| {
                    use rusqlite::OptionalExtension;
                    let row = conn
                        .query_row(
                            &format!("SELECT payload FROM {table} WHERE id = ?1"),
                            [id.as_str()],
                            |row| row.get::<_, String>(0),
                        )
                        .optional()?;
                    Ok(row)
                })
                .await?;
            row.map(|payload| Ok(serde_json::from_str(&payload)?))
                .transpose()
        })
    }

    fn assistant_rewards(
        &self,
        merchant: &MerchantId,
    ) -> StoreFuture<'_, AgentResult<Vec<PersistedReward>>> {
        let merchant = merchant.clone();
        Box::pin(async move {
            let table = self.assistant_table.clone();
            let rows = self
                .conn
                .call(move |conn| {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT payload FROM {table} WHERE merchant_id = ?1 ORDER BY id"
                    ))?;
                    let rows = stmt
                        .query_map([merchant.as_str()], |row| row.get::<_, String>(0))?
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(rows)
                })
                .await?;
            Self::parse_rows(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::staged::RewardStatus;
    use crate::core::ids::ProgramId;
    use crate::domain::Reward;
    use chrono::Utc;

    async fn memory_store() -> SqliteRewardStore {
        let conn = Arc::new(Connection::open(":memory:").await.unwrap());
        SqliteRewardStore::new(conn, &StorageConfig::default())
            .await
            .unwrap()
    }

    fn merchant() -> MerchantId {
        MerchantId::new("merchant-1").unwrap()
    }

    fn reward(name: &str) -> Reward {
        serde_json::from_str(&format!(r#"{{"rewardName":"{name}","pointsCost":10}}"#)).unwrap()
    }

    fn staged(name: &str, id: RewardId) -> PersistedReward {
        PersistedReward::stage(
            &reward(name),
            id,
            None,
            merchant(),
            "1234",
            RewardStatus::Draft,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn batch_writes_all_three_locations_identically() {
        let store = memory_store().await;
        let id = RewardId::standalone(1_000);
        store.commit_batch(vec![staged("Free Coffee", id.clone())]).await.unwrap();

        let from_merchant = store.merchant_rewards(&merchant()).await.unwrap();
        let from_global = store.global_reward(&id).await.unwrap().unwrap();
        let from_assistant = store.assistant_rewards(&merchant()).await.unwrap();

        assert_eq!(from_merchant.len(), 1);
        assert_eq!(from_assistant.len(), 1);
        assert_eq!(from_merchant[0], from_global);
        assert_eq!(from_assistant[0], from_global);

        // Byte-identical payloads, not merely equal structures.
        let id_str = id.as_str().to_owned();
        let payloads = store
            .conn
            .call(move |conn| {
                let merchant_payload: String = conn.query_row(
                    "SELECT payload FROM merchant_rewards WHERE id = ?1",
                    [id_str.as_str()],
                    |row| row.get(0),
                )?;
                let global_payload: String = conn.query_row(
                    "SELECT payload FROM rewards WHERE id = ?1",
                    [id_str.as_str()],
                    |row| row.get(0),
                )?;
                let assistant_payload: String = conn.query_row(
                    "SELECT payload FROM tapai_rewards WHERE id = ?1",
                    [id_str.as_str()],
                    |row| row.get(0),
                )?;
                Ok((merchant_payload, global_payload, assistant_payload))
            })
            .await
            .unwrap();
        assert_eq!(payloads.0, payloads.1);
        assert_eq!(payloads.1, payloads.2);
    }

    #[tokio::test]
    async fn failing_batch_leaves_no_rows_behind() {
        let store = memory_store().await;

        let first = RewardId::standalone(1_000);
        store.commit_batch(vec![staged("First", first.clone())]).await.unwrap();

        // Second batch: a fresh reward followed by one colliding with the
        // already-committed id, which violates the primary key mid-batch.
        let fresh = RewardId::standalone(2_000);
        let result = store
            .commit_batch(vec![staged("Fresh", fresh.clone()), staged("Dup", first)])
            .await;
        assert!(result.is_err());

        // The fresh reward from the failed batch must not be observable in
        // any location.
        assert!(store.global_reward(&fresh).await.unwrap().is_none());
        let remaining = store.merchant_rewards(&merchant()).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].reward.reward_name, "First");
    }

    #[tokio::test]
    async fn program_members_round_trip_with_linkage() {
        let store = memory_store().await;
        let program_id = ProgramId::generate(3_000);
        let member = PersistedReward::stage(
            &reward("Member"),
            RewardId::in_program(&program_id, 3_000, 0),
            Some((program_id.clone(), "Bundle".to_string())),
            merchant(),
            "1234",
            RewardStatus::Live,
            Utc::now(),
        );
        store.commit_batch(vec![member]).await.unwrap();

        let rows = store.merchant_rewards(&merchant()).await.unwrap();
        assert_eq!(rows[0].program_id.as_ref(), Some(&program_id));
        assert_eq!(rows[0].program_name.as_deref(), Some("Bundle"));
        assert!(rows[0].reward.is_active);
    }
}
