//! SQLite-backed conversation storage.
//!
//! One row per conversation, scoped by merchant. The turn list is stored as
//! a serialized JSON document in the row; persisted state is the single
//! source of truth and sessions re-hydrate from it on load.

use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::core::config::StorageConfig;
use crate::core::errors::{AgentError, AgentResult};
use crate::core::ids::{ConversationId, MerchantId};

use super::{Conversation, Turn};

/// Boxed future type for store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Conversation storage trait.
pub trait ConversationStore: Send + Sync {
    /// List a merchant's conversations, most recently updated first.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn list(&self, merchant: &MerchantId) -> StoreFuture<'_, AgentResult<Vec<Conversation>>>;

    /// Fetch one conversation.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn get(
        &self,
        merchant: &MerchantId,
        id: ConversationId,
    ) -> StoreFuture<'_, AgentResult<Option<Conversation>>>;

    /// Insert or replace a conversation document.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn upsert(
        &self,
        merchant: &MerchantId,
        conversation: &Conversation,
    ) -> StoreFuture<'_, AgentResult<()>>;

    /// Update a conversation's title.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn rename(
        &self,
        merchant: &MerchantId,
        id: ConversationId,
        title: &str,
    ) -> StoreFuture<'_, AgentResult<()>>;

    /// Permanently delete a conversation.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn delete(
        &self,
        merchant: &MerchantId,
        id: ConversationId,
    ) -> StoreFuture<'_, AgentResult<()>>;
}

/// Return the merchant's most recent conversation, creating one seeded with
/// the welcome turn when none exists yet.
///
/// # Errors
/// Returns an error if storage access fails.
pub async fn ensure_initial(
    store: &dyn ConversationStore,
    merchant: &MerchantId,
    merchant_name: Option<&str>,
) -> AgentResult<Conversation> {
    let existing = store.list(merchant).await?;
    if let Some(latest) = existing.into_iter().next() {
        return Ok(latest);
    }

    let conversation = Conversation::with_welcome(merchant_name);
    store.upsert(merchant, &conversation).await?;
    tracing::info!(
        "Created initial conversation {} for merchant {merchant}",
        conversation.id
    );
    Ok(conversation)
}

/// `SQLite` implementation of conversation storage.
pub struct SqliteConversationStore {
    conn: Arc<Connection>,
    table: String,
}

impl SqliteConversationStore {
    /// Initialize the store and create its table if needed.
    ///
    /// # Errors
    /// Returns an error if database operations fail.
    pub async fn new(conn: Arc<Connection>, config: &StorageConfig) -> AgentResult<Self> {
        let table = config.conversations_table.clone();
        let table_name = table.clone();

        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table_name} (
                    merchant_id TEXT NOT NULL,
                    id TEXT NOT NULL,
                    thread_id TEXT,
                    title TEXT NOT NULL DEFAULT '',
                    messages TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL,
                    PRIMARY KEY (merchant_id, id)
                );
                CREATE INDEX IF NOT EXISTS idx_{table_name}_updated
                    ON {table_name} (merchant_id, updated_at DESC);"
            ))?;
            Ok(())
        })
        .await?;

        Ok(Self { conn, table })
    }
}

type ConversationRow = (String, Option<String>, String, String, i64, i64);

fn row_to_conversation(row: ConversationRow) -> AgentResult<Conversation> {
    let (id, thread_id, title, messages, created_ms, updated_ms) = row;
    let id = ConversationId::from_str(&id)
        .map_err(|err| AgentError::InvalidRecord(format!("invalid conversation id: {err}")))?;
    let turns: Vec<Turn> = serde_json::from_str(&messages)?;
    let created_at = Utc
        .timestamp_millis_opt(created_ms)
        .single()
        .ok_or_else(|| AgentError::InvalidRecord("invalid created_at".to_string()))?;
    let updated_at = Utc
        .timestamp_millis_opt(updated_ms)
        .single()
        .ok_or_else(|| AgentError::InvalidRecord("invalid updated_at".to_string()))?;

    Ok(Conversation {
        id,
        thread_id,
        title,
        turns,
        created_at,
        updated_at,
    })
}

impl ConversationStore for SqliteConversationStore {
    fn list(&self, merchant: &MerchantId) -> StoreFuture<'_, AgentResult<Vec<Conversation>>> {
        let merchant = merchant.clone();
        Box::pin(async move {
            let table = self.table.clone();
            let rows = self
                .conn
                .call(move |conn| {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT id, thread_id, title, messages, created_at, updated_at
                         FROM {table}
                         WHERE merchant_id = ?1
                         ORDER BY updated_at DESC"
                    ))?;
                    let rows = stmt
                        .query_map([merchant.as_str()], |row| {
                            Ok((
                                row.get::<_, String>(0)?,
                                row.get::<_, Option<String>>(1)?,
                                row.get::<_, String>(2)?,
                                row.get::<_, String>(3)?,
                                row.get::<_, i64>(4)?,
                                row.get::<_, i64>(5)?,
                            ))
                        })?
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(rows)
                })
                .await?;

            rows.into_iter().map(row_to_conversation).collect()
        })
    }

    fn get(
        &self,
        merchant: &MerchantId,
        id: ConversationId,
    ) -> StoreFuture<'_, AgentResult<Option<Conversation>>> {
        let merchant = merchant.clone();
        Box::pin(async move {
            let table = self.table.clone();
            let id_str = id.to_string();
            let row = self
                .conn
                .call(move |conn| {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT id, thread_id, title, messages, created_at, updated_at
                         FROM {table}
                         WHERE merchant_id = ?1 AND id = ?2"
                    ))?;
                    let row = stmt
                        .query_row(rusqlite::params![merchant.as_str(), id_str], |row| {
                            Ok((
                                row.get::<_, String>(0)?,
                                row.get::<_, Option<String>>(1)?,
                                row.get::<_, String>(2)?,
                                row.get::<_, String>(3)?,
                                row.get::<_, i64>(4)?,
                                row.get::<_, i64>(5)?,
                            ))
                        })
                        .optional()?;
                    Ok(row)
                })
                .await?;

            row.map(row_to_conversation).transpose()
        })
    }

    fn upsert(
        &self,
        merchant: &MerchantId,
        conversation: &Conversation,
    ) -> StoreFuture<'_, AgentResult<()>> {
        let merchant = merchant.clone();
        let conversation = conversation.clone();
        Box::pin(async move {
            let table = self.table.clone();
            let messages = serde_json::to_string(&conversation.turns)?;
            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!(
                            "INSERT OR REPLACE INTO {table}
                             (merchant_id, id, thread_id, title, messages, created_at, updated_at)
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
                        ),
                        rusqlite::params![
                            merchant.as_str(),
                            conversation.id.to_string(),
                            conversation.thread_id,
                            conversation.title,
                            messages,
                            conversation.created_at.timestamp_millis(),
                            conversation.updated_at.timestamp_millis(),
                        ],
                    )?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }

    fn rename(
        &self,
        merchant: &MerchantId,
        id: ConversationId,
        title: &str,
    ) -> StoreFuture<'_, AgentResult<()>> {
        let merchant = merchant.clone();
        let title = title.to_owned();
        Box::pin(async move {
            let table = self.table.clone();
            let id_str = id.to_string();
            let now_ms = Utc::now().timestamp_millis();
            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!(
                            "UPDATE {table} SET title = ?1, updated_at = ?2
                             WHERE merchant_id = ?3 AND id = ?4"
                        ),
                        rusqlite::params![title, now_ms, merchant.as_str(), id_str],
                    )?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }

    fn delete(
        &self,
        merchant: &MerchantId,
        id: ConversationId,
    ) -> StoreFuture<'_, AgentResult<()>> {
        let merchant = merchant.clone();
        Box::pin(async move {
            let table = self.table.clone();
            let id_str = id.to_string();
            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!("DELETE FROM {table} WHERE merchant_id = ?1 AND id = ?2"),
                        rusqlite::params![merchant.as_str(), id_str],
                    )?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }
}
