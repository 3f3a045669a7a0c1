//! Application state shared across all request handlers.

use std::sync::Arc;

use dashmap::DashMap;
use tokio_rusqlite::Connection;

use crate::assistant::{AssistantService, HttpAssistantClient};
use crate::commit::{CommitEngine, RewardStore, SqliteRewardStore};
use crate::conversation::store::ConversationStore;
use crate::conversation::{ConversationSession, SqliteConversationStore};
use crate::core::config::AgentConfig;
use crate::core::errors::{AgentError, AgentResult};
use crate::core::ids::{ConversationId, MerchantId};
use crate::extract::TurnParser;

/// Shared application state.
pub struct AppState {
    /// Assistant service client.
    pub assistant: Arc<dyn AssistantService>,
    /// Conversation storage.
    pub conversations: Arc<dyn ConversationStore>,
    /// Commit engine over reward storage.
    pub commit_engine: CommitEngine,
    /// Turn parser for rendering fragments.
    pub parser: TurnParser,
    /// Live sessions, one per (merchant, conversation). Keeping them here
    /// enforces one in-flight assistant request per conversation
    /// process-wide.
    sessions: DashMap<(MerchantId, ConversationId), Arc<ConversationSession>>,
}

impl AppState {
    /// Create application state from configuration.
    ///
    /// # Errors
    /// Returns an error if configuration is invalid or storage cannot be
    /// initialized.
    pub async fn new(config: &AgentConfig) -> AgentResult<Arc<Self>> {
        config.validate()?;

        let conn = Arc::new(
            Connection::open(&config.storage.sqlite_path)
                .await
                .map_err(AgentError::from)?,
        );
        let conversations: Arc<dyn ConversationStore> =
            Arc::new(SqliteConversationStore::new(Arc::clone(&conn), &config.storage).await?);
        let rewards: Arc<dyn RewardStore> =
            Arc::new(SqliteRewardStore::new(conn, &config.storage).await?);
        let assistant: Arc<dyn AssistantService> = Arc::new(
            HttpAssistantClient::new(&config.assistant)
                .map_err(|err| AgentError::InvalidConfig(err.to_string()))?,
        );

        Self::with_components(assistant, conversations, rewards)
    }

    /// Assemble state from pre-built components (used by tests to inject a
    /// scripted assistant service).
    ///
    /// # Errors
    /// Returns an error if the parser patterns fail to compile.
    pub fn with_components(
        assistant: Arc<dyn AssistantService>,
        conversations: Arc<dyn ConversationStore>,
        rewards: Arc<dyn RewardStore>,
    ) -> AgentResult<Arc<Self>> {
        let parser =
            TurnParser::new().map_err(|err| AgentError::InvalidConfig(err.to_string()))?;
        Ok(Arc::new(Self {
            assistant,
            conversations,
            commit_engine: CommitEngine::new(rewards),
            parser,
            sessions: DashMap::new(),
        }))
    }

    /// Fetch (or lazily create) the session bound to a conversation.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    pub async fn session(
        &self,
        merchant: &MerchantId,
        id: ConversationId,
    ) -> AgentResult<Option<Arc<ConversationSession>>> {
        let key = (merchant.clone(), id);
        if let Some(existing) = self.sessions.get(&key) {
            return Ok(Some(existing.value().clone()));
        }

        let Some(conversation) = self.conversations.get(merchant, id).await? else {
            return Ok(None);
        };

        let session = Arc::new(ConversationSession::new(
            merchant.clone(),
            conversation,
            Arc::clone(&self.assistant),
            Arc::clone(&self.conversations),
        ));
        let entry = self.sessions.entry(key).or_insert(session);
        Ok(Some(entry.value().clone()))
    }

    /// Drop the session bound to a deleted conversation.
    pub fn drop_session(&self, merchant: &MerchantId, id: ConversationId) {
        self.sessions.remove(&(merchant.clone(), id));
    }
}
