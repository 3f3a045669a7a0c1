//! Per-conversation state machine.
//!
//! One session owns one conversation's turn list and drives the assistant
//! service for it. The machine is `Idle → AwaitingResponse → Idle`, with an
//! absorbing `Failed` state entered only when the conversation can no
//! longer be persisted. Submission is rejected (without a transition) while
//! a request is in flight, while the input is empty, and while a commit
//! selection is pending PIN confirmation, so turns are strictly appended in
//! submission order and at most one request per conversation is
//! outstanding.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::assistant::{AssistantService, FALLBACK_APOLOGY};
use crate::core::errors::AgentError;
use crate::core::ids::{ConversationId, MerchantId};

use super::store::ConversationStore;
use super::{Conversation, Turn};

/// Observable session state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionStatus {
    /// Ready to accept a submission.
    Idle,
    /// One request is outstanding against the assistant service.
    AwaitingResponse,
    /// The conversation could not be persisted; the session no longer
    /// accepts input.
    Failed,
}

/// Errors returned by [`ConversationSession::submit`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// The input was empty or whitespace-only.
    #[error("message text is empty")]
    EmptyInput,
    /// A request is already awaiting a response.
    #[error("a request is already awaiting a response")]
    Busy,
    /// A commit selection is pending PIN confirmation.
    #[error("a commit is pending PIN confirmation")]
    CommitPending,
    /// The session is in the failed state.
    #[error("conversation session is in the failed state")]
    Failed,
    /// The conversation could not be persisted.
    #[error("failed to persist conversation: {0}")]
    Persist(#[source] AgentError),
}

/// Result of a successful submission.
#[derive(Clone, Debug)]
pub struct SubmitReport {
    /// The assistant turn appended to the conversation (the real reply, or
    /// the fixed apology on service failure).
    pub assistant_turn: Turn,
    /// Present when the service call failed and the apology was used;
    /// suitable for a transient notification.
    pub service_error: Option<String>,
}

struct SessionInner {
    conversation: Conversation,
    status: SessionStatus,
    commit_pending: bool,
}

/// State machine bound to one conversation.
pub struct ConversationSession {
    merchant: MerchantId,
    service: Arc<dyn AssistantService>,
    store: Arc<dyn ConversationStore>,
    inner: Mutex<SessionInner>,
}

impl ConversationSession {
    /// Bind a session to an existing conversation.
    #[must_use]
    pub fn new(
        merchant: MerchantId,
        conversation: Conversation,
        service: Arc<dyn AssistantService>,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            merchant,
            service,
            store,
            inner: Mutex::new(SessionInner {
                conversation,
                status: SessionStatus::Idle,
                commit_pending: false,
            }),
        }
    }

    /// The conversation this session is bound to.
    pub async fn conversation_id(&self) -> ConversationId {
        self.inner.lock().await.conversation.id
    }

    /// Current state.
    pub async fn status(&self) -> SessionStatus {
        self.inner.lock().await.status
    }

    /// Snapshot of the current turn list.
    pub async fn current_turns(&self) -> Vec<Turn> {
        self.inner.lock().await.conversation.turns.clone()
    }

    /// Snapshot of the whole conversation.
    pub async fn snapshot(&self) -> Conversation {
        self.inner.lock().await.conversation.clone()
    }

    /// Mark a commit selection as pending PIN confirmation; submissions are
    /// rejected until [`Self::end_commit_confirmation`] is called.
    pub async fn begin_commit_confirmation(&self) {
        self.inner.lock().await.commit_pending = true;
    }

    /// Clear the pending-commit hold.
    pub async fn end_commit_confirmation(&self) {
        self.inner.lock().await.commit_pending = false;
    }

    /// Submit one user message.
    ///
    /// Appends the user turn optimistically, issues exactly one request to
    /// the assistant service, appends the reply (or the fixed apology on
    /// service failure), and persists the conversation before returning to
    /// `Idle`. The user's message is never silently dropped.
    ///
    /// # Errors
    /// Returns a rejection error without a state transition when the
    /// session is busy, failed, holding a pending commit, or the input is
    /// empty; returns [`SessionError::Persist`] (and enters `Failed`) when
    /// the conversation cannot be persisted.
    pub async fn submit(&self, text: &str) -> Result<SubmitReport, SessionError> {
        let trimmed = text.trim();

        let (message, thread_id) = {
            let mut inner = self.inner.lock().await;
            match inner.status {
                SessionStatus::Failed => return Err(SessionError::Failed),
                SessionStatus::AwaitingResponse => return Err(SessionError::Busy),
                SessionStatus::Idle => {}
            }
            if trimmed.is_empty() {
                return Err(SessionError::EmptyInput);
            }
            if inner.commit_pending {
                return Err(SessionError::CommitPending);
            }

            inner.conversation.push_turn(Turn::user(trimmed));
            inner.status = SessionStatus::AwaitingResponse;
            (trimmed.to_owned(), inner.conversation.thread_id.clone())
        };

        // The lock is released while the request is in flight; re-entrant
        // submissions are rejected by the status gate above.
        let result = self.service.send(&message, thread_id.as_deref()).await;

        let mut inner = self.inner.lock().await;
        let (assistant_turn, service_error) = match result {
            Ok(reply) => {
                inner.conversation.record_thread_id(&reply.thread_id);
                let turn = Turn::assistant(reply.content);
                inner.conversation.push_turn(turn.clone());
                debug!("Recorded assistant reply for {}", inner.conversation.id);
                (turn, None)
            }
            Err(err) => {
                warn!(
                    "Assistant call failed for {}: {err}",
                    inner.conversation.id
                );
                let turn = Turn::assistant(FALLBACK_APOLOGY);
                inner.conversation.push_turn(turn.clone());
                (turn, Some(err.to_string()))
            }
        };

        if let Err(err) = self
            .store
            .upsert(&self.merchant, &inner.conversation)
            .await
        {
            inner.status = SessionStatus::Failed;
            return Err(SessionError::Persist(err));
        }

        inner.status = SessionStatus::Idle;
        Ok(SubmitReport {
            assistant_turn,
            service_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::{AssistantError, AssistantReply};
    use crate::conversation::store::{SqliteConversationStore, StoreFuture};
    use crate::conversation::TurnRole;
    use crate::core::config::StorageConfig;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::sync::oneshot;
    use tokio_rusqlite::Connection;

    struct ScriptedService {
        replies: Mutex<VecDeque<Result<AssistantReply, AssistantError>>>,
    }

    impl ScriptedService {
        fn new(replies: Vec<Result<AssistantReply, AssistantError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
            })
        }
    }

    #[async_trait]
    impl AssistantService for ScriptedService {
        async fn send(
            &self,
            _message: &str,
            _thread_id: Option<&str>,
        ) -> Result<AssistantReply, AssistantError> {
            self.replies
                .lock()
                .await
                .pop_front()
                .unwrap_or(Err(AssistantError::Status(500)))
        }
    }

    struct GatedService {
        gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl AssistantService for GatedService {
        async fn send(
            &self,
            _message: &str,
            _thread_id: Option<&str>,
        ) -> Result<AssistantReply, AssistantError> {
            let gate = self.gate.lock().await.take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            Ok(AssistantReply {
                content: "done".to_string(),
                thread_id: "t-1".to_string(),
            })
        }
    }

    struct FailingStore;

    impl ConversationStore for FailingStore {
        fn list(
            &self,
            _merchant: &MerchantId,
        ) -> StoreFuture<'_, crate::core::errors::AgentResult<Vec<Conversation>>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn get(
            &self,
            _merchant: &MerchantId,
            _id: ConversationId,
        ) -> StoreFuture<'_, crate::core::errors::AgentResult<Option<Conversation>>> {
            Box::pin(async { Ok(None) })
        }

        fn upsert(
            &self,
            _merchant: &MerchantId,
            _conversation: &Conversation,
        ) -> StoreFuture<'_, crate::core::errors::AgentResult<()>> {
            Box::pin(async { Err(AgentError::InvalidRecord("disk full".to_string())) })
        }

        fn rename(
            &self,
            _merchant: &MerchantId,
            _id: ConversationId,
            _title: &str,
        ) -> StoreFuture<'_, crate::core::errors::AgentResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn delete(
            &self,
            _merchant: &MerchantId,
            _id: ConversationId,
        ) -> StoreFuture<'_, crate::core::errors::AgentResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    async fn memory_store() -> Arc<SqliteConversationStore> {
        let conn = Arc::new(Connection::open(":memory:").await.unwrap());
        Arc::new(
            SqliteConversationStore::new(conn, &StorageConfig::default())
                .await
                .unwrap(),
        )
    }

    fn merchant() -> MerchantId {
        MerchantId::new("merchant-1").unwrap()
    }

    fn ok_reply(content: &str, thread: &str) -> Result<AssistantReply, AssistantError> {
        Ok(AssistantReply {
            content: content.to_string(),
            thread_id: thread.to_string(),
        })
    }

    #[tokio::test]
    async fn submit_appends_both_turns_and_persists() {
        let store = memory_store().await;
        let service = ScriptedService::new(vec![ok_reply("Here's an idea", "thread-1")]);
        let conversation = Conversation::new();
        let id = conversation.id;
        let session =
            ConversationSession::new(merchant(), conversation, service, store.clone());

        let report = session.submit("help me").await.unwrap();
        assert_eq!(report.assistant_turn.raw_text, "Here's an idea");
        assert!(report.service_error.is_none());
        assert_eq!(session.status().await, SessionStatus::Idle);

        let persisted = store.get(&merchant(), id).await.unwrap().unwrap();
        assert_eq!(persisted.turns.len(), 2);
        assert_eq!(persisted.turns[0].role, TurnRole::User);
        assert_eq!(persisted.thread_id.as_deref(), Some("thread-1"));
    }

    #[tokio::test]
    async fn thread_id_is_recorded_only_once() {
        let store = memory_store().await;
        let service = ScriptedService::new(vec![
            ok_reply("first", "thread-1"),
            ok_reply("second", "thread-2"),
        ]);
        let session =
            ConversationSession::new(merchant(), Conversation::new(), service, store);

        session.submit("one").await.unwrap();
        session.submit("two").await.unwrap();

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.thread_id.as_deref(), Some("thread-1"));
    }

    #[tokio::test]
    async fn empty_input_is_rejected_without_a_transition() {
        let store = memory_store().await;
        let service = ScriptedService::new(vec![]);
        let session =
            ConversationSession::new(merchant(), Conversation::new(), service, store);

        assert!(matches!(
            session.submit("   ").await,
            Err(SessionError::EmptyInput)
        ));
        assert_eq!(session.status().await, SessionStatus::Idle);
        assert!(session.current_turns().await.is_empty());
    }

    #[tokio::test]
    async fn submission_is_rejected_while_awaiting_response() {
        let store = memory_store().await;
        let (release, gate) = oneshot::channel();
        let service = Arc::new(GatedService {
            gate: Mutex::new(Some(gate)),
        });
        let session = Arc::new(ConversationSession::new(
            merchant(),
            Conversation::new(),
            service,
            store,
        ));

        let in_flight = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.submit("first").await })
        };

        // Wait until the first submission holds the in-flight slot.
        loop {
            if session.status().await == SessionStatus::AwaitingResponse {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            session.submit("second").await,
            Err(SessionError::Busy)
        ));

        release.send(()).unwrap();
        in_flight.await.unwrap().unwrap();
        assert_eq!(session.status().await, SessionStatus::Idle);
    }

    #[tokio::test]
    async fn pending_commit_blocks_submission() {
        let store = memory_store().await;
        let service = ScriptedService::new(vec![ok_reply("ok", "t")]);
        let session =
            ConversationSession::new(merchant(), Conversation::new(), service, store);

        session.begin_commit_confirmation().await;
        assert!(matches!(
            session.submit("hello").await,
            Err(SessionError::CommitPending)
        ));

        session.end_commit_confirmation().await;
        assert!(session.submit("hello").await.is_ok());
    }

    #[tokio::test]
    async fn service_failure_degrades_to_the_apology_turn() {
        let store = memory_store().await;
        let service = ScriptedService::new(vec![Err(AssistantError::Status(503))]);
        let conversation = Conversation::new();
        let id = conversation.id;
        let session =
            ConversationSession::new(merchant(), conversation, service, store.clone());

        let report = session.submit("help").await.unwrap();
        assert_eq!(report.assistant_turn.raw_text, FALLBACK_APOLOGY);
        assert!(report.service_error.is_some());
        assert_eq!(session.status().await, SessionStatus::Idle);

        // The user's message and the apology are both persisted.
        let persisted = store.get(&merchant(), id).await.unwrap().unwrap();
        assert_eq!(persisted.turns.len(), 2);
        assert_eq!(persisted.turns[1].raw_text, FALLBACK_APOLOGY);
    }

    #[tokio::test]
    async fn persistence_failure_absorbs_into_failed() {
        let service = ScriptedService::new(vec![ok_reply("ok", "t")]);
        let session = ConversationSession::new(
            merchant(),
            Conversation::new(),
            service,
            Arc::new(FailingStore),
        );

        assert!(matches!(
            session.submit("hello").await,
            Err(SessionError::Persist(_))
        ));
        assert_eq!(session.status().await, SessionStatus::Failed);
        assert!(matches!(
            session.submit("again").await,
            Err(SessionError::Failed)
        ));
    }
}
