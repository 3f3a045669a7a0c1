//! Conversations: turn lists, persistence, and the per-conversation state
//! machine driving the assistant service.

pub mod session;
pub mod store;
pub mod turn;

pub use session::{ConversationSession, SessionError, SessionStatus, SubmitReport};
pub use store::{ensure_initial, ConversationStore, SqliteConversationStore, StoreFuture};
pub use turn::{Turn, TurnRole};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::ids::ConversationId;

/// Title given to a conversation before the user renames it.
pub const DEFAULT_TITLE: &str = "New chat";

/// Welcome message seeding a freshly created conversation.
const WELCOME_PLAIN: &str = "Hi! I'm TapAI, your loyalty program assistant. \
I can help you create rewards, design campaigns, and optimize your loyalty \
strategy. What would you like help with?";

/// Build the welcome message, personalized when the merchant name is known.
#[must_use]
pub fn welcome_message(merchant_name: Option<&str>) -> String {
    match merchant_name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => format!(
            "Hi {name}! I'm TapAI, your loyalty program assistant. I can help \
             you create rewards, design campaigns, and optimize your loyalty \
             strategy. What would you like help with?"
        ),
        None => WELCOME_PLAIN.to_string(),
    }
}

/// One conversation between a merchant and the assistant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Unique identifier.
    pub id: ConversationId,
    /// Thread id on the assistant service side; assigned on the first
    /// successful call and immutable thereafter.
    pub thread_id: Option<String>,
    /// Display title.
    pub title: String,
    /// Ordered turn list.
    #[serde(rename = "messages")]
    pub turns: Vec<Turn>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create an empty conversation with the default title.
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            thread_id: None,
            title: DEFAULT_TITLE.to_string(),
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a conversation seeded with the assistant welcome turn.
    #[must_use]
    pub fn with_welcome(merchant_name: Option<&str>) -> Self {
        let mut conversation = Self::new();
        conversation
            .turns
            .push(Turn::assistant(welcome_message(merchant_name)));
        conversation
    }

    /// Append a turn and refresh the update timestamp.
    pub fn push_turn(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.updated_at = Utc::now();
    }

    /// Record the thread id returned by the service, only if none was
    /// assigned yet.
    pub fn record_thread_id(&mut self, thread_id: &str) {
        if self.thread_id.is_none() {
            self.thread_id = Some(thread_id.to_owned());
        }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_message_is_personalized_when_name_known() {
        assert!(welcome_message(Some("Bean There")).starts_with("Hi Bean There!"));
        assert!(welcome_message(None).starts_with("Hi! I'm TapAI"));
        assert!(welcome_message(Some("   ")).starts_with("Hi! I'm TapAI"));
    }

    #[test]
    fn thread_id_is_immutable_after_first_assignment() {
        let mut conversation = Conversation::new();
        conversation.record_thread_id("thread-1");
        conversation.record_thread_id("thread-2");
        assert_eq!(conversation.thread_id.as_deref(), Some("thread-1"));
    }

    #[test]
    fn persisted_shape_uses_wire_field_names() {
        let conversation = Conversation::with_welcome(None);
        let value = serde_json::to_value(&conversation).unwrap();
        assert!(value.get("messages").is_some());
        assert!(value.get("threadId").is_some());
        assert!(value.get("createdAt").is_some());
    }
}
