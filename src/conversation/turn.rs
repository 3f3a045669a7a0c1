//! Turns: the immutable messages making up a conversation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a turn.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The merchant typing into the panel.
    User,
    /// The AI assistant (or a synthetic fallback on its behalf).
    Assistant,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Assistant => f.write_str("assistant"),
        }
    }
}

/// One message within a conversation. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    /// Author of the turn.
    pub role: TurnRole,
    /// Raw text as submitted or returned; parsing happens at render time.
    #[serde(rename = "content")]
    pub raw_text: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Create a user turn stamped now.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            raw_text: text.into(),
            created_at: Utc::now(),
        }
    }

    /// Create an assistant turn stamped now.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            raw_text: text.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_serializes_with_wire_field_names() {
        let turn = Turn::user("hello");
        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(value["role"], "user");
        assert_eq!(value["content"], "hello");
        assert!(value.get("createdAt").is_some());
    }
}
