//! Client for the external AI assistant service.
//!
//! The service is a black box behind a small contract: send a message
//! (optionally continuing an existing thread), get back prose that may
//! contain JSON payloads, plus the thread id the service filed the exchange
//! under. Nothing here assumes anything about the underlying model.

pub mod client;

pub use client::HttpAssistantClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed fallback message appended to a conversation when the service call
/// fails, so the user always gets a visible response.
pub const FALLBACK_APOLOGY: &str =
    "Sorry, I couldn't complete that request. Please try again in a moment.";

/// A successful assistant reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantReply {
    /// Prose, optionally interleaved with JSON payloads.
    pub content: String,
    /// The service-side thread this exchange belongs to.
    pub thread_id: String,
}

/// Errors produced by the assistant service client.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("assistant request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("assistant service returned status {0}")]
    Status(u16),
    /// The response body did not match the expected contract.
    #[error("assistant reply malformed: {0}")]
    MalformedReply(String),
}

impl AssistantError {
    /// Whether retrying the same request later may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            Self::Status(code) => *code == 429 || *code >= 500,
            Self::MalformedReply(_) => false,
        }
    }
}

/// The assistant service contract.
#[async_trait]
pub trait AssistantService: Send + Sync {
    /// Send one message, optionally continuing an existing thread.
    ///
    /// # Errors
    /// Returns an error if the service cannot be reached, answers with a
    /// non-success status, or replies outside the contract.
    async fn send(
        &self,
        message: &str,
        thread_id: Option<&str>,
    ) -> Result<AssistantReply, AssistantError>;
}
