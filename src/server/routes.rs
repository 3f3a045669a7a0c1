//! HTTP route handlers for the TapAI agent API.
//!
//! Merchant identity is taken from the `x-merchant-id` header; resolving it
//! (authentication) is out of scope for this crate.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::commit::{CommitError, CommitSelection, RewardStatus};
use crate::conversation::store::ensure_initial;
use crate::conversation::{Conversation, SessionError, Turn};
use crate::core::ids::{ConversationId, MerchantId};
use crate::domain::{Program, Reward};
use crate::extract::ParsedTurn;

use super::state::AppState;

/// Header carrying the resolved merchant identity.
pub const MERCHANT_HEADER: &str = "x-merchant-id";

type HandlerError = (StatusCode, String);

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route(
            "/api/conversations/{id}",
            get(get_conversation)
                .patch(rename_conversation)
                .delete(delete_conversation),
        )
        .route("/api/conversations/{id}/messages", post(post_message))
        .route("/api/commit", post(commit_selection))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "tapai-agent",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn merchant_from(headers: &HeaderMap) -> Result<MerchantId, HandlerError> {
    let raw = headers
        .get(MERCHANT_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                format!("missing {MERCHANT_HEADER} header"),
            )
        })?;
    MerchantId::new(raw).map_err(|err| (StatusCode::UNAUTHORIZED, err.to_string()))
}

fn conversation_id_from(raw: &str) -> Result<ConversationId, HandlerError> {
    ConversationId::from_str(raw)
        .map_err(|err| (StatusCode::BAD_REQUEST, format!("invalid conversation id: {err}")))
}

fn internal(err: impl std::fmt::Display) -> HandlerError {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

/// Conversation summary for the sidebar listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    /// Conversation id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Number of turns.
    pub message_count: usize,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<&Conversation> for ConversationSummary {
    fn from(conversation: &Conversation) -> Self {
        Self {
            id: conversation.id.to_string(),
            title: conversation.title.clone(),
            message_count: conversation.turns.len(),
            updated_at: conversation.updated_at,
        }
    }
}

/// One turn plus its parsed view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnView {
    /// Author role.
    pub role: String,
    /// Raw text.
    pub content: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Derived prose/fragment view.
    pub parsed: ParsedTurn,
}

/// Full conversation payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    /// Conversation id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Turns with parsed fragments.
    pub turns: Vec<TurnView>,
}

impl AppState {
    fn turn_view(&self, turn: &Turn) -> TurnView {
        TurnView {
            role: turn.role.to_string(),
            content: turn.raw_text.clone(),
            created_at: turn.created_at,
            parsed: self.parser.parse(&turn.raw_text),
        }
    }

    fn conversation_view(&self, conversation: &Conversation) -> ConversationView {
        ConversationView {
            id: conversation.id.to_string(),
            title: conversation.title.clone(),
            turns: conversation.turns.iter().map(|t| self.turn_view(t)).collect(),
        }
    }
}

/// List a merchant's conversations, most recently updated first.
async fn list_conversations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ConversationSummary>>, HandlerError> {
    let merchant = merchant_from(&headers)?;
    let conversations = state
        .conversations
        .list(&merchant)
        .await
        .map_err(internal)?;
    Ok(Json(
        conversations.iter().map(ConversationSummary::from).collect(),
    ))
}

/// Request body for creating a conversation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    /// Merchant display name used to personalize the welcome turn.
    #[serde(default)]
    pub merchant_name: Option<String>,
}

/// Create a conversation seeded with the welcome turn. Returns the
/// merchant's existing latest conversation when one already exists.
async fn create_conversation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CreateConversationRequest>,
) -> Result<Json<ConversationView>, HandlerError> {
    let merchant = merchant_from(&headers)?;
    let conversation = ensure_initial(
        state.conversations.as_ref(),
        &merchant,
        request.merchant_name.as_deref(),
    )
    .await
    .map_err(internal)?;
    Ok(Json(state.conversation_view(&conversation)))
}

/// Fetch one conversation with parsed turns.
async fn get_conversation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ConversationView>, HandlerError> {
    let merchant = merchant_from(&headers)?;
    let id = conversation_id_from(&id)?;
    let conversation = state
        .conversations
        .get(&merchant, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| (StatusCode::NOT_FOUND, "conversation not found".to_string()))?;
    Ok(Json(state.conversation_view(&conversation)))
}

/// Request body for renaming a conversation.
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    /// New title.
    pub title: String,
}

/// Rename a conversation.
async fn rename_conversation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<RenameRequest>,
) -> Result<StatusCode, HandlerError> {
    let merchant = merchant_from(&headers)?;
    let id = conversation_id_from(&id)?;
    let title = request.title.trim();
    if title.is_empty() {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "title is empty".to_string()));
    }
    state
        .conversations
        .rename(&merchant, id, title)
        .await
        .map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a conversation.
async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, HandlerError> {
    let merchant = merchant_from(&headers)?;
    let id = conversation_id_from(&id)?;
    state
        .conversations
        .delete(&merchant, id)
        .await
        .map_err(internal)?;
    state.drop_session(&merchant, id);
    Ok(StatusCode::NO_CONTENT)
}

/// Request body for submitting a message.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    /// The user's message.
    pub message: String,
}

/// Response for a submitted message.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    /// The assistant turn appended to the conversation.
    pub turn: TurnView,
    /// Present when the service call failed and the apology was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_error: Option<String>,
}

/// Submit a message to a conversation's session.
async fn post_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, HandlerError> {
    let merchant = merchant_from(&headers)?;
    let id = conversation_id_from(&id)?;
    let session = state
        .session(&merchant, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| (StatusCode::NOT_FOUND, "conversation not found".to_string()))?;

    let report = session.submit(&request.message).await.map_err(|err| {
        let status = match &err {
            SessionError::EmptyInput => StatusCode::UNPROCESSABLE_ENTITY,
            SessionError::Busy | SessionError::CommitPending => StatusCode::CONFLICT,
            SessionError::Failed | SessionError::Persist(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, err.to_string())
    })?;

    Ok(Json(MessageResponse {
        turn: state.turn_view(&report.assistant_turn),
        service_error: report.service_error,
    }))
}

/// Request body for committing a confirmed selection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    /// A single reward selection.
    #[serde(default)]
    pub reward: Option<Reward>,
    /// A program selection.
    #[serde(default)]
    pub program: Option<Program>,
    /// Redemption PIN.
    pub pin: String,
    /// Draft or live.
    pub status: RewardStatus,
}

/// Response for a successful commit.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    /// Number of rewards written.
    pub rewards_committed: usize,
    /// Shared program id, when a program was committed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_id: Option<String>,
}

/// Commit a confirmed reward or program.
async fn commit_selection(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CommitRequest>,
) -> Result<Json<CommitResponse>, HandlerError> {
    let merchant = merchant_from(&headers)?;

    let selection = match (request.reward, request.program) {
        (Some(reward), None) => CommitSelection::Reward(reward),
        (None, Some(program)) => CommitSelection::Program(program),
        _ => {
            return Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                "exactly one of `reward` or `program` is required".to_string(),
            ))
        }
    };

    let summary = state
        .commit_engine
        .commit(Some(&merchant), &selection, &request.pin, request.status)
        .await
        .map_err(|err| {
            let status = match &err {
                CommitError::InvalidPin | CommitError::EmptySelection => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                CommitError::NotAuthorized => StatusCode::UNAUTHORIZED,
                CommitError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, err.to_string())
        })?;

    Ok(Json(CommitResponse {
        rewards_committed: summary.rewards_committed,
        program_id: summary.program_id.map(|id| id.to_string()),
    }))
}
