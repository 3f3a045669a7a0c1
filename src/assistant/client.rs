//! HTTP implementation of the assistant service contract.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::config::AssistantConfig;

use super::{AssistantError, AssistantReply, AssistantService};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_id: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageResponse {
    content: Option<String>,
    thread_id: Option<String>,
}

/// Assistant service client over HTTP/JSON.
pub struct HttpAssistantClient {
    client: Client,
    endpoint: String,
}

impl HttpAssistantClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &AssistantConfig) -> Result<Self, AssistantError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl AssistantService for HttpAssistantClient {
    async fn send(
        &self,
        message: &str,
        thread_id: Option<&str>,
    ) -> Result<AssistantReply, AssistantError> {
        let request = MessageRequest { message, thread_id };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::Status(status.as_u16()));
        }

        let body: MessageResponse = response
            .json()
            .await
            .map_err(|err| AssistantError::MalformedReply(err.to_string()))?;

        let content = body
            .content
            .ok_or_else(|| AssistantError::MalformedReply("missing content".to_string()))?;
        let reply_thread = body
            .thread_id
            .ok_or_else(|| AssistantError::MalformedReply("missing threadId".to_string()))?;

        Ok(AssistantReply {
            content,
            thread_id: reply_thread,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_thread_id_when_absent() {
        let with = serde_json::to_value(MessageRequest {
            message: "hi",
            thread_id: Some("t-1"),
        })
        .unwrap();
        assert_eq!(with["threadId"], "t-1");

        let without = serde_json::to_value(MessageRequest {
            message: "hi",
            thread_id: None,
        })
        .unwrap();
        assert!(without.get("threadId").is_none());
    }

    #[test]
    fn retryability_follows_status_class() {
        assert!(AssistantError::Status(429).is_retryable());
        assert!(AssistantError::Status(503).is_retryable());
        assert!(!AssistantError::Status(401).is_retryable());
        assert!(!AssistantError::MalformedReply("x".to_string()).is_retryable());
    }
}
