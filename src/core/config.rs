//! Configuration for the assistant core.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::errors::{AgentError, AgentResult};

/// Environment variable overriding the SQLite database path.
pub const ENV_DB_PATH: &str = "TAPAI_DB_PATH";
/// Environment variable overriding the assistant service endpoint.
pub const ENV_ASSISTANT_URL: &str = "TAPAI_ASSISTANT_URL";
/// Environment variable overriding the HTTP server port.
pub const ENV_PORT: &str = "TAPAI_PORT";

/// Top-level configuration for the agent.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Storage settings.
    pub storage: StorageConfig,
    /// Assistant service client settings.
    pub assistant: AssistantConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
}

impl AgentConfig {
    /// Build the default configuration with environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var(ENV_DB_PATH) {
            config.storage.sqlite_path = PathBuf::from(path);
        }
        if let Ok(url) = std::env::var(ENV_ASSISTANT_URL) {
            config.assistant.base_url = url;
        }
        if let Some(port) = std::env::var(ENV_PORT).ok().and_then(|p| p.parse().ok()) {
            config.server.port = port;
        }
        config
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> AgentResult<()> {
        if self.storage.conversations_table.is_empty() {
            return Err(AgentError::InvalidConfig(
                "storage.conversations_table must not be empty".to_string(),
            ));
        }
        if self.storage.merchant_rewards_table.is_empty()
            || self.storage.global_rewards_table.is_empty()
            || self.storage.assistant_rewards_table.is_empty()
        {
            return Err(AgentError::InvalidConfig(
                "storage reward table names must not be empty".to_string(),
            ));
        }
        Url::parse(&self.assistant.base_url)?;
        if self.assistant.request_timeout_secs == 0 {
            return Err(AgentError::InvalidConfig(
                "assistant.request_timeout_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Storage settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    pub sqlite_path: PathBuf,
    /// Table holding conversation documents.
    pub conversations_table: String,
    /// Table mirroring rewards under the owning merchant.
    pub merchant_rewards_table: String,
    /// Table mirroring rewards in the global index.
    pub global_rewards_table: String,
    /// Table mirroring rewards created through the assistant.
    pub assistant_rewards_table: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("tapai_agent.db"),
            conversations_table: "conversations".to_string(),
            merchant_rewards_table: "merchant_rewards".to_string(),
            global_rewards_table: "rewards".to_string(),
            assistant_rewards_table: "tapai_rewards".to_string(),
        }
    }
}

/// Assistant service client settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Base URL of the assistant service message endpoint.
    pub base_url: String,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Full request timeout in seconds; assistant runs can be slow.
    pub request_timeout_secs: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8787/v1/messages".to_string(),
            connect_timeout_secs: 5,
            request_timeout_secs: 120,
        }
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port the API server listens on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}
