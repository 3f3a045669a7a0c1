//! Startup helpers for the TapAI agent server.

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;

use crate::core::config::AgentConfig;
use crate::server::{self, AppState};

/// Run the server (used by the `tapai-server` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting TapAI Agent v{}", env!("CARGO_PKG_VERSION"));

    let config = AgentConfig::from_env();
    tracing::info!("Assistant endpoint: {}", config.assistant.base_url);
    let port = config.server.port;

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let result: Result<(), Box<dyn std::error::Error + Send + Sync>> = rt.block_on(async {
        let state = AppState::new(&config).await?;
        server::run_server(state, port).await
    });

    if let Err(e) = result {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Initialize application state without starting the server.
///
/// # Errors
/// Returns an error if state creation fails.
pub async fn initialize(
    config: &AgentConfig,
) -> Result<Arc<AppState>, Box<dyn std::error::Error + Send + Sync>> {
    Ok(AppState::new(config).await?)
}

/// Run server with graceful shutdown.
///
/// # Errors
/// Returns an error if the server fails.
pub async fn run_server_with_shutdown<F>(
    state: Arc<AppState>,
    port: u16,
    shutdown_signal: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Future<Output = ()> + Send + 'static,
{
    server::run_server_with_shutdown(state, port, shutdown_signal).await
}
