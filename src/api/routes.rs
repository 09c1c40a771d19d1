//! Router assembly and server startup.

use std::sync::Arc;

use axum::{response::Html, routing::get, Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::types::HealthResponse;
use super::{download, gateway};
use crate::config::Config;
use crate::llm::{HuggingFaceClient, LlmClient, OpenRouterClient};

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Immutable state shared by every connection.
pub struct AppState {
    pub config: Arc<Config>,
    pub llm: Arc<dyn LlmClient>,
    pub captioner: Option<Arc<HuggingFaceClient>>,
}

impl AppState {
    pub fn new(config: Config, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            config: Arc::new(config),
            llm,
            captioner: None,
        }
    }

    /// Build state with the real upstream clients.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let llm = Arc::new(OpenRouterClient::from_config(&config)?);
        let captioner = HuggingFaceClient::from_config(&config)?.map(Arc::new);
        if captioner.is_none() {
            tracing::info!("No Hugging Face key configured; /describe_image disabled");
        }
        Ok(Self {
            captioner,
            ..Self::new(config, llm)
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/ws", get(gateway::relay_ws))
        .route("/download/:filename", get(download::download_file))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Bind `host:port` from the config and serve until SIGINT or SIGTERM.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::from_config(config)?);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down gracefully...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
