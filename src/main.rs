//! prompt-relay - HTTP Server Entry Point
//!
//! Loads configuration, prepares the working directory and serves the relay.

use prompt_relay::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prompt_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Configuration problems stop us before the listener binds
    let config = Config::from_env()?;
    config.prepare_workspace()?;
    info!(
        "Loaded configuration: model={}, persona={}, working_directory={}",
        config.default_model,
        config.default_persona,
        config.working_directory.display()
    );

    api::serve(config).await?;

    Ok(())
}
