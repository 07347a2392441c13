//! tavern-companion HTTP server binary.
//!
//! Serves a SillyTavern user data directory read-only and relays chat
//! messages for the browser extension.
//!
//! # Environment Variables
//!
//! - `TAVERN_DATA_ROOT`: User data directory (default: ./data/default-user)
//! - `TAVERN_GROUP_FILES_ROOT`: Secondary root for group avatars
//! - `HOST`: Bind address (default: 0.0.0.0)
//! - `PORT`: HTTP port (default: 3000)
//! - `RUST_LOG`: Tracing filter (default: "info,tavern_companion=debug")
//!
//! # Usage
//!
//! ```bash
//! TAVERN_DATA_ROOT=~/SillyTavern/data/default-user cargo run --bin server
//! ```

use anyhow::Context;
use tavern_companion::config::ServerConfig;
use tavern_companion::server::{app_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tavern_companion=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env();
    let bind_addr = config.bind_addr();

    if !config.data_root.is_dir() {
        tracing::warn!(
            "Data root {} is not a directory; library endpoints will be empty",
            config.data_root.display()
        );
    }

    let app = app_router(AppState::from_config(&config));

    tracing::info!("tavern-companion {} starting on {}", tavern_companion::VERSION, bind_addr);
    tracing::info!("Data root: {}", config.data_root.display());
    if let Some(root) = &config.group_files_root {
        tracing::info!("Group files root: {}", root.display());
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
