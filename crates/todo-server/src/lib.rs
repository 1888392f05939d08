//! HTTP server for the todo app.
//!
//! Serves a server-rendered, streamed todo page together with its built
//! client assets and a small JSON API over the todo store. During
//! development a WebSocket endpoint tells open pages to reload when the
//! server restarts, or to re-fetch the stylesheet when it is rebuilt.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::PathBuf;
//! use todo_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         client_path: PathBuf::from("dist/client.js"),
//!         styles_path: PathBuf::from("dist/styles.css"),
//!         ..ServerConfig::default()
//!     };
//!
//!     run_server(config).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum router (todo-server)
//!                        │
//!                        ├─► GET /  ──► PageTemplate ──► todo-render stream
//!                        │                                 (trailer: x-render-status)
//!                        │
//!                        ├─► /todos ──► Database (todo-store)
//!                        │
//!                        └─► /livereload/{id} ──► ConnectionRegistry
//!                                                      ▲
//!                      StyleWatcher (notify) ──► StyleBroadcaster
//! ```
//!
//! Every process generates a fresh [`BuildId`] which the page embeds. A
//! client connecting with an older id is told to `reload`; stylesheet
//! rebuilds broadcast `loadStyles` to every open channel.

mod app;
mod error;
mod handlers;
mod live_reload;
mod middleware;
mod page;
mod render;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use todo_store::MemoryDatabase;

pub use app::{RouterConfig, RouterInfo, create_router};
pub use error::ServerError;
pub use live_reload::{
    BuildId, Channel, ChannelError, ChannelId, CloseCallback, CloseSignal, ConnectionRegistry,
    ReloadMessage, StyleBroadcaster, StyleWatcher, connect,
};
pub use page::{PageContext, PageTemplate, TodoPage};
pub use render::{FALLBACK_HTML, RENDER_STATUS};

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Built client bundle.
    pub client_path: PathBuf,
    /// Built stylesheet.
    pub styles_path: PathBuf,
    /// Enable live reload.
    pub live_reload_enabled: bool,
    /// Quiet period before a stylesheet change is applied.
    pub debounce_ms: u64,
    /// Enable verbose output.
    pub verbose: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7878,
            client_path: PathBuf::from("dist/client.js"),
            styles_path: PathBuf::from("dist/styles.css"),
            live_reload_enabled: true,
            debounce_ms: 100,
            verbose: false,
        }
    }
}

/// Run the server until Ctrl-C.
///
/// # Arguments
///
/// * `config` - Server configuration
///
/// # Errors
///
/// Returns an error if the assets cannot be read, the watcher cannot be
/// started, or the server fails to bind.
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let client = tokio::fs::read(&config.client_path).await.map_err(|e| {
        format!("Failed to read client bundle {}: {e}", config.client_path.display())
    })?;
    let styles = tokio::fs::read_to_string(&config.styles_path)
        .await
        .map_err(|e| format!("Failed to read stylesheet {}: {e}", config.styles_path.display()))?;

    let info = create_router(
        RouterConfig::new()
            .with_client(client)
            .with_styles(styles)
            .with_database(Arc::new(MemoryDatabase::new()))
            .with_live_reload(config.live_reload_enabled),
    );

    // Held for the lifetime of the server; dropping it stops watching
    let _watcher = if config.live_reload_enabled {
        let mut watcher = StyleWatcher::new(
            config.styles_path.clone(),
            Arc::clone(&info.styles),
            Duration::from_millis(config.debounce_ms),
        );
        watcher.start()?;
        tracing::info!(build_id = %info.build_id, "Live reload enabled");
        Some(watcher)
    } else {
        None
    };

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, info.router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from the loaded `todo.toml`.
///
/// # Arguments
///
/// * `config` - Loaded configuration
/// * `verbose` - Enable verbose output
#[must_use]
pub fn server_config_from_config(config: &todo_config::Config, verbose: bool) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        client_path: config.assets_resolved.client_path.clone(),
        styles_path: config.assets_resolved.styles_path.clone(),
        live_reload_enabled: config.live_reload.enabled,
        debounce_ms: config.live_reload.debounce_ms,
        verbose,
    }
}
