//! Application state.
//!
//! Shared state for all request handlers.

use std::sync::Arc;

use bytes::Bytes;
use todo_store::Database;

use crate::live_reload::{BuildId, ConnectionRegistry, StyleBroadcaster};
use crate::page::PageTemplate;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Todo store.
    pub(crate) db: Arc<dyn Database>,
    /// Built client bundle.
    pub(crate) client: Bytes,
    /// Current stylesheet and its broadcaster.
    pub(crate) styles: Arc<StyleBroadcaster>,
    /// Open live reload channels.
    pub(crate) registry: Arc<ConnectionRegistry>,
    /// Identity of this server process.
    pub(crate) build_id: BuildId,
    /// Whether the live reload endpoint is mounted.
    pub(crate) live_reload: bool,
    /// Page markup for `GET /`.
    pub(crate) page: Arc<dyn PageTemplate>,
}

impl AppState {
    /// Check if live reload is enabled.
    #[must_use]
    pub(crate) fn live_reload_enabled(&self) -> bool {
        self.live_reload
    }
}
