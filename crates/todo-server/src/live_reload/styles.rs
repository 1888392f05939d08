//! Current stylesheet and style-change broadcasting.

use std::sync::{Arc, PoisonError, RwLock};

use super::registry::{ConnectionRegistry, ReloadMessage};

/// Owns the stylesheet snapshot served at `/styles.css`.
///
/// Updates replace the snapshot wholesale and then tell every open channel to
/// re-fetch it. The push carries no payload.
pub struct StyleBroadcaster {
    current: RwLock<Arc<str>>,
    registry: Arc<ConnectionRegistry>,
}

impl StyleBroadcaster {
    /// Create a broadcaster with an initial stylesheet.
    pub fn new(initial: impl Into<Arc<str>>, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            current: RwLock::new(initial.into()),
            registry,
        }
    }

    /// Current stylesheet.
    pub fn current(&self) -> Arc<str> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the stylesheet and notify every open channel.
    pub fn update_styles(&self, styles: impl Into<Arc<str>>) {
        let styles = styles.into();
        let bytes = styles.len();
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = styles;

        let notified = self.registry.broadcast(ReloadMessage::LoadStyles);
        tracing::info!(bytes, notified, "Stylesheet updated");
    }
}
