//! Connection registry for live reload channels.
//!
//! Channels are modelled as the [`Channel`] capability so the registry does
//! not depend on the WebSocket transport. Removal is wired to each channel's
//! close notification when it is registered, so closed channels never linger.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

/// Message pushed to live reload clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReloadMessage {
    /// Client code is stale, reload the page.
    Reload,
    /// Stylesheet changed, re-fetch `/styles.css`.
    LoadStyles,
}

impl ReloadMessage {
    /// Wire representation sent as a text frame.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reload => "reload",
            Self::LoadStyles => "loadStyles",
        }
    }
}

impl fmt::Display for ReloadMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque channel identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelId(Uuid);

impl ChannelId {
    /// Allocate a fresh identity.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Failure to push a message to a channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The channel is closed or closing.
    #[error("channel closed")]
    Closed,
}

/// Callback run once when a channel closes.
pub type CloseCallback = Box<dyn FnOnce() + Send>;

/// A push-capable connection to one client.
pub trait Channel: Send + Sync {
    /// Stable identity of this channel.
    fn id(&self) -> ChannelId;

    /// Queue a message for the client.
    ///
    /// Must not block and must not call back into the registry.
    fn send(&self, message: ReloadMessage) -> Result<(), ChannelError>;

    /// Run `callback` when the channel closes.
    ///
    /// If the channel is already closed the callback runs immediately.
    fn on_close(&self, callback: CloseCallback);
}

/// Close notification shared by [`Channel`] implementations.
#[derive(Default)]
pub struct CloseSignal {
    closed: AtomicBool,
    callbacks: Mutex<Vec<CloseCallback>>,
}

impl CloseSignal {
    /// Whether [`CloseSignal::close`] has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Register a callback, running it now if already closed.
    pub fn subscribe(&self, callback: CloseCallback) {
        {
            let mut callbacks = self.callbacks.lock().unwrap_or_else(PoisonError::into_inner);
            if !self.is_closed() {
                callbacks.push(callback);
                return;
            }
        }
        callback();
    }

    /// Mark closed and run pending callbacks. Later calls are no-ops.
    pub fn close(&self) {
        let callbacks = {
            let mut callbacks = self.callbacks.lock().unwrap_or_else(PoisonError::into_inner);
            if self.closed.swap(true, Ordering::SeqCst) {
                return;
            }
            std::mem::take(&mut *callbacks)
        };
        for callback in callbacks {
            callback();
        }
    }
}

/// Set of open live reload channels.
#[derive(Default)]
pub struct ConnectionRegistry {
    channels: Mutex<HashMap<ChannelId, Arc<dyn Channel>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Add a channel and wire its removal to the channel's close event.
    ///
    /// Registering a channel that is already present is a no-op.
    pub fn register(self: &Arc<Self>, channel: Arc<dyn Channel>) {
        let id = channel.id();
        {
            let mut channels = self.lock();
            if channels.contains_key(&id) {
                return;
            }
            channels.insert(id, Arc::clone(&channel));
        }

        let registry = Arc::downgrade(self);
        channel.on_close(Box::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.unregister(id);
            }
        }));
        tracing::debug!(channel = %id, "Live reload channel registered");
    }

    /// Remove a channel. Returns `false` if it was not registered.
    pub fn unregister(&self, id: ChannelId) -> bool {
        let removed = self.lock().remove(&id).is_some();
        if removed {
            tracing::debug!(channel = %id, "Live reload channel removed");
        }
        removed
    }

    /// Send `message` to every registered channel.
    ///
    /// Send failures are logged and skipped. Returns the number of channels
    /// the message was delivered to.
    pub fn broadcast(&self, message: ReloadMessage) -> usize {
        // The lock is held while sending so concurrent broadcasts reach every
        // channel in the same order. `Channel::send` never blocks.
        let channels = self.lock();
        let mut delivered = 0;
        for (id, channel) in channels.iter() {
            match channel.send(message) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    tracing::debug!(channel = %id, %message, error = %err, "Live reload send failed");
                }
            }
        }
        delivered
    }

    /// Number of registered channels.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no channels are registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: ChannelId) -> bool {
        self.lock().contains_key(&id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ChannelId, Arc<dyn Channel>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeChannel;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reload_message_wire_format() {
        assert_eq!(ReloadMessage::Reload.as_str(), "reload");
        assert_eq!(ReloadMessage::LoadStyles.as_str(), "loadStyles");
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let channel = FakeChannel::new();

        registry.register(channel.clone());
        registry.register(channel.clone());

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.broadcast(ReloadMessage::LoadStyles), 1);
        assert_eq!(channel.messages(), vec![ReloadMessage::LoadStyles]);
    }

    #[test]
    fn test_unregister_absent_is_noop() {
        let registry = ConnectionRegistry::new();
        let channel = FakeChannel::new();

        assert!(!registry.unregister(channel.id()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_membership_tracks_register_and_unregister() {
        let registry = ConnectionRegistry::new();
        let a = FakeChannel::new();
        let b = FakeChannel::new();
        let c = FakeChannel::new();

        registry.register(a.clone());
        registry.register(b.clone());
        assert!(registry.unregister(a.id()));
        registry.register(c.clone());
        registry.register(a.clone());
        assert!(registry.unregister(b.id()));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains(a.id()));
        assert!(!registry.contains(b.id()));
        assert!(registry.contains(c.id()));
    }

    #[test]
    fn test_close_event_removes_channel() {
        let registry = ConnectionRegistry::new();
        let channel = FakeChannel::new();

        registry.register(channel.clone());
        channel.close();

        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_after_close_does_not_leak() {
        let registry = ConnectionRegistry::new();
        let channel = FakeChannel::new();
        channel.close();

        registry.register(channel.clone());

        assert!(registry.is_empty());
    }

    #[test]
    fn test_close_after_unregister_then_reregister() {
        let registry = ConnectionRegistry::new();
        let channel = FakeChannel::new();

        registry.register(channel.clone());
        registry.unregister(channel.id());
        registry.register(channel.clone());
        channel.close();

        assert!(registry.is_empty());
    }

    #[test]
    fn test_broadcast_reaches_every_member() {
        let registry = ConnectionRegistry::new();
        let channels: Vec<_> = (0..3).map(|_| FakeChannel::new()).collect();
        for channel in &channels {
            registry.register(channel.clone());
        }

        let delivered = registry.broadcast(ReloadMessage::LoadStyles);

        assert_eq!(delivered, 3);
        for channel in &channels {
            assert_eq!(channel.messages(), vec![ReloadMessage::LoadStyles]);
        }
    }

    #[test]
    fn test_broadcast_skips_failing_channel() {
        let registry = ConnectionRegistry::new();
        let healthy_before = FakeChannel::new();
        let broken = FakeChannel::failing();
        let healthy_after = FakeChannel::new();
        registry.register(healthy_before.clone());
        registry.register(broken.clone());
        registry.register(healthy_after.clone());

        let delivered = registry.broadcast(ReloadMessage::LoadStyles);

        assert_eq!(delivered, 2);
        assert_eq!(healthy_before.messages(), vec![ReloadMessage::LoadStyles]);
        assert_eq!(healthy_after.messages(), vec![ReloadMessage::LoadStyles]);
        assert!(broken.messages().is_empty());
    }

    #[test]
    fn test_late_registration_misses_earlier_broadcast() {
        let registry = ConnectionRegistry::new();
        let early = FakeChannel::new();
        registry.register(early.clone());

        registry.broadcast(ReloadMessage::LoadStyles);
        let late = FakeChannel::new();
        registry.register(late.clone());
        registry.broadcast(ReloadMessage::Reload);

        assert_eq!(
            early.messages(),
            vec![ReloadMessage::LoadStyles, ReloadMessage::Reload]
        );
        assert_eq!(late.messages(), vec![ReloadMessage::Reload]);
    }

    #[test]
    fn test_closed_channel_receives_nothing() {
        let registry = ConnectionRegistry::new();
        let open = FakeChannel::new();
        let closed = FakeChannel::new();
        registry.register(open.clone());
        registry.register(closed.clone());
        closed.close();

        assert_eq!(registry.broadcast(ReloadMessage::LoadStyles), 1);
        assert!(closed.messages().is_empty());
    }

    #[test]
    fn test_close_signal_runs_callbacks_once() {
        let signal = CloseSignal::default();
        let count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        signal.subscribe(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        signal.close();
        signal.close();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(signal.is_closed());
    }
}
