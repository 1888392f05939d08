//! Live reload: channel registry, style broadcasting and asset watching.

mod build_id;
mod debouncer;
mod registry;
mod styles;
mod watcher;
mod websocket;

use std::sync::Arc;

pub use build_id::BuildId;
pub use registry::{
    Channel, ChannelError, ChannelId, CloseCallback, CloseSignal, ConnectionRegistry,
    ReloadMessage,
};
pub use styles::StyleBroadcaster;
pub use watcher::StyleWatcher;
pub(crate) use websocket::{ws_handler, ws_handler_untagged};

/// Register a newly opened channel and tell it whether it is stale.
///
/// A client whose tag does not match `build_id` gets a single
/// [`ReloadMessage::Reload`]; a matching client gets nothing.
pub fn connect(
    registry: &Arc<ConnectionRegistry>,
    build_id: &BuildId,
    channel: Arc<dyn Channel>,
    client_tag: &str,
) {
    registry.register(Arc::clone(&channel));

    if !build_id.matches(client_tag) {
        tracing::debug!(channel = %channel.id(), client_tag, "Stale client, requesting reload");
        if let Err(err) = channel.send(ReloadMessage::Reload) {
            tracing::debug!(channel = %channel.id(), error = %err, "Reload request not delivered");
        }
    }
}
