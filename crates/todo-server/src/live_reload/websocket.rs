//! WebSocket handler for live reload.
//!
//! Each socket is wrapped in a [`WsChannel`] fed by an unbounded queue, so
//! registry broadcasts never wait on the network.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use tokio::sync::mpsc;

use super::registry::{Channel, ChannelError, ChannelId, CloseCallback, CloseSignal, ReloadMessage};
use crate::state::AppState;

/// [`Channel`] backed by a WebSocket connection task.
struct WsChannel {
    id: ChannelId,
    outbox: mpsc::UnboundedSender<ReloadMessage>,
    close: CloseSignal,
}

impl Channel for WsChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn send(&self, message: ReloadMessage) -> Result<(), ChannelError> {
        if self.close.is_closed() {
            return Err(ChannelError::Closed);
        }
        self.outbox.send(message).map_err(|_| ChannelError::Closed)
    }

    fn on_close(&self, callback: CloseCallback) {
        self.close.subscribe(callback);
    }
}

/// Handle WebSocket upgrade for `GET /livereload/{id}`.
///
/// `id` is the build identity the client last saw.
pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(client_tag): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, client_tag, state))
}

/// Handle WebSocket upgrade for `GET /livereload` without a build identity.
///
/// Such a client cannot prove it is current, so it is told to reload.
pub(crate) async fn ws_handler_untagged(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, String::new(), state))
}

/// Handle an established WebSocket connection.
async fn handle_socket(mut socket: WebSocket, client_tag: String, state: Arc<AppState>) {
    let (outbox, mut inbox) = mpsc::unbounded_channel();
    let channel = Arc::new(WsChannel {
        id: ChannelId::new(),
        outbox,
        close: CloseSignal::default(),
    });

    super::connect(
        &state.registry,
        &state.build_id,
        Arc::clone(&channel) as Arc<dyn Channel>,
        &client_tag,
    );

    loop {
        tokio::select! {
            // Forward queued messages to the client
            queued = inbox.recv() => {
                let Some(message) = queued else { break };
                if socket.send(Message::Text(message.as_str().into())).await.is_err() {
                    break;
                }
            }
            // Client messages are ignored; close or error ends the session
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    channel.close.close();
}
