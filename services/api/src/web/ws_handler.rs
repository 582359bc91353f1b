//! services/api/src/web/ws_handler.rs
//!
//! Upgrades an authenticated request to a WebSocket that streams the caller's
//! `LibraryEvent`s as JSON text frames until the client goes away.

use crate::web::{
    events::EventHub,
    protocol::LibraryEvent,
    state::{AppState, CurrentUser},
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// GET /ws - Live feed of the caller's library changes
#[utoipa::path(
    get,
    path = "/ws",
    responses(
        (status = 101, description = "Switching to the WebSocket event feed", body = LibraryEvent),
        (status = 303, description = "No session, redirected to /")
    )
)]
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    // Subscribe before upgrading so nothing published during the handshake is lost.
    let events = app_state.events.subscribe(user.user_id);
    ws.on_upgrade(move |socket| handle_socket(socket, app_state.events.clone(), events, user.user_id))
}

async fn handle_socket(
    socket: WebSocket,
    hub: EventHub,
    events: broadcast::Receiver<LibraryEvent>,
    user_id: Uuid,
) {
    info!("New WebSocket connection established for user: {}", user_id);

    let (sender, mut receiver) = socket.split();
    let token = CancellationToken::new();

    let forward = tokio::spawn(forward_events(sender, events, token.clone()));

    // The client never needs to send anything; we only watch for it leaving.
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Close(_)) => break,
            Ok(_) => debug!("Ignoring inbound frame from user {}", user_id),
            Err(e) => {
                warn!("WebSocket receive error for user {}: {}", user_id, e);
                break;
            }
        }
    }

    token.cancel();
    if let Err(e) = forward.await {
        error!("Event forwarder for user {} panicked: {:?}", user_id, e);
    }
    // The forwarder owned this connection's receiver, so it is gone by now.
    hub.release(user_id);
    debug!(open_channels = hub.channel_count(), "WebSocket closed for user {}", user_id);
}

async fn forward_events(
    mut sender: SplitSink<WebSocket, Message>,
    mut events: broadcast::Receiver<LibraryEvent>,
    token: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = token.cancelled() => break,
            received = events.recv() => match received {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Subscriber lagged by {} events, asking for resync", skipped);
                    LibraryEvent::Resync
                }
                Err(RecvError::Closed) => break,
            },
        };

        let json = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize event: {:?}", e);
                continue;
            }
        };
        if sender.send(Message::Text(json.into())).await.is_err() {
            break;
        }
    }
    let _ = sender.close().await;
}
