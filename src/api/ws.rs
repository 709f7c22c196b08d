//! Real-time channel (GET /ws)
//!
//! Each connection is one hub subscriber. Events are pushed as JSON text
//! frames; anything the browser sends other than a close frame is ignored.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use tracing::{debug, info, warn};

use super::state::AppState;
use crate::dashboard::{DashboardEvent, Subscription};

pub async fn subscribe(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_events(socket, state))
}

async fn stream_events(mut socket: WebSocket, state: AppState) {
    let Subscription { id, mut events } = state.dashboard.subscribe();
    info!(subscriber = %id, "Subscriber connected");

    loop {
        tokio::select! {
            event = events.recv() => {
                // None: the hub dropped this subscriber as stalled.
                let Some(event) = event else { break };
                if send_event(&mut socket, &event).await.is_err() {
                    break;
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        debug!(subscriber = %id, error = %err, "Subscriber connection error");
                        break;
                    }
                }
            }
        }
    }

    state.dashboard.unsubscribe(id);
    info!(subscriber = %id, "Subscriber disconnected");
}

async fn send_event(socket: &mut WebSocket, event: &DashboardEvent) -> Result<(), axum::Error> {
    let payload = match serde_json::to_string(event) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "Failed to encode dashboard event");
            return Ok(());
        }
    };

    socket.send(Message::Text(payload.into())).await
}
