use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;

use crate::event::PushEvent;

use super::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &PushEvent,
) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(event = event.name(), error = %e, "Failed to encode push event");
            return Ok(());
        }
    };
    sender.send(Message::Text(text.into())).await
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let client_id = uuid::Uuid::new_v4();
    tracing::info!(%client_id, "Client connected");

    // Subscribe before the initial snapshot so no broadcast falls in between.
    let mut events = state.events.subscribe();
    let mut shutdown = state.shutdown.clone();
    let (mut sender, mut receiver) = socket.split();

    let initial = [
        PushEvent::Signals(state.service.list_active_signals().await),
        PushEvent::Portfolio(state.service.current_portfolio().await),
    ];
    for event in &initial {
        if let Err(e) = send_event(&mut sender, event).await {
            tracing::debug!(%client_id, error = %e, "Initial push failed");
            return;
        }
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if let Err(e) = send_event(&mut sender, &event).await {
                        tracing::debug!(%client_id, error = %e, "Push failed, dropping client");
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(%client_id, skipped, "Client lagging, skipped push events");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(%client_id, error = %e, "WebSocket read error");
                    break;
                }
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    }

    tracing::info!(%client_id, "Client disconnected");
}
