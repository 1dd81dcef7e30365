use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use inkroom_shared::{ClientMessage, ServerMessage};

use crate::logic::{apply_client_message, apply_leave, dispatch};
use crate::rooms::{evict_if_empty, get_or_create_room, new_room_id, normalize_room_id};
use crate::state::AppState;

pub async fn root_handler() -> impl IntoResponse {
    Redirect::to(&format!("/r/{}", new_room_id()))
}

pub async fn room_handler(
    Path(room_id): Path<String>,
    axum::Extension(index_file): axum::Extension<std::path::PathBuf>,
) -> impl IntoResponse {
    if normalize_room_id(&room_id).is_none() {
        return StatusCode::NOT_FOUND.into_response();
    }
    match tokio::fs::read_to_string(index_file).await {
        Ok(contents) => Html(contents).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

pub async fn ws_handler(
    Path(room_id): Path<String>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let room_id = match normalize_room_id(&room_id) {
        Some(id) => id,
        None => return StatusCode::NOT_FOUND.into_response(),
    };
    ws.on_upgrade(move |socket| handle_socket(socket, state, room_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, room_id: String) {
    let (mut socket_sender, mut socket_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let connection_id = Uuid::new_v4();

    let room = get_or_create_room(&state, &room_id).await;
    {
        let mut room = room.write().await;
        room.peers.insert(connection_id, tx);
        info!(%room_id, %connection_id, peers = room.peers.len(), "connected");
    }

    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            match serde_json::to_string(&message) {
                Ok(payload) => {
                    if socket_sender.send(Message::Text(payload)).await.is_err() {
                        break;
                    }
                }
                Err(error) => {
                    warn!(%error, "failed to serialize outbound message");
                }
            }
        }
    });

    let mut joined = false;
    while let Some(Ok(message)) = socket_receiver.next().await {
        match message {
            Message::Text(text) => {
                let client_message = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(parsed) => parsed,
                    Err(error) => {
                        // One bad frame must never take down the room.
                        debug!(%connection_id, %error, "dropping unparseable frame");
                        continue;
                    }
                };
                if matches!(client_message, ClientMessage::Join { .. }) {
                    if !joined {
                        state.directory.write().await.add_member(&room_id, connection_id);
                    }
                    joined = true;
                }
                let outgoing = {
                    let mut room = room.write().await;
                    apply_client_message(&mut room, connection_id, client_message)
                };
                dispatch(&room, connection_id, outgoing).await;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    // Disconnect is just another serialized room action: drop the peer,
    // discard any open stroke, tell the remainder.
    let outgoing = {
        let mut room = room.write().await;
        room.peers.remove(&connection_id);
        info!(%room_id, %connection_id, peers = room.peers.len(), "disconnected");
        if joined {
            apply_leave(&mut room, connection_id)
        } else {
            Vec::new()
        }
    };
    dispatch(&room, connection_id, outgoing).await;
    send_task.abort();

    if joined {
        state
            .directory
            .write()
            .await
            .remove_member(&room_id, connection_id);
    }
    evict_if_empty(&state, &room_id, &room).await;
}
