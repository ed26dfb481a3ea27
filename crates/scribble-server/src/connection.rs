//! Session lifecycle over a WebSocket connection.
//!
//! Each connection runs two halves: the reader loop feeds inbound frames to
//! the room under its lock, and a writer task drains the session's outbound
//! queue into the socket. The room only ever touches the queue, so a slow
//! socket holds up nobody but its own writer.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use scribble_core::ServerMessage;
use tracing::{debug, info, warn};

use crate::broadcast::{broadcast_presence, send_to};
use crate::dispatch::handle_text;
use crate::room::{Room, SharedRoom};
use crate::session::{Delivery, Session};

/// Add `session` to `room`, send it the full log, then announce it.
///
/// Runs under the room lock, so the SYNC_STATE is the first message in the
/// new session's queue.
pub fn admit(room: &mut Room, session: Session) {
    let session_id = session.id().to_string();
    if !room.join(session) {
        debug!("Session {} already in room {}", session_id, room.id());
        return;
    }

    let state = ServerMessage::SyncState(room.log().all_operations().to_vec());
    if send_to(room, &session_id, &state) != Delivery::Queued {
        warn!("Could not queue initial state for {}", session_id);
    }
    broadcast_presence(room);
}

/// Remove a session and announce the new membership.
/// Returns false if the session had already left.
pub fn release(room: &mut Room, session_id: &str) -> bool {
    if room.leave(session_id).is_none() {
        return false;
    }
    broadcast_presence(room);
    true
}

/// Drive one participant's connection until either side closes.
pub async fn handle_socket(socket: WebSocket, room: SharedRoom, channel_capacity: usize) {
    let (session, mut outbound) = Session::new(channel_capacity);
    let session_id = session.id().to_string();
    let name = session.name().to_string();

    let room_id = {
        let mut room = room.lock().await;
        admit(&mut room, session);
        info!(
            "{} joined room {}. Total users: {}",
            name,
            room.id(),
            room.session_count()
        );
        room.id().to_string()
    };

    let (mut sender, mut receiver) = socket.split();

    let mut writer = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if sender.send(Message::Text(text.as_ref().into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let mut room = room.lock().await;
                        handle_text(&mut room, &session_id, text.as_str());
                    }
                    Some(Ok(Message::Binary(data))) => {
                        debug!("Ignoring {} byte binary frame from {}", data.len(), name);
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // Ignore ping/pong
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", name, e);
                        break;
                    }
                }
            }
            // Writer ends when the socket fails or the room evicted us
            _ = &mut writer => {
                debug!("Outbound stream for {} ended", name);
                break;
            }
        }
    }

    // Cleanup on disconnect
    {
        let mut room = room.lock().await;
        release(&mut room, &session_id);
        info!(
            "{} left room {}. Total users: {}",
            name,
            room_id,
            room.session_count()
        );
    }
    writer.abort();
}
