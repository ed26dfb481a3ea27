//! Maps inbound messages to room operations and their broadcasts.
//!
//! | inbound | room operation   | broadcast                         |
//! |---------|------------------|-----------------------------------|
//! | STROKE  | `apply_commit`   | SYNC_STATE to all, sender included |
//! | UNDO    | `apply_undo`     | SYNC_STATE to all                 |
//! | REDO    | `apply_redo`     | SYNC_STATE to all                 |
//! | CLEAR   | `apply_clear`    | SYNC_STATE (empty) to all         |
//! | DRAW    | none             | DRAW to others                    |
//! | CURSOR  | none             | CURSOR to others, sender stamped  |
//!
//! A mutation that leaves the log unchanged (degenerate stroke, undo or redo
//! with nothing to act on) broadcasts nothing.

use scribble_core::{ClientMessage, ProtocolError, RemoteCursor, ServerMessage};
use tracing::{debug, warn};

use crate::broadcast::broadcast;
use crate::room::Room;

/// What handling an inbound message did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The log changed and the full log was sent to the room.
    Resynced,
    /// A mutation was a no-op; nothing was sent.
    Unchanged,
    /// A transient message was passed on to the other sessions.
    Relayed,
    /// The message was dropped without effect.
    Ignored,
}

/// Decode a text frame from `sender` and handle it.
pub fn handle_text(room: &mut Room, sender: &str, text: &str) -> Outcome {
    match ClientMessage::parse(text) {
        Ok(message) => dispatch(room, sender, message),
        Err(ProtocolError::UnknownKind(kind)) => {
            warn!("Unknown message type {} from {}", kind, sender);
            Outcome::Ignored
        }
        Err(e) => {
            warn!("Invalid message from {}: {}", sender, e);
            Outcome::Ignored
        }
    }
}

/// Apply one decoded message from `sender` to `room`.
pub fn dispatch(room: &mut Room, sender: &str, message: ClientMessage) -> Outcome {
    // Sessions that already left (or were evicted) have no say
    let Some(sender_color) = room.session(sender).map(|s| s.color().to_string()) else {
        debug!("Dropping {} from departed session {}", message.kind(), sender);
        return Outcome::Ignored;
    };

    match message {
        ClientMessage::Stroke(stroke) => {
            let stroke_id = stroke.id.clone();
            let points = stroke.points.len();
            if room.apply_commit(stroke) {
                debug!("Committed stroke {} ({} points) in room {}", stroke_id, points, room.id());
                resync(room)
            } else {
                debug!("Dropping degenerate stroke {} ({} points)", stroke_id, points);
                Outcome::Unchanged
            }
        }
        ClientMessage::Undo => {
            if room.apply_undo() {
                resync(room)
            } else {
                Outcome::Unchanged
            }
        }
        ClientMessage::Redo => {
            if room.apply_redo() {
                resync(room)
            } else {
                Outcome::Unchanged
            }
        }
        ClientMessage::Clear => {
            room.apply_clear();
            debug!("Cleared room {}", room.id());
            resync(room)
        }
        ClientMessage::Draw(payload) => {
            broadcast(room, &ServerMessage::Draw(payload), Some(sender));
            Outcome::Relayed
        }
        ClientMessage::Cursor(position) => {
            let cursor = ServerMessage::Cursor(RemoteCursor {
                user_id: sender.to_string(),
                x: position.x,
                y: position.y,
                color: sender_color,
            });
            broadcast(room, &cursor, Some(sender));
            Outcome::Relayed
        }
    }
}

/// Send the full log to everyone in the room.
fn resync(room: &mut Room) -> Outcome {
    let state = ServerMessage::SyncState(room.log().all_operations().to_vec());
    broadcast(room, &state, None);
    Outcome::Resynced
}
