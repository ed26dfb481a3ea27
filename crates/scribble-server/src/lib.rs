//! Scribble room server.
//!
//! Participants connect over WebSocket and are placed in a room. Each room
//! owns an operation log and its sessions; strokes, undo, redo and clear are
//! applied to the log and answered with a full-log resync to the whole room,
//! while in-progress segments and cursors are relayed to the other sessions.
//!
//! ## Protocol
//!
//! Messages are JSON envelopes:
//! ```json
//! { "type": "STROKE", "payload": { "id": "...", "color": "#222", "width": 3, "points": [...] } }
//! { "type": "UNDO" }
//! { "type": "CURSOR", "payload": { "x": 100, "y": 200 } }
//! ```
//! See [`scribble_core::protocol`] for every message kind.

pub mod broadcast;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod room;
pub mod server;
pub mod session;

pub use broadcast::{FanOutReport, broadcast, fan_out, presence_snapshot};
pub use config::ServerConfig;
pub use dispatch::{Outcome, dispatch, handle_text};
pub use error::ServerError;
pub use registry::RoomRegistry;
pub use room::{Room, RoomSummary, SharedRoom};
pub use server::{AppState, router, serve, serve_on};
pub use session::{Delivery, Outbound, Session, SessionId};

#[cfg(test)]
pub(crate) mod test_support {
    use scribble_core::ServerMessage;
    use tokio::sync::mpsc::Receiver;

    use crate::session::Outbound;

    /// Everything currently queued for a session, decoded.
    pub fn drain(rx: &mut Receiver<Outbound>) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(text) = rx.try_recv() {
            messages.push(ServerMessage::from_json(&text).unwrap());
        }
        messages
    }
}
