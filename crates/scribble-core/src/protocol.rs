//! JSON wire protocol between participants and the room server.
//!
//! Every frame is an envelope with a `type` discriminator and a `payload`:
//! ```json
//! { "type": "STROKE", "payload": { "id": "...", "color": "#000", "width": 2, "points": [{ "x": 0, "y": 0 }] } }
//! { "type": "UNDO" }
//! { "type": "SYNC_STATE", "payload": [ ... ] }
//! ```
//! `payload` may be left out for kinds that carry none.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::operation::{Operation, Stroke};

/// Errors raised while decoding an inbound envelope.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed envelope: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("Envelope has no type")]
    MissingType,
    #[error("Unknown message type: {0}")]
    UnknownKind(String),
    #[error("Invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// A position on the canvas, as sent with CURSOR.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorPosition {
    pub x: f64,
    pub y: f64,
}

/// Another participant's pointer, stamped by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCursor {
    pub user_id: String,
    pub x: f64,
    pub y: f64,
    pub color: String,
}

/// One participant in a PRESENCE list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEntry {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// Messages sent by participants.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Transient segment of a stroke still being drawn, usually
    /// `{start, end, color, width}`. Opaque to the server and relayed as sent.
    Draw(Value),
    /// Finished stroke to commit
    Stroke(Stroke),
    Undo,
    Redo,
    Clear,
    /// Local pointer position
    Cursor(CursorPosition),
}

/// Raw envelope, before the payload is interpreted.
#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    payload: Value,
}

fn payload<T: serde::de::DeserializeOwned>(
    kind: &'static str,
    value: Value,
) -> Result<T, ProtocolError> {
    serde_json::from_value(value).map_err(|source| ProtocolError::InvalidPayload { kind, source })
}

impl ClientMessage {
    /// Decode an inbound text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(text).map_err(ProtocolError::Malformed)?;
        let kind = envelope.kind.ok_or(ProtocolError::MissingType)?;

        match kind.as_str() {
            "DRAW" => Ok(ClientMessage::Draw(envelope.payload)),
            "STROKE" => payload("STROKE", envelope.payload).map(ClientMessage::Stroke),
            "UNDO" => Ok(ClientMessage::Undo),
            "REDO" => Ok(ClientMessage::Redo),
            "CLEAR" => Ok(ClientMessage::Clear),
            "CURSOR" => payload("CURSOR", envelope.payload).map(ClientMessage::Cursor),
            _ => Err(ProtocolError::UnknownKind(kind)),
        }
    }

    /// Wire name of this message's kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Draw(_) => "DRAW",
            ClientMessage::Stroke(_) => "STROKE",
            ClientMessage::Undo => "UNDO",
            ClientMessage::Redo => "REDO",
            ClientMessage::Clear => "CLEAR",
            ClientMessage::Cursor(_) => "CURSOR",
        }
    }

    /// Whether handling this message may change the operation log.
    pub fn mutates_log(&self) -> bool {
        matches!(
            self,
            ClientMessage::Stroke(_) | ClientMessage::Undo | ClientMessage::Redo | ClientMessage::Clear
        )
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Messages sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// Full log, tombstones included; replaces the receiver's state
    SyncState(Vec<Operation>),
    /// Segment relayed from another participant, payload untouched
    Draw(Value),
    /// Pointer of another participant
    Cursor(RemoteCursor),
    /// Current room membership
    Presence(Vec<PresenceEntry>),
}

impl ServerMessage {
    /// Transient messages may be dropped under backpressure; a later
    /// SYNC_STATE makes up for anything lost.
    pub fn is_transient(&self) -> bool {
        matches!(self, ServerMessage::Draw(_) | ServerMessage::Cursor(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::SyncState(_) => "SYNC_STATE",
            ServerMessage::Draw(_) => "DRAW",
            ServerMessage::Cursor(_) => "CURSOR",
            ServerMessage::Presence(_) => "PRESENCE",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
