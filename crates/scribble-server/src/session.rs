//! One connected participant.

use scribble_core::PresenceEntry;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

/// Session identifier, assigned at connect time.
pub type SessionId = String;

/// A serialized server message, shared between every recipient's queue.
pub type Outbound = Arc<str>;

/// Result of handing a message to a session's outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// Queue is at capacity; the recipient is not keeping up.
    Full,
    /// The connection's writer has gone away.
    Closed,
}

/// A participant: identity, display attributes and outbound queue.
///
/// The socket itself is owned by the connection task, which drains the
/// receiving half of the queue. Dropping the `Session` closes the queue.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    name: String,
    color: String,
    tx: mpsc::Sender<Outbound>,
}

impl Session {
    /// Create a session with a fresh id and a queue of `capacity` messages.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let id = Uuid::new_v4();
        let color = color_for(&id);
        Self::with_identity(id.to_string(), color, capacity)
    }

    /// Create a session with a known id and color.
    pub fn with_identity(
        id: impl Into<SessionId>,
        color: impl Into<String>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let id = id.into();
        let session = Self {
            name: display_name(&id),
            id,
            color: color.into(),
            tx,
        };
        (session, rx)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    /// Queue a message without waiting.
    pub fn deliver(&self, message: &Outbound) -> Delivery {
        match self.tx.try_send(message.clone()) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => Delivery::Full,
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }

    /// Check if the connection is still draining the queue.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    /// This session as listed in PRESENCE.
    pub fn presence(&self) -> PresenceEntry {
        PresenceEntry {
            id: self.id.clone(),
            name: self.name.clone(),
            color: self.color.clone(),
        }
    }
}

fn display_name(id: &str) -> String {
    let short: String = id.chars().take(4).collect();
    format!("User-{}", short)
}

/// Display color derived from the id bytes.
fn color_for(id: &Uuid) -> String {
    let bytes = id.as_bytes();
    format!("#{:02x}{:02x}{:02x}", bytes[0], bytes[1], bytes[2])
}
