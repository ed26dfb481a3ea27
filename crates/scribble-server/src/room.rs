//! A collaboration room: one operation log plus its connected sessions.
//!
//! A `Room` is plain data. Serialization of everything that touches it is
//! provided by the lock it lives behind (see [`SharedRoom`]): every mutation
//! and its fan-out happen while that lock is held.

use scribble_core::{OperationLog, Stroke};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::session::Session;

/// A room behind its serialization lock.
pub type SharedRoom = Arc<Mutex<Room>>;

/// Point-in-time counters for one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSummary {
    pub id: String,
    pub sessions: usize,
    pub operations: usize,
    pub active: usize,
}

#[derive(Debug)]
pub struct Room {
    id: String,
    log: OperationLog,
    /// Connected sessions in join order.
    sessions: Vec<Session>,
}

impl Room {
    /// Create an empty room.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            log: OperationLog::new(),
            sessions: Vec::new(),
        }
    }

    /// Wrap a room in its serialization lock.
    pub fn shared(id: impl Into<String>) -> SharedRoom {
        Arc::new(Mutex::new(Self::new(id)))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn log(&self) -> &OperationLog {
        &self.log
    }

    /// Add a session. Joining twice with the same id keeps the first.
    /// Returns true if the session was added.
    pub fn join(&mut self, session: Session) -> bool {
        if self.contains(session.id()) {
            return false;
        }
        self.sessions.push(session);
        true
    }

    /// Remove a session, returning it if it was present.
    pub fn leave(&mut self, session_id: &str) -> Option<Session> {
        let pos = self.sessions.iter().position(|s| s.id() == session_id)?;
        Some(self.sessions.remove(pos))
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.session(session_id).is_some()
    }

    pub fn session(&self, session_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id() == session_id)
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Commit a stroke if it has enough points.
    /// Returns true if the log changed; degenerate strokes are dropped.
    pub fn apply_commit(&mut self, stroke: Stroke) -> bool {
        if !stroke.is_committable() {
            return false;
        }
        self.log.commit(stroke);
        true
    }

    pub fn apply_undo(&mut self) -> bool {
        self.log.undo()
    }

    pub fn apply_redo(&mut self) -> bool {
        self.log.redo()
    }

    pub fn apply_clear(&mut self) {
        self.log.clear();
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id.clone(),
            sessions: self.sessions.len(),
            operations: self.log.len(),
            active: self.log.active_count(),
        }
    }
}
