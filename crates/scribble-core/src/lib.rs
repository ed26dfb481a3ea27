//! Scribble Core Library
//!
//! Platform-agnostic data structures for the Scribble shared canvas: committed
//! strokes, the tombstoning operation log that backs undo/redo, and the JSON
//! message protocol spoken between participants and the room server.

pub mod operation;
pub mod oplog;
pub mod protocol;

pub use operation::{MIN_STROKE_POINTS, Operation, OperationId, Point, Stroke};
pub use oplog::OperationLog;
pub use protocol::{
    ClientMessage, CursorPosition, PresenceEntry, ProtocolError, RemoteCursor, ServerMessage,
};
