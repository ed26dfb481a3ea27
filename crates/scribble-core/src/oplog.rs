//! Append-only operation log with tombstone undo/redo.
//!
//! Operations are kept in commit order for the lifetime of the log. Undo and
//! redo never move or remove entries; they only flip the `active` flag, so the
//! active entries replayed in log order always reproduce the canvas. The only
//! way entries leave the log is [`OperationLog::clear`].
//!
//! Undo and redo act on the shared log, not on a per-participant history:
//! undo retracts the latest active stroke whoever drew it, and redo restores
//! the earliest tombstone in log order.

use crate::operation::{Operation, Stroke};

/// Ordered log of committed strokes.
#[derive(Debug, Clone, Default)]
pub struct OperationLog {
    ops: Vec<Operation>,
}

impl OperationLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stroke as a new active operation.
    ///
    /// Callers check [`Stroke::is_committable`] first.
    pub fn commit(&mut self, stroke: Stroke) {
        debug_assert!(
            stroke.is_committable(),
            "stroke {} has too few points to commit",
            stroke.id
        );
        self.ops.push(Operation::from(stroke));
    }

    /// Tombstone the most recently committed active operation.
    /// Returns true if an operation was tombstoned, false if nothing was active.
    pub fn undo(&mut self) -> bool {
        match self.ops.iter_mut().rev().find(|op| op.active) {
            Some(op) => {
                log::trace!("Tombstoned operation {}", op.id);
                op.active = false;
                true
            }
            None => false,
        }
    }

    /// Reactivate the earliest tombstone in log order.
    /// Returns true if an operation was restored, false if there were no tombstones.
    pub fn redo(&mut self) -> bool {
        match self.ops.iter_mut().find(|op| !op.active) {
            Some(op) => {
                log::trace!("Restored operation {}", op.id);
                op.active = true;
                true
            }
            None => false,
        }
    }

    /// Discard every operation, tombstones included. Not undoable.
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Active operations in log order: the render list.
    pub fn active_operations(&self) -> impl Iterator<Item = &Operation> {
        self.ops.iter().filter(|op| op.active)
    }

    /// Every operation in log order, tombstones included.
    pub fn all_operations(&self) -> &[Operation] {
        &self.ops
    }

    /// Number of operations, tombstones included.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of active operations.
    pub fn active_count(&self) -> usize {
        self.active_operations().count()
    }
}
