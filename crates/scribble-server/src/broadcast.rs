//! Fan-out of server messages to the sessions of a room.
//!
//! Every function here runs with the room lock held and never waits on a
//! socket: messages are serialized once and pushed onto each recipient's
//! bounded queue with `try_send`. Since a room's fan-outs are serialized by
//! its lock and each queue is FIFO, every session sees a room's messages in
//! the order they were submitted.
//!
//! A full queue is handled by delivery class. Transient messages (DRAW,
//! CURSOR) are dropped for that recipient. Durable messages (SYNC_STATE,
//! PRESENCE) cannot be skipped without leaving the recipient inconsistent, so
//! the recipient is evicted; dropping its session closes the connection and
//! the client resyncs from scratch when it reconnects.

use scribble_core::{PresenceEntry, ServerMessage};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::room::Room;
use crate::session::{Delivery, Outbound, SessionId};

/// What happened to one fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// Sessions the message was queued for.
    pub delivered: usize,
    /// Sessions skipped because their connection is already closed.
    pub closed: usize,
    /// Transient deliveries dropped on a full queue.
    pub dropped: usize,
    /// Sessions whose queue was full for a durable message.
    pub lagged: Vec<SessionId>,
}

fn encode(message: &ServerMessage) -> Option<Outbound> {
    match message.to_json() {
        Ok(json) => Some(Arc::from(json)),
        Err(e) => {
            error!("Failed to encode {} message: {}", message.kind(), e);
            None
        }
    }
}

/// Queue `message` for every session in `room` except `exclude`.
///
/// Pure delivery: lagging sessions are reported, not evicted.
pub fn fan_out(room: &Room, message: &ServerMessage, exclude: Option<&str>) -> FanOutReport {
    let mut report = FanOutReport::default();
    let Some(text) = encode(message) else {
        return report;
    };

    for session in room.sessions() {
        if exclude == Some(session.id()) {
            continue;
        }
        match session.deliver(&text) {
            Delivery::Queued => report.delivered += 1,
            Delivery::Closed => report.closed += 1,
            Delivery::Full if message.is_transient() => {
                debug!("Dropping {} for slow session {}", message.kind(), session.id());
                report.dropped += 1;
            }
            Delivery::Full => report.lagged.push(session.id().to_string()),
        }
    }
    report
}

/// Fan out `message`, then evict any session that could not take it.
pub fn broadcast(room: &mut Room, message: &ServerMessage, exclude: Option<&str>) -> FanOutReport {
    let report = fan_out(room, message, exclude);
    if !report.lagged.is_empty() {
        evict(room, report.lagged.clone());
    }
    report
}

/// Queue `message` for a single session.
pub fn send_to(room: &mut Room, session_id: &str, message: &ServerMessage) -> Delivery {
    let Some(session) = room.session(session_id) else {
        return Delivery::Closed;
    };
    let Some(text) = encode(message) else {
        return Delivery::Closed;
    };
    let delivery = session.deliver(&text);
    if delivery == Delivery::Full && !message.is_transient() {
        evict(room, vec![session_id.to_string()]);
    }
    delivery
}

/// Membership list of `room` in join order.
pub fn presence_snapshot(room: &Room) -> Vec<PresenceEntry> {
    room.sessions().iter().map(|s| s.presence()).collect()
}

/// Send the current membership list to every session in `room`.
pub fn broadcast_presence(room: &mut Room) -> FanOutReport {
    let presence = ServerMessage::Presence(presence_snapshot(room));
    broadcast(room, &presence, None)
}

/// Remove lagging sessions and tell the rest who is left.
///
/// The new PRESENCE can itself find full queues, so repeat until it reaches
/// everyone. Each round removes at least one session.
fn evict(room: &mut Room, mut lagged: Vec<SessionId>) {
    while !lagged.is_empty() {
        for session_id in &lagged {
            if let Some(session) = room.leave(session_id) {
                warn!(
                    "Evicting {} from room {}: outbound queue full",
                    session.name(),
                    room.id()
                );
            }
        }
        let presence = ServerMessage::Presence(presence_snapshot(room));
        lagged = fan_out(room, &presence, None).lagged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::test_support::drain;
    use scribble_core::RemoteCursor;
    use serde_json::json;
    use tokio::sync::mpsc::error::TryRecvError;

    fn draw() -> ServerMessage {
        ServerMessage::Draw(json!({
            "start": {"x": 0, "y": 0},
            "end": {"x": 1, "y": 1},
            "color": "#000000",
            "width": 1,
        }))
    }

    #[test]
    fn test_fan_out_reaches_everyone() {
        let mut room = Room::new("r");
        let (a, mut rx_a) = Session::with_identity("a", "#000000", 8);
        let (b, mut rx_b) = Session::with_identity("b", "#000000", 8);
        room.join(a);
        room.join(b);

        let report = fan_out(&room, &ServerMessage::SyncState(Vec::new()), None);

        assert_eq!(report.delivered, 2);
        assert_eq!(drain(&mut rx_a), vec![ServerMessage::SyncState(Vec::new())]);
        assert_eq!(drain(&mut rx_b), vec![ServerMessage::SyncState(Vec::new())]);
    }

    #[test]
    fn test_fan_out_excludes_sender() {
        let mut room = Room::new("r");
        let (a, mut rx_a) = Session::with_identity("a", "#000000", 8);
        let (b, mut rx_b) = Session::with_identity("b", "#000000", 8);
        room.join(a);
        room.join(b);

        let report = fan_out(&room, &draw(), Some("a"));

        assert_eq!(report.delivered, 1);
        assert!(drain(&mut rx_a).is_empty());
        assert_eq!(drain(&mut rx_b), vec![draw()]);
    }

    #[test]
    fn test_closed_session_is_skipped() {
        let mut room = Room::new("r");
        let (a, rx_a) = Session::with_identity("a", "#000000", 8);
        let (b, mut rx_b) = Session::with_identity("b", "#000000", 8);
        room.join(a);
        room.join(b);
        drop(rx_a);

        let report = broadcast(&mut room, &ServerMessage::SyncState(Vec::new()), None);

        assert_eq!(report.closed, 1);
        assert_eq!(report.delivered, 1);
        // Closed sessions are pruned by their own connection, not here
        assert_eq!(room.session_count(), 2);
        assert_eq!(drain(&mut rx_b).len(), 1);
    }

    #[test]
    fn test_transient_dropped_when_full() {
        let mut room = Room::new("r");
        let (slow, mut rx_slow) = Session::with_identity("slow", "#000000", 1);
        let (fast, mut rx_fast) = Session::with_identity("fast", "#000000", 8);
        room.join(slow);
        room.join(fast);

        broadcast(&mut room, &draw(), None);
        let report = broadcast(&mut room, &draw(), None);

        assert_eq!(report.dropped, 1);
        assert!(report.lagged.is_empty());
        assert_eq!(room.session_count(), 2);
        assert_eq!(drain(&mut rx_slow).len(), 1);
        assert_eq!(drain(&mut rx_fast).len(), 2);
    }

    #[test]
    fn test_durable_evicts_lagging_session() {
        let mut room = Room::new("r");
        let (slow, mut rx_slow) = Session::with_identity("slow", "#000000", 1);
        let (fast, mut rx_fast) = Session::with_identity("fast", "#00ff00", 8);
        room.join(slow);
        room.join(fast);

        broadcast(&mut room, &draw(), None);
        let report = broadcast(&mut room, &ServerMessage::SyncState(Vec::new()), None);

        assert_eq!(report.lagged, vec!["slow".to_string()]);
        assert!(!room.contains("slow"));

        // The slow session keeps what was queued, then its queue is closed
        assert_eq!(drain(&mut rx_slow), vec![draw()]);
        assert!(matches!(rx_slow.try_recv(), Err(TryRecvError::Disconnected)));

        let presence = ServerMessage::Presence(vec![PresenceEntry {
            id: "fast".to_string(),
            name: "User-fast".to_string(),
            color: "#00ff00".to_string(),
        }]);
        assert_eq!(
            drain(&mut rx_fast),
            vec![draw(), ServerMessage::SyncState(Vec::new()), presence]
        );
    }

    #[test]
    fn test_messages_arrive_in_submission_order() {
        let mut room = Room::new("r");
        let (a, mut rx_a) = Session::with_identity("a", "#000000", 16);
        let (b, mut rx_b) = Session::with_identity("b", "#000000", 16);
        room.join(a);
        room.join(b);

        let cursor = ServerMessage::Cursor(RemoteCursor {
            user_id: "a".to_string(),
            x: 3.0,
            y: 4.0,
            color: "#000000".to_string(),
        });
        let sequence = vec![
            ServerMessage::SyncState(Vec::new()),
            cursor.clone(),
            ServerMessage::Presence(Vec::new()),
            ServerMessage::SyncState(Vec::new()),
        ];
        for message in &sequence {
            broadcast(&mut room, message, None);
        }

        assert_eq!(drain(&mut rx_a), sequence);
        assert_eq!(drain(&mut rx_b), sequence);
    }

    #[test]
    fn test_send_to_single_session() {
        let mut room = Room::new("r");
        let (a, mut rx_a) = Session::with_identity("a", "#000000", 8);
        let (b, mut rx_b) = Session::with_identity("b", "#000000", 8);
        room.join(a);
        room.join(b);

        assert_eq!(
            send_to(&mut room, "b", &ServerMessage::SyncState(Vec::new())),
            Delivery::Queued
        );
        assert_eq!(
            send_to(&mut room, "nobody", &ServerMessage::SyncState(Vec::new())),
            Delivery::Closed
        );

        assert!(drain(&mut rx_a).is_empty());
        assert_eq!(drain(&mut rx_b).len(), 1);
    }

    #[test]
    fn test_presence_snapshot_in_join_order() {
        let mut room = Room::new("r");
        let (a, _rx_a) = Session::with_identity("a1", "#111111", 8);
        let (b, _rx_b) = Session::with_identity("b2", "#222222", 8);
        room.join(a);
        room.join(b);

        let ids: Vec<String> = presence_snapshot(&room).into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["a1".to_string(), "b2".to_string()]);
    }
}
