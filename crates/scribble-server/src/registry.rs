//! Process-wide map from room id to room.
//!
//! Rooms are created on first reference and kept for the life of the process,
//! including after their last session leaves.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use crate::room::{Room, RoomSummary, SharedRoom};

pub struct RoomRegistry {
    rooms: DashMap<String, SharedRoom>,
    default_room: String,
}

impl RoomRegistry {
    /// Create an empty registry; `default_room` is used when no id is given.
    pub fn new(default_room: impl Into<String>) -> Self {
        Self {
            rooms: DashMap::new(),
            default_room: default_room.into(),
        }
    }

    pub fn default_room(&self) -> &str {
        &self.default_room
    }

    /// Get or create a room
    pub fn get_or_create(&self, room_id: &str) -> SharedRoom {
        if let Some(room) = self.rooms.get(room_id) {
            return Arc::clone(room.value());
        }
        self.rooms
            .entry(room_id.to_string())
            .or_insert_with(|| {
                debug!("Creating room {}", room_id);
                Room::shared(room_id)
            })
            .value()
            .clone()
    }

    /// Get or create the requested room, or the default room when none is named.
    pub fn resolve(&self, requested: Option<&str>) -> SharedRoom {
        match requested.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => self.get_or_create(id),
            None => self.get_or_create(&self.default_room),
        }
    }

    /// Look up a room without creating it.
    pub fn get(&self, room_id: &str) -> Option<SharedRoom> {
        self.rooms.get(room_id).map(|room| Arc::clone(room.value()))
    }

    /// Ids of every room, sorted.
    pub fn room_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.rooms.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Summaries of every room, sorted by id.
    pub async fn summaries(&self) -> Vec<RoomSummary> {
        // Collect handles first so no map guard is held across an await
        let rooms: Vec<SharedRoom> = self
            .rooms
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut summaries = Vec::with_capacity(rooms.len());
        for room in rooms {
            summaries.push(room.lock().await.summary());
        }
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use scribble_core::{Point, Stroke};

    #[tokio::test]
    async fn test_get_or_create_returns_same_room() {
        let registry = RoomRegistry::new("default");

        let room1 = registry.get_or_create("alpha");
        let room2 = registry.get_or_create("alpha");

        assert!(Arc::ptr_eq(&room1, &room2));
        assert_eq!(registry.len(), 1);
        assert_eq!(room1.lock().await.id(), "alpha");
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_default() {
        let registry = RoomRegistry::new("lobby");

        let none = registry.resolve(None);
        let blank = registry.resolve(Some("  "));
        let named = registry.resolve(Some("studio"));

        assert!(Arc::ptr_eq(&none, &blank));
        assert_eq!(none.lock().await.id(), "lobby");
        assert_eq!(named.lock().await.id(), "studio");
        assert_eq!(registry.room_ids(), vec!["lobby".to_string(), "studio".to_string()]);
    }

    #[tokio::test]
    async fn test_get_does_not_create() {
        let registry = RoomRegistry::new("default");
        assert!(registry.get("ghost").is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_rooms_are_isolated() {
        let registry = RoomRegistry::new("default");
        let a = registry.get_or_create("a");
        let b = registry.get_or_create("b");

        let stroke = Stroke::new("s1", "#000", 1.0, vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        a.lock().await.apply_commit(stroke);
        let (session, _rx) = Session::with_identity("u1", "#000000", 4);
        b.lock().await.join(session);

        let summaries = registry.summaries().await;
        assert_eq!(summaries.len(), 2);
        assert_eq!((summaries[0].operations, summaries[0].sessions), (1, 0));
        assert_eq!((summaries[1].operations, summaries[1].sessions), (0, 1));
    }

    #[tokio::test]
    async fn test_empty_rooms_are_kept() {
        let registry = RoomRegistry::new("default");
        let room = registry.get_or_create("a");
        let (session, _rx) = Session::with_identity("u1", "#000000", 4);
        room.lock().await.join(session);
        room.lock().await.leave("u1");

        assert!(registry.get("a").is_some());
    }
}
