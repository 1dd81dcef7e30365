use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::state::{AppState, Room, RoomHandle};

/// Maps room ids to their membership sets. Rooms exist from first join to
/// last leave; an emptied room is evicted together with its state.
#[derive(Default)]
pub struct RoomDirectory {
    rooms: HashMap<String, HashSet<Uuid>>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_member(&mut self, room_id: &str, user_id: Uuid) {
        self.rooms
            .entry(room_id.to_string())
            .or_default()
            .insert(user_id);
    }

    /// Removes a member; returns true if the room became empty and was
    /// evicted. Unknown rooms and non-members are no-ops.
    pub fn remove_member(&mut self, room_id: &str, user_id: Uuid) -> bool {
        let Some(members) = self.rooms.get_mut(room_id) else {
            return false;
        };
        members.remove(&user_id);
        if members.is_empty() {
            self.rooms.remove(room_id);
            true
        } else {
            false
        }
    }

    pub fn members(&self, room_id: &str) -> Vec<Uuid> {
        self.rooms
            .get(room_id)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }
}

pub fn new_room_id() -> String {
    Uuid::new_v4().to_string()
}

/// Room ids come straight off the URL path; anything outside a short
/// alphanumeric slug is rejected before it can key the room table.
pub fn normalize_room_id(value: &str) -> Option<String> {
    if value.is_empty() || value.len() > 64 {
        return None;
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return None;
    }
    Some(value.to_string())
}

pub async fn get_or_create_room(state: &AppState, room_id: &str) -> RoomHandle {
    if let Some(room) = state.rooms.read().await.get(room_id).cloned() {
        return room;
    }
    debug!(room_id, "creating room");
    let room = Arc::new(RwLock::new(Room::new()));
    let mut rooms = state.rooms.write().await;
    rooms
        .entry(room_id.to_string())
        .or_insert_with(|| room.clone())
        .clone()
}

/// Drops the room's state once its last connection is gone. The pointer
/// check guards against deleting a room that was recreated concurrently.
pub async fn evict_if_empty(state: &AppState, room_id: &str, room: &RoomHandle) {
    if !room.read().await.peers.is_empty() {
        return;
    }
    let mut rooms = state.rooms.write().await;
    if let Some(current) = rooms.get(room_id) {
        if Arc::ptr_eq(current, room) {
            rooms.remove(room_id);
            debug!(room_id, "evicted empty room");
        }
    }
}
