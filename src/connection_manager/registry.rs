use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::rooms::RoomId;

use super::{ConnectionHandle, RegistryStats, RoomInfo};

/// Live connections grouped by room.
///
/// Each room's set sits behind its DashMap shard lock. Every operation holds
/// that lock only for the insert, remove or copy it performs and never across
/// I/O, so broadcasts iterate over a private snapshot.
pub struct ConnectionRegistry {
    /// room_id -> (connection_id -> handle)
    rooms: DashMap<RoomId, HashMap<Uuid, Arc<ConnectionHandle>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Add a connection to the set of its room, creating the set if absent.
    ///
    /// Returns `false` when this exact connection is already registered.
    pub fn register(&self, handle: Arc<ConnectionHandle>) -> bool {
        let room_id = handle.room_id;
        let connection_id = handle.id;

        let (inserted, room_size) = {
            let mut room = self.rooms.entry(room_id).or_default();
            let inserted = match room.entry(connection_id) {
                Entry::Occupied(_) => false,
                Entry::Vacant(slot) => {
                    slot.insert(handle.clone());
                    true
                }
            };
            (inserted, room.len())
        };

        if inserted {
            tracing::info!(
                connection_id = %connection_id,
                room_id,
                username = %handle.username,
                room_size,
                "Connection registered"
            );
        } else {
            tracing::debug!(connection_id = %connection_id, room_id, "Connection already registered");
        }

        inserted
    }

    /// Remove a connection from a room. Removing an absent connection is a no-op.
    ///
    /// The room entry is deleted once its last member leaves.
    pub fn unregister(&self, room_id: RoomId, connection_id: Uuid) -> bool {
        let removed = self
            .rooms
            .get_mut(&room_id)
            .map(|mut room| room.remove(&connection_id).is_some())
            .unwrap_or(false);

        if !removed {
            return false;
        }

        // Re-checked under the shard lock so a concurrent register keeps the entry
        let room_closed = self
            .rooms
            .remove_if(&room_id, |_, room| room.is_empty())
            .is_some();

        tracing::info!(
            connection_id = %connection_id,
            room_id,
            room_closed,
            "Connection unregistered"
        );

        true
    }

    /// Copy of the room's current members, safe to iterate while the registry changes.
    pub fn snapshot_for(&self, room_id: RoomId) -> Vec<Arc<ConnectionHandle>> {
        self.rooms
            .get(&room_id)
            .map(|room| room.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains_room(&self, room_id: RoomId) -> bool {
        self.rooms.contains_key(&room_id)
    }

    pub fn room_size(&self, room_id: RoomId) -> usize {
        self.rooms.get(&room_id).map(|room| room.len()).unwrap_or(0)
    }

    /// Rooms whose set currently holds the given connection
    pub fn rooms_of(&self, connection_id: Uuid) -> Vec<RoomId> {
        self.rooms
            .iter()
            .filter(|entry| entry.value().contains_key(&connection_id))
            .map(|entry| *entry.key())
            .collect()
    }

    pub fn room_info(&self, room_id: RoomId) -> Option<RoomInfo> {
        let room = self.rooms.get(&room_id)?;
        let mut usernames: Vec<String> = room.values().map(|h| h.username.clone()).collect();
        usernames.sort();
        usernames.dedup();

        Some(RoomInfo {
            room_id,
            connection_count: room.len(),
            usernames,
        })
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn total_connections(&self) -> usize {
        self.rooms.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn stats(&self) -> RegistryStats {
        let rooms: HashMap<RoomId, usize> = self
            .rooms
            .iter()
            .map(|entry| (*entry.key(), entry.value().len()))
            .collect();

        RegistryStats {
            total_connections: rooms.values().sum(),
            active_rooms: rooms.len(),
            rooms,
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
