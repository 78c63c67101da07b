use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

use super::RoomId;

#[derive(Error, Debug, Clone)]
pub enum DirectoryError {
    #[error("Membership directory unavailable: {0}")]
    Unavailable(String),
}

/// Answers "may this user subscribe to this room".
///
/// Consulted once per connection attempt. Implementations backed by a remote
/// store should keep lookups short; admission is bounded by the websocket
/// handshake timeout.
#[async_trait]
pub trait MembershipDirectory: Send + Sync {
    async fn is_member(&self, room_id: RoomId, username: &str) -> Result<bool, DirectoryError>;

    /// Replace the full member list of a room
    async fn replace_members(
        &self,
        room_id: RoomId,
        members: Vec<String>,
    ) -> Result<(), DirectoryError>;

    /// Drop everything known about a room (it was deleted)
    async fn forget_room(&self, room_id: RoomId) -> Result<(), DirectoryError>;
}

/// Directory held in process memory, fed from room snapshots.
#[derive(Default)]
pub struct InMemoryDirectory {
    members: DashMap<RoomId, HashSet<String>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room_count(&self) -> usize {
        self.members.len()
    }
}

#[async_trait]
impl MembershipDirectory for InMemoryDirectory {
    async fn is_member(&self, room_id: RoomId, username: &str) -> Result<bool, DirectoryError> {
        Ok(self
            .members
            .get(&room_id)
            .map(|m| m.contains(username))
            .unwrap_or(false))
    }

    async fn replace_members(
        &self,
        room_id: RoomId,
        members: Vec<String>,
    ) -> Result<(), DirectoryError> {
        let members: HashSet<String> = members.into_iter().collect();
        tracing::debug!(room_id, member_count = members.len(), "Room membership replaced");
        self.members.insert(room_id, members);
        Ok(())
    }

    async fn forget_room(&self, room_id: RoomId) -> Result<(), DirectoryError> {
        if self.members.remove(&room_id).is_some() {
            tracing::debug!(room_id, "Room removed from membership directory");
        }
        Ok(())
    }
}
