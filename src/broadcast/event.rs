use serde::{Deserialize, Serialize};

use crate::rooms::{Room, RoomId};

/// A state change of one room, as sent on the wire:
/// `{"type": "<event_type>", "payload": <room snapshot>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum RoomEvent {
    /// A user was added to the room
    UserJoined(Room),
    /// A user left or was removed
    UserLeft(Room),
    /// Todos were created, removed, updated or reordered
    TodosUpdated(Room),
    RoomNameUpdated(Room),
    RoomDeleted(Room),
}

impl RoomEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            RoomEvent::UserJoined(_) => "user_joined",
            RoomEvent::UserLeft(_) => "user_left",
            RoomEvent::TodosUpdated(_) => "todos_updated",
            RoomEvent::RoomNameUpdated(_) => "room_name_updated",
            RoomEvent::RoomDeleted(_) => "room_deleted",
        }
    }

    pub fn room(&self) -> &Room {
        match self {
            RoomEvent::UserJoined(room)
            | RoomEvent::UserLeft(room)
            | RoomEvent::TodosUpdated(room)
            | RoomEvent::RoomNameUpdated(room)
            | RoomEvent::RoomDeleted(room) => room,
        }
    }

    pub fn room_id(&self) -> RoomId {
        self.room().id()
    }

    /// Whether the snapshot reflects a change in who belongs to the room
    pub fn changes_membership(&self) -> bool {
        matches!(self, RoomEvent::UserJoined(_) | RoomEvent::UserLeft(_))
    }
}
