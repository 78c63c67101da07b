//! Snapshot types shared with the rooms API.
//!
//! Field names follow the JSON the rooms API returns for ordinary reads, so a
//! client can render a pushed snapshot and a fetched one interchangeably.
//! Associations the API did not load arrive as `null` and are sent on as
//! `null`, which is why the list fields are `Option<Vec<_>>`.

use chrono::DateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type RoomId = u64;

/// Zero time as the rooms API writes it for unset timestamps
const ZERO_TIME: &str = "0001-01-01T00:00:00Z";

/// An RFC 3339 timestamp kept exactly as received.
///
/// The text is validated on input but never re-formatted, so offsets and
/// fractional seconds reach clients unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp(String);

impl Timestamp {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self(ZERO_TIME.to_string())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {raw:?}: {e}")))?;
        Ok(Self(raw))
    }
}

/// Bookkeeping columns every persisted entity carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    #[serde(rename = "ID")]
    pub id: u64,
    #[serde(rename = "CreatedAt", default)]
    pub created_at: Timestamp,
    #[serde(rename = "UpdatedAt", default)]
    pub updated_at: Timestamp,
    #[serde(rename = "DeletedAt", default)]
    pub deleted_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub model: Model,
    pub username: String,
    #[serde(default)]
    pub rooms: Option<Vec<Room>>,
    #[serde(default)]
    pub todos: Option<Vec<Todo>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Room {
    #[serde(flatten)]
    pub model: Model,
    pub name: String,
    #[serde(rename = "adminId", default)]
    pub admin_id: u64,
    #[serde(default)]
    pub admin: User,
    #[serde(default)]
    pub users: Option<Vec<User>>,
    #[serde(default)]
    pub todos: Option<Vec<Todo>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    #[serde(flatten)]
    pub model: Model,
    #[serde(rename = "roomId")]
    pub room_id: RoomId,
    #[serde(default)]
    pub room: Room,
    #[serde(rename = "userId")]
    pub user_id: u64,
    #[serde(default)]
    pub user: User,
    pub title: String,
    #[serde(rename = "isCompleted", default)]
    pub is_completed: bool,
    #[serde(default)]
    pub order: u32,
}

impl Room {
    pub fn id(&self) -> RoomId {
        self.model.id
    }

    /// Members listed in the snapshot; empty when the list was not loaded
    pub fn members(&self) -> &[User] {
        self.users.as_deref().unwrap_or_default()
    }

    /// Whether the snapshot carries the member list at all
    pub fn has_member_list(&self) -> bool {
        self.users.is_some()
    }

    /// Usernames of every current member
    pub fn member_names(&self) -> Vec<String> {
        self.members().iter().map(|u| u.username.clone()).collect()
    }
}
