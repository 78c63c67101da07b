//! Room state snapshots and the membership collaborator.
//!
//! Storage of users, rooms and todos lives outside the hub. The hub only sees
//! full snapshots handed to it after a mutation commits, and asks the
//! [`MembershipDirectory`] whether a user may subscribe to a room.

mod directory;
mod model;

pub use directory::{DirectoryError, InMemoryDirectory, MembershipDirectory};
pub use model::{Model, Room, RoomId, Timestamp, Todo, User};
