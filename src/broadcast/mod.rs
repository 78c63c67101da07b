//! Room event fan-out.
//!
//! Mutation handlers call [`BroadcastDispatcher::publish`] after their change
//! has committed. Each event carries the full snapshot of the affected room,
//! never a delta, so clients simply replace what they render.

mod dispatcher;
mod event;

pub use dispatcher::{BroadcastDispatcher, DispatcherStatsSnapshot, PublishReport};
pub use event::RoomEvent;
