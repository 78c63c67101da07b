//! Registry of live connections grouped by room.

mod registry;
mod stats;
mod types;

pub use registry::ConnectionRegistry;
pub use stats::{RegistryStats, RoomInfo};
pub use types::{ConnectionHandle, DeliveryError};
