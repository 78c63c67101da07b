//! Registry statistics and info structures

use serde::Serialize;
use std::collections::HashMap;

use crate::rooms::RoomId;

/// Registry statistics
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub total_connections: usize,
    pub active_rooms: usize,
    pub rooms: HashMap<RoomId, usize>,
}

/// Live view of one room
#[derive(Debug, Clone, Serialize)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub connection_count: usize,
    pub usernames: Vec<String>,
}
