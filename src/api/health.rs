//! Health check and statistics endpoints.

use std::collections::HashMap;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::broadcast::DispatcherStatsSnapshot;
use crate::rooms::RoomId;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub connections: usize,
    pub rooms: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub connections: ConnectionStats,
    pub broadcasts: DispatcherStatsSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ConnectionStats {
    pub total_connections: usize,
    pub active_rooms: usize,
    pub rooms: HashMap<RoomId, usize>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let registry_stats = state.registry.stats();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        connections: registry_stats.total_connections,
        rooms: registry_stats.active_rooms,
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let registry_stats = state.registry.stats();

    Json(StatsResponse {
        connections: ConnectionStats {
            total_connections: registry_stats.total_connections,
            active_rooms: registry_stats.active_rooms,
            rooms: registry_stats.rooms,
        },
        broadcasts: state.dispatcher.stats(),
    })
}
