use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;

use crate::server::middleware::api_key_auth;
use crate::server::AppState;

use super::{health, prometheus_metrics, publish_event, replace_members, room_info, stats};

/// Largest accepted trigger body. Room snapshots are small.
const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health, stats & metrics
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        // Endpoints for the rooms API
        .nest(
            "/api/v1",
            Router::new()
                .route("/rooms/{room_id}", get(room_info))
                .route("/rooms/{room_id}/events", post(publish_event))
                .route("/rooms/{room_id}/members", put(replace_members))
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                .route_layer(middleware::from_fn_with_state(state, api_key_auth)),
        )
}
