//! Trigger endpoints used by the rooms API after a mutation commits.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::broadcast::{PublishReport, RoomEvent};
use crate::connection_manager::RoomInfo;
use crate::error::{AppError, Result};
use crate::rooms::RoomId;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ReplaceMembersRequest {
    pub members: Vec<String>,
}

/// POST /api/v1/rooms/{room_id}/events - Publish a committed room change
///
/// The body is the wire message itself: `{"type": ..., "payload": <room>}`.
#[tracing::instrument(
    name = "http.publish_event",
    skip(state, event),
    fields(event_type = event.event_type())
)]
pub async fn publish_event(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
    Json(event): Json<RoomEvent>,
) -> Result<Json<PublishReport>> {
    if event.room_id() != room_id {
        return Err(AppError::Validation(format!(
            "Payload describes room {} but was posted to room {}",
            event.room_id(),
            room_id
        )));
    }

    sync_directory(&state, room_id, &event).await;

    Ok(Json(state.dispatcher.publish(room_id, &event)))
}

/// Keep admission in step with the snapshot. A directory failure is logged
/// and does not hold back the broadcast.
async fn sync_directory(state: &AppState, room_id: RoomId, event: &RoomEvent) {
    let result = match event {
        RoomEvent::RoomDeleted(_) => state.directory.forget_room(room_id).await,
        _ if event.room().has_member_list() => {
            state
                .directory
                .replace_members(room_id, event.room().member_names())
                .await
        }
        _ if event.changes_membership() => {
            tracing::warn!(room_id, "Membership event without a member list, directory unchanged");
            Ok(())
        }
        _ => Ok(()),
    };

    if let Err(e) = result {
        tracing::warn!(room_id, error = %e, "Failed to update membership directory");
    }
}

/// PUT /api/v1/rooms/{room_id}/members - Replace the member list used for admission
#[tracing::instrument(
    name = "http.replace_members",
    skip(state, request),
    fields(member_count = request.members.len())
)]
pub async fn replace_members(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
    Json(request): Json<ReplaceMembersRequest>,
) -> Result<StatusCode> {
    if request.members.iter().any(|m| m.trim().is_empty()) {
        return Err(AppError::Validation("Member names must not be empty".to_string()));
    }

    state
        .directory
        .replace_members(room_id, request.members)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/rooms/{room_id} - Live connections for a room
pub async fn room_info(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
) -> Result<Json<RoomInfo>> {
    state
        .registry
        .room_info(room_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Room {} has no active connections", room_id)))
}
