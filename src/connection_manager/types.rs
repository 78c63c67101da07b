//! Connection handle and related types

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::rooms::RoomId;
use crate::websocket::OutboundMessage;

/// Handle for a single admitted WebSocket connection.
///
/// The room and identity are fixed at admission. The sender feeds the
/// connection's writer task; the dispatcher is the only outside party that
/// pushes into it.
#[derive(Debug)]
pub struct ConnectionHandle {
    pub id: Uuid,
    pub room_id: RoomId,
    pub username: String,
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<OutboundMessage>,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("outbound queue is full")]
    QueueFull,
    #[error("connection is closed")]
    Closed,
}

impl ConnectionHandle {
    pub fn new(room_id: RoomId, username: String, sender: mpsc::Sender<OutboundMessage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            username,
            connected_at: Utc::now(),
            sender,
        }
    }

    /// Queue a message without waiting. A full queue means the peer is not
    /// keeping up; the message is dropped for this connection only.
    pub fn try_send(&self, message: OutboundMessage) -> Result<(), DeliveryError> {
        self.sender.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::QueueFull,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
