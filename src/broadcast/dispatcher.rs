use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::connection_manager::ConnectionRegistry;
use crate::metrics::BroadcastMetrics;
use crate::rooms::RoomId;
use crate::websocket::OutboundMessage;

use super::RoomEvent;

/// Outcome of one publish, for logging and the trigger API. Never an error.
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub room_id: RoomId,
    pub event_type: String,
    /// Connections in the room snapshot
    pub recipients: usize,
    /// Connections the message was queued to
    pub delivered: usize,
    /// Connections whose queue was full or closed
    pub failed: usize,
    /// False when the event could not be encoded and nothing was sent
    pub encoded: bool,
}

impl PublishReport {
    fn new(room_id: RoomId, event_type: &str) -> Self {
        Self {
            room_id,
            event_type: event_type.to_string(),
            recipients: 0,
            delivered: 0,
            failed: 0,
            encoded: true,
        }
    }
}

/// Statistics for the dispatcher
#[derive(Debug, Default)]
struct DispatcherStats {
    total_published: AtomicU64,
    total_delivered: AtomicU64,
    total_failed: AtomicU64,
    /// Publishes to rooms nobody was connected to
    empty_rooms: AtomicU64,
    serialization_failures: AtomicU64,
}

impl DispatcherStats {
    fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            total_published: self.total_published.load(Ordering::Relaxed),
            total_delivered: self.total_delivered.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
            empty_rooms: self.empty_rooms.load(Ordering::Relaxed),
            serialization_failures: self.serialization_failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatcher statistics
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStatsSnapshot {
    pub total_published: u64,
    pub total_delivered: u64,
    pub total_failed: u64,
    pub empty_rooms: u64,
    pub serialization_failures: u64,
}

/// Fans room events out to the connections registered for the room.
pub struct BroadcastDispatcher {
    registry: Arc<ConnectionRegistry>,
    stats: DispatcherStats,
}

impl BroadcastDispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            stats: DispatcherStats::default(),
        }
    }

    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    /// Deliver `event` to every connection currently subscribed to `room_id`.
    ///
    /// Call only after the mutation behind the event has committed. The event
    /// is encoded once and every recipient gets the same bytes. Delivery is
    /// best-effort: a failing connection is logged and skipped, stays
    /// registered (its own read loop removes it), and never fails the caller.
    #[tracing::instrument(
        name = "broadcast.publish",
        skip(self, event),
        fields(event_type = event.event_type())
    )]
    pub fn publish(&self, room_id: RoomId, event: &RoomEvent) -> PublishReport {
        self.fan_out(room_id, event.event_type(), event)
    }

    fn fan_out<T: Serialize + ?Sized>(
        &self,
        room_id: RoomId,
        event_type: &str,
        message: &T,
    ) -> PublishReport {
        let mut report = PublishReport::new(room_id, event_type);
        self.stats.total_published.fetch_add(1, Ordering::Relaxed);

        let outbound = match serde_json::to_string(message) {
            Ok(text) => OutboundMessage::text(text),
            Err(e) => {
                self.stats.serialization_failures.fetch_add(1, Ordering::Relaxed);
                BroadcastMetrics::record_serialization_failure();
                tracing::error!(room_id, event_type, error = %e, "Failed to encode room event, nothing sent");
                report.encoded = false;
                return report;
            }
        };

        let connections = self.registry.snapshot_for(room_id);
        report.recipients = connections.len();
        BroadcastMetrics::record_published(event_type, connections.len());

        if connections.is_empty() {
            self.stats.empty_rooms.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(room_id, event_type, "No connections in room");
            return report;
        }

        for conn in &connections {
            match conn.try_send(outbound.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    BroadcastMetrics::record_failed(e);
                    tracing::warn!(
                        room_id,
                        connection_id = %conn.id,
                        username = %conn.username,
                        error = %e,
                        "Failed to deliver room event"
                    );
                }
            }
        }

        self.stats
            .total_delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.stats
            .total_failed
            .fetch_add(report.failed as u64, Ordering::Relaxed);
        BroadcastMetrics::record_delivered(report.delivered as u64);

        tracing::debug!(
            room_id,
            event_type,
            delivered = report.delivered,
            failed = report.failed,
            "Published room event"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use tokio::sync::mpsc;

    use crate::connection_manager::ConnectionHandle;
    use crate::rooms::{Model, Room};

    fn room(id: RoomId) -> Room {
        Room {
            model: Model {
                id,
                ..Default::default()
            },
            name: format!("room-{id}"),
            ..Default::default()
        }
    }

    fn connect(
        registry: &ConnectionRegistry,
        room_id: RoomId,
        capacity: usize,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        let handle = Arc::new(ConnectionHandle::new(room_id, "user".to_string(), tx));
        registry.register(handle.clone());
        (handle, rx)
    }

    #[test]
    fn test_publish_to_empty_room() {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = BroadcastDispatcher::new(registry);

        let report = dispatcher.publish(5, &RoomEvent::TodosUpdated(room(5)));
        assert!(report.encoded);
        assert_eq!(report.recipients, 0);
        assert_eq!(report.delivered, 0);
        assert_eq!(dispatcher.stats().empty_rooms, 1);
    }

    #[tokio::test]
    async fn test_full_queue_only_affects_that_connection() {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = BroadcastDispatcher::new(registry.clone());
        let (_slow, _slow_rx) = connect(&registry, 1, 1);
        let (_fast, mut fast_rx) = connect(&registry, 1, 8);

        let first = dispatcher.publish(1, &RoomEvent::UserJoined(room(1)));
        let second = dispatcher.publish(1, &RoomEvent::UserLeft(room(1)));

        assert_eq!((first.delivered, first.failed), (2, 0));
        assert_eq!((second.delivered, second.failed), (1, 1));
        // Still registered; removal belongs to the read loop
        assert_eq!(registry.room_size(1), 2);

        assert!(fast_rx.recv().await.unwrap().as_str().contains("user_joined"));
        assert!(fast_rx.recv().await.unwrap().as_str().contains("user_left"));
    }

    #[test]
    fn test_serialization_failure_sends_nothing() {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = BroadcastDispatcher::new(registry.clone());
        let (_conn, mut rx) = connect(&registry, 1, 8);

        // Non-string map keys cannot be encoded as JSON
        let mut bad: HashMap<(u8, u8), u8> = HashMap::new();
        bad.insert((1, 2), 3);

        let report = dispatcher.fan_out(1, "todos_updated", &bad);
        assert!(!report.encoded);
        assert_eq!(report.delivered, 0);
        assert!(rx.try_recv().is_err());
        assert_eq!(dispatcher.stats().serialization_failures, 1);
    }

    #[test]
    fn test_stats_accumulate() {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = BroadcastDispatcher::new(registry.clone());
        let (_a, _ra) = connect(&registry, 3, 8);
        let (_b, rb) = connect(&registry, 3, 8);
        drop(rb);

        dispatcher.publish(3, &RoomEvent::RoomDeleted(room(3)));
        let stats = dispatcher.stats();
        assert_eq!(stats.total_published, 1);
        assert_eq!(stats.total_delivered, 1);
        assert_eq!(stats.total_failed, 1);
    }
}
