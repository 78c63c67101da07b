//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use crate::connection_manager::DeliveryError;

use super::{
    CONNECTIONS_ACTIVE, EVENTS_PUBLISHED_TOTAL, MESSAGES_DELIVERED_TOTAL, MESSAGES_FAILED_TOTAL,
    PUBLISH_FANOUT, ROOMS_ACTIVE, SERIALIZATION_FAILURES_TOTAL, WS_ADMISSIONS_REJECTED,
    WS_CONNECTIONS_CLOSED, WS_CONNECTIONS_OPENED, WS_CONNECTION_DURATION,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

pub struct RegistryMetrics;

impl RegistryMetrics {
    pub fn set(connections: usize, rooms: usize) {
        CONNECTIONS_ACTIVE.set(connections as i64);
        ROOMS_ACTIVE.set(rooms as i64);
    }
}

pub struct AdmissionMetrics;

impl AdmissionMetrics {
    pub fn record_opened() {
        WS_CONNECTIONS_OPENED.inc();
    }

    pub fn record_closed(duration_secs: f64) {
        WS_CONNECTIONS_CLOSED.inc();
        WS_CONNECTION_DURATION.observe(duration_secs);
    }

    /// `reason` is one of: missing_token, invalid_token, not_member, timeout, directory_error
    pub fn record_rejected(reason: &str) {
        WS_ADMISSIONS_REJECTED.with_label_values(&[reason]).inc();
    }
}

pub struct BroadcastMetrics;

impl BroadcastMetrics {
    pub fn record_published(event_type: &str, recipients: usize) {
        EVENTS_PUBLISHED_TOTAL.with_label_values(&[event_type]).inc();
        PUBLISH_FANOUT.observe(recipients as f64);
    }

    pub fn record_delivered(count: u64) {
        MESSAGES_DELIVERED_TOTAL.inc_by(count);
    }

    pub fn record_failed(error: DeliveryError) {
        let reason = match error {
            DeliveryError::QueueFull => "queue_full",
            DeliveryError::Closed => "closed",
        };
        MESSAGES_FAILED_TOTAL.with_label_values(&[reason]).inc();
    }

    pub fn record_serialization_failure() {
        SERIALIZATION_FAILURES_TOTAL.inc();
    }
}
