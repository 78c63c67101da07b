//! Prometheus metrics for the room hub.
//!
//! - Registry gauges (active connections and rooms), refreshed at scrape time
//! - Connection lifecycle (admissions, rejections, durations)
//! - Broadcast fan-out (events, deliveries, failures)

mod helpers;

pub use helpers::{encode_metrics, AdmissionMetrics, BroadcastMetrics, RegistryMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "room_hub";

lazy_static! {
    // ============================================================================
    // Registry Metrics
    // ============================================================================

    /// Connections currently registered across all rooms
    pub static ref CONNECTIONS_ACTIVE: IntGauge = register_int_gauge!(
        format!("{}_connections_active", METRIC_PREFIX),
        "Number of registered WebSocket connections"
    ).unwrap();

    /// Rooms with at least one registered connection
    pub static ref ROOMS_ACTIVE: IntGauge = register_int_gauge!(
        format!("{}_rooms_active", METRIC_PREFIX),
        "Number of rooms with at least one connection"
    ).unwrap();

    // ============================================================================
    // Connection Lifecycle Metrics
    // ============================================================================

    pub static ref WS_CONNECTIONS_OPENED: IntCounter = register_int_counter!(
        format!("{}_ws_connections_opened_total", METRIC_PREFIX),
        "Total WebSocket connections admitted"
    ).unwrap();

    pub static ref WS_CONNECTIONS_CLOSED: IntCounter = register_int_counter!(
        format!("{}_ws_connections_closed_total", METRIC_PREFIX),
        "Total WebSocket connections closed"
    ).unwrap();

    /// Refused connection attempts by reason
    pub static ref WS_ADMISSIONS_REJECTED: IntCounterVec = register_int_counter_vec!(
        format!("{}_ws_admissions_rejected_total", METRIC_PREFIX),
        "Connection attempts refused before registration",
        &["reason"]
    ).unwrap();

    pub static ref WS_CONNECTION_DURATION: Histogram = register_histogram!(
        format!("{}_ws_connection_duration_seconds", METRIC_PREFIX),
        "Lifetime of admitted WebSocket connections",
        vec![1.0, 10.0, 60.0, 300.0, 900.0, 3600.0, 14400.0]
    ).unwrap();

    // ============================================================================
    // Broadcast Metrics
    // ============================================================================

    /// Events published by event type
    pub static ref EVENTS_PUBLISHED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_events_published_total", METRIC_PREFIX),
        "Total room events published",
        &["event_type"]
    ).unwrap();

    pub static ref MESSAGES_DELIVERED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_messages_delivered_total", METRIC_PREFIX),
        "Total messages queued to connections"
    ).unwrap();

    /// Per-connection write failures by reason
    pub static ref MESSAGES_FAILED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_messages_failed_total", METRIC_PREFIX),
        "Total per-connection delivery failures",
        &["reason"]
    ).unwrap();

    pub static ref SERIALIZATION_FAILURES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_serialization_failures_total", METRIC_PREFIX),
        "Publishes aborted because the event could not be encoded"
    ).unwrap();

    /// Recipients per publish
    pub static ref PUBLISH_FANOUT: Histogram = register_histogram!(
        format!("{}_publish_fanout", METRIC_PREFIX),
        "Number of connections targeted by one publish",
        vec![0.0, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0]
    ).unwrap();
}
