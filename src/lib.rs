// Shared infrastructure
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Hub core
pub mod broadcast;
pub mod connection_manager;
pub mod rooms;

// Application layer
pub mod api;
pub mod server;
pub mod websocket;
