use std::env;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub websocket: WebSocketConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed browser origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    /// Shared key for the trigger endpoints. `None` disables the check.
    pub key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketConfig {
    /// Upper bound in seconds for admitting a connection (token + membership check)
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout: u64,
    /// Capacity of each connection's outbound queue
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
    /// Keepalive ping interval in seconds
    #[serde(default = "default_ping_interval")]
    pub ping_interval: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_handshake_timeout() -> u64 {
    10
}

fn default_outbound_buffer() -> usize {
    32
}

fn default_ping_interval() -> u64 {
    30
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("websocket.handshake_timeout", default_handshake_timeout() as i64)?
            .set_default("websocket.outbound_buffer", default_outbound_buffer() as i64)?
            .set_default("websocket.ping_interval", default_ping_interval() as i64)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // SERVER__PORT, JWT__SECRET, WEBSOCKET__PING_INTERVAL, ...
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins"),
            );

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl WebSocketConfig {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval.max(1))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: default_handshake_timeout(),
            outbound_buffer: default_outbound_buffer(),
            ping_interval: default_ping_interval(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let server = ServerConfig::default();
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 8080);
        assert!(server.cors_origins.is_empty());

        let ws = WebSocketConfig::default();
        assert_eq!(ws.handshake_timeout(), Duration::from_secs(10));
        assert_eq!(ws.outbound_buffer, 32);
        assert_eq!(ws.ping_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_zero_ping_interval_is_clamped() {
        let ws = WebSocketConfig {
            ping_interval: 0,
            ..Default::default()
        };
        assert_eq!(ws.ping_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_deserialize_partial_settings() {
        let settings: Settings = Config::builder()
            .set_override("jwt.secret", "s3cret")
            .unwrap()
            .set_override("logging.format", "json")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.jwt.secret, "s3cret");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.logging.format, LogFormat::Json);
        assert!(settings.api.key.is_none());
        assert_eq!(settings.server_addr(), "0.0.0.0:8080");
    }
}
