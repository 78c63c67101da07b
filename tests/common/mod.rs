#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{encode, EncodingKey, Header};
use tokio::sync::mpsc;

use room_sync_hub::auth::Claims;
use room_sync_hub::config::{
    ApiConfig, JwtConfig, LoggingConfig, ServerConfig, Settings, WebSocketConfig,
};
use room_sync_hub::connection_manager::ConnectionHandle;
use room_sync_hub::rooms::{Model, Room, RoomId, Todo, User};
use room_sync_hub::websocket::OutboundMessage;

pub const SECRET: &str = "integration-test-secret";
pub const API_KEY: &str = "trigger-key";

pub fn test_settings(api_key: Option<&str>) -> Settings {
    Settings {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec![],
        },
        jwt: JwtConfig {
            secret: SECRET.to_string(),
            issuer: None,
            audience: None,
        },
        api: ApiConfig {
            key: api_key.map(str::to_string),
        },
        websocket: WebSocketConfig::default(),
        logging: LoggingConfig::default(),
    }
}

pub fn token_for(username: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: username.to_string(),
        username: Some(username.to_string()),
        exp: now + 3600,
        iat: now,
        extra: Default::default(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn user(id: u64, username: &str) -> User {
    User {
        model: Model {
            id,
            ..Default::default()
        },
        username: username.to_string(),
        ..Default::default()
    }
}

pub fn todo(id: u64, room_id: RoomId, user_id: u64, title: &str, order: u32) -> Todo {
    Todo {
        model: Model {
            id,
            ..Default::default()
        },
        room_id,
        user_id,
        title: title.to_string(),
        order,
        ..Default::default()
    }
}

pub fn room(id: RoomId, name: &str, members: &[&str]) -> Room {
    Room {
        model: Model {
            id,
            ..Default::default()
        },
        name: name.to_string(),
        admin_id: 1,
        users: Some(
            members
                .iter()
                .enumerate()
                .map(|(i, name)| user(i as u64 + 1, name))
                .collect(),
        ),
        ..Default::default()
    }
}

/// A registered-looking connection whose outbound queue the test reads directly
pub fn subscriber(
    room_id: RoomId,
    username: &str,
) -> (Arc<ConnectionHandle>, mpsc::Receiver<OutboundMessage>) {
    let (tx, rx) = mpsc::channel(64);
    (
        Arc::new(ConnectionHandle::new(room_id, username.to_string(), tx)),
        rx,
    )
}

/// Poll `condition` until it holds, failing the test after five seconds
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
