use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID or username)
    pub sub: String,
    /// Display username; preferred over `sub` as the subscriber identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
    /// Additional custom claims
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Claims {
    /// Identity used for room membership checks. `None` when the token carries no usable name.
    pub fn identity(&self) -> Option<&str> {
        let name = self
            .username
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(&self.sub);
        if name.trim().is_empty() {
            None
        } else {
            Some(name)
        }
    }
}
