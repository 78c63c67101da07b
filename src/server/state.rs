use std::sync::Arc;
use std::time::Instant;

use crate::auth::JwtValidator;
use crate::broadcast::BroadcastDispatcher;
use crate::config::Settings;
use crate::connection_manager::ConnectionRegistry;
use crate::rooms::{InMemoryDirectory, MembershipDirectory};

/// Everything request and connection handlers share. Built once at startup;
/// there is no global hub.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub jwt_validator: Arc<JwtValidator>,
    pub registry: Arc<ConnectionRegistry>,
    pub dispatcher: Arc<BroadcastDispatcher>,
    pub directory: Arc<dyn MembershipDirectory>,
    pub start_time: Instant,
}

impl AppState {
    /// State backed by the in-process membership directory
    pub fn new(settings: Settings) -> Self {
        Self::with_directory(settings, Arc::new(InMemoryDirectory::new()))
    }

    pub fn with_directory(settings: Settings, directory: Arc<dyn MembershipDirectory>) -> Self {
        let jwt_validator = Arc::new(JwtValidator::new(&settings.jwt));
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = Arc::new(BroadcastDispatcher::new(registry.clone()));

        Self {
            settings: Arc::new(settings),
            jwt_validator,
            registry,
            dispatcher,
            directory,
            start_time: Instant::now(),
        }
    }
}
