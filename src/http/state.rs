use crate::config::Config;
use crate::nats::NatsClient;
use crate::pipeline::TranslationSession;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Live translation sessions (session_id → session)
    pub sessions: Arc<RwLock<HashMap<String, Arc<TranslationSession>>>>,

    /// Service configuration
    pub config: Arc<Config>,

    /// NATS connection; without one, sessions synthesize silence and log
    /// their output
    pub nats: Option<Arc<NatsClient>>,
}

impl AppState {
    pub fn new(config: Config, nats: Option<NatsClient>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config: Arc::new(config),
            nats: nats.map(Arc::new),
        }
    }
}
