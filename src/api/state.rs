use std::sync::Arc;

use tokio_rusqlite::Connection;

use crate::chat::SessionStore;
use crate::core::AppConfig;

pub struct AppState {
    pub db: Connection,
    pub sessions: Arc<SessionStore>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(db: Connection, config: AppConfig) -> Self {
        let sessions = Arc::new(SessionStore::new(config.max_sessions));
        Self {
            db,
            sessions,
            config,
        }
    }
}
