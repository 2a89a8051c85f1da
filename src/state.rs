use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::Config;
use crate::storage::FileStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, shared with the auth middleware
    pub db: Arc<DatabaseConnection>,
    /// Application configuration
    pub config: Arc<Config>,
    /// Uploaded file store
    pub store: FileStore,
}

impl AppState {
    /// Create new application state
    pub fn new(db: Arc<DatabaseConnection>, config: Config) -> Self {
        let store = FileStore::new(&config.storage_dir);
        Self {
            db,
            config: Arc::new(config),
            store,
        }
    }
}
