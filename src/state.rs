//! Shared application state for all routes.

use crate::config::AppConfig;
use crate::orm::SchemaRegistry;
use crate::service::SessionCodec;
use crate::sql::Database;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Built once at startup; read-only afterwards.
    pub schemas: Arc<SchemaRegistry>,
    pub config: Arc<AppConfig>,
    pub session: Arc<SessionCodec>,
}

impl AppState {
    pub fn new(db: Database, schemas: SchemaRegistry, config: AppConfig) -> Self {
        let session = SessionCodec::new(&config.session);
        AppState {
            db,
            schemas: Arc::new(schemas),
            config: Arc::new(config),
            session: Arc::new(session),
        }
    }
}
