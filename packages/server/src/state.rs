use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::identity::IdentityProvider;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub identities: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Client-side deadline applied to every store-bound workflow.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.store.request_timeout_secs)
    }
}
