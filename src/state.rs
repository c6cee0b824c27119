use std::sync::Arc;

use crate::auth::{AuthError, Authenticator};
use crate::config::AppConfig;
use crate::database::StudyStore;

/// Shared, read-only application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub authenticator: Arc<Authenticator>,
    pub store: Arc<dyn StudyStore>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn StudyStore>) -> Result<Self, AuthError> {
        let authenticator = Authenticator::from_config(&config.security)?;
        Ok(Self {
            config: Arc::new(config),
            authenticator: Arc::new(authenticator),
            store,
        })
    }
}
