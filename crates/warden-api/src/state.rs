//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use warden_auth::AuthSuite;
use warden_core::config::AppConfig;

/// Cloned into every handler. All fields are reference-counted.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
    /// Login, session and enrollment components.
    pub auth: AuthSuite,
}

impl AppState {
    /// Bundle configuration and the auth suite.
    pub fn new(config: AppConfig, auth: AuthSuite) -> Self {
        Self {
            config: Arc::new(config),
            auth,
        }
    }
}
