//! Application state management

use crate::auth::{AuthService, TokenCodec};
use heroforce_core::config::AppConfig;
use heroforce_core::UserStore;
use std::sync::Arc;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Session service (credentials, tokens, revocation)
    pub auth: AuthService,
}

impl AppState {
    /// Create new application state from a user store and token codec.
    pub fn new(config: AppConfig, users: Arc<dyn UserStore>, codec: TokenCodec) -> Self {
        Self {
            config,
            auth: AuthService::new(users, codec),
        }
    }

    /// Wrap a pre-built session service. Used by tests that need a
    /// codec with a manual clock.
    pub fn with_auth(config: AppConfig, auth: AuthService) -> Self {
        Self { config, auth }
    }
}
