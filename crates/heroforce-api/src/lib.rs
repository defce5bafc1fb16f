//! HeroForce API - authentication and access-control server
//!
//! JWT-based session management over an in-memory user store: login,
//! token refresh with rotation, logout with revocation, and role-gated
//! routes.

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use heroforce_core::config::AppConfig;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| o.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // credentials (the refresh cookie) require explicit origins
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
    }
}

/// Assemble the full application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Fixture wiring for integration tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use super::*;
    use crate::auth::{hash_password, AuthService, JwtConfig, ManualClock, TokenCodec};
    use heroforce_core::{InMemoryUserStore, Role, User};

    pub const TEST_EPOCH: u64 = 1_700_000_000;

    pub const HERO_EMAIL: &str = "hero@heroforce.com";
    pub const HERO_PASSWORD: &str = "senha123";
    pub const ADMIN_EMAIL: &str = "admin@heroforce.com";
    pub const ADMIN_PASSWORD: &str = "admin123";

    /// State seeded with one hero and one admin, driven by a manual clock.
    pub fn seeded_state(jwt_config: JwtConfig) -> (Arc<AppState>, ManualClock) {
        let store = InMemoryUserStore::new();
        store.insert(User::new(
            1,
            HERO_EMAIL,
            hash_password(HERO_PASSWORD).unwrap(),
            "Super Hero",
            Role::Hero,
        ));
        store.insert(User::new(
            2,
            ADMIN_EMAIL,
            hash_password(ADMIN_PASSWORD).unwrap(),
            "Site Admin",
            Role::Admin,
        ));

        let clock = ManualClock::new(TEST_EPOCH);
        let codec = TokenCodec::with_clock(jwt_config, Arc::new(clock.clone()));
        let auth = AuthService::new(Arc::new(store), codec);
        let state = Arc::new(AppState::with_auth(AppConfig::default(), auth));

        (state, clock)
    }
}
