//! API route definitions

use crate::auth::middleware::{auth_middleware, require_any_role};
use crate::handlers::{auth, users};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use heroforce_core::Role;
use std::sync::Arc;

/// Create API v1 routes
///
/// Logout and verify stay public: logout succeeds regardless of token
/// state, and verify exists precisely to probe tokens the gate would
/// reject.
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let public_routes = Router::new()
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/refresh", post(auth::refresh_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/verify", get(auth::verify_handler));

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // route_layer runs outermost-last: authentication first, then the
    // role check sees the attached principal
    let admin_routes = Router::new()
        .route("/users/:id", get(users::get_user_handler))
        .route_layer(middleware::from_fn(require_any_role(&[Role::Admin])))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
}
