//! User API handlers

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use heroforce_core::UserPublic;
use std::sync::Arc;

/// Look up a user by id. Admin only, enforced at route registration.
pub async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<UserPublic>, AppError> {
    let user = state
        .auth
        .users()
        .find_by_id(id)
        .await
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

    Ok(Json(user.to_public()))
}
