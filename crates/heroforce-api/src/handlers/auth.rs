//! Authentication API handlers
//!
//! HTTP surface over the session service. The refresh token travels both
//! in the JSON body and in an httpOnly cookie so browser clients never
//! expose it to scripts; non-browser clients use the body field.

use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::auth::middleware::{bearer_token, Principal};
use crate::auth::{AuthResponse, LoginRequest, TokenPair};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap},
    response::{AppendHeaders, IntoResponse},
    Extension, Json,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cookie carrying the refresh token between rotations.
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Refresh request body, for clients that do not use the cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Logout response
#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// Token verification response
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub user: heroforce_core::UserPublic,
}

fn refresh_cookie(state: &AppState, token: &str) -> String {
    // Secure is omitted outside production to allow http://localhost
    let secure_flag = if state.config.server.production {
        " Secure;"
    } else {
        ""
    };
    format!(
        "{REFRESH_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax;{secure_flag} Max-Age={}",
        state.auth.codec().config().refresh_ttl_secs
    )
}

fn clear_refresh_cookie(state: &AppState) -> String {
    let secure_flag = if state.config.server.production {
        " Secure;"
    } else {
        ""
    };
    format!("{REFRESH_COOKIE}=; Path=/; HttpOnly; SameSite=Lax;{secure_flag} Max-Age=0")
}

/// Login with email and password
///
/// Authenticates a user and returns an access/refresh token pair. The
/// refresh token is also set as an httpOnly cookie. Every failure mode
/// answers 401 with the same body.
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ip_address = extract_ip_address(&headers);
    let user_agent = extract_user_agent(&headers);

    let response: AuthResponse = match state.auth.login(&request.email, &request.password).await {
        Ok(response) => response,
        Err(e) => {
            audit_log(&AuditEvent::LoginFailure {
                email: request.email.clone(),
                ip_address,
                user_agent,
            });
            return Err(e.into());
        }
    };

    audit_log(&AuditEvent::LoginSuccess {
        user_id: response.user.id,
        email: response.user.email.clone(),
        ip_address,
        user_agent,
    });

    let cookie = refresh_cookie(&state, &response.refresh_token);

    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Json(response)))
}

/// Refresh the token pair
///
/// Accepts the refresh token from the cookie or the JSON body (cookie
/// wins) and answers with a freshly issued pair plus a rotated cookie.
/// The presented refresh token is not revoked; it ages out on its own
/// expiry.
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let ip_address = extract_ip_address(&headers);
    let user_agent = extract_user_agent(&headers);

    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| body.map(|Json(req)| req.refresh_token))
        .ok_or_else(|| AppError::from(crate::auth::SessionError::InvalidRefreshToken))?;

    let pair: TokenPair = state.auth.refresh(&token).await?;

    if let Some(claims) = state.auth.codec().decode_unsafe(&pair.access_token) {
        audit_log(&AuditEvent::TokenRefresh {
            user_id: claims.sub,
            email: claims.email,
            ip_address,
            user_agent,
        });
    }

    let cookie = refresh_cookie(&state, &pair.refresh_token);

    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Json(pair)))
}

/// Logout current session
///
/// Revokes whichever of the two tokens accompany the request (bearer
/// header, refresh cookie) and clears the cookie. Always answers 200:
/// a missing, garbled, or already expired token leaves nothing to
/// revoke, and logout has succeeded either way.
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> impl IntoResponse {
    let ip_address = extract_ip_address(&headers);
    let user_agent = extract_user_agent(&headers);

    let access = bearer_token(&headers);
    let refresh = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());

    state.auth.logout(access, refresh.as_deref()).await;

    audit_log(&AuditEvent::Logout {
        ip_address,
        user_agent,
    });

    let cookie = clear_refresh_cookie(&state);

    (
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(LogoutResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}

/// Check an access token without passing through the gate
///
/// Public endpoint: clients probe whether a token they hold is still
/// usable. Failure modes are collapsed into a single 401.
pub async fn verify_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<VerifyResponse>, AppError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| AppError::from(crate::auth::SessionError::InvalidToken))?;

    let user = state.auth.resolve_principal(token).await?;

    Ok(Json(VerifyResponse { valid: true, user }))
}

/// Get the authenticated principal
///
/// Protected endpoint: the gate already verified the token and attached
/// the principal, so this is a plain read of the request extensions.
pub async fn me_handler(Extension(principal): Extension<Principal>) -> Json<Principal> {
    Json(principal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logout_response_serialization() {
        let response = LogoutResponse {
            message: "Logged out successfully".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("Logged out successfully"));
    }

    #[test]
    fn test_refresh_request_deserialization() {
        let request: RefreshRequest =
            serde_json::from_str(r#"{"refresh_token":"abc.def.ghi"}"#).unwrap();
        assert_eq!(request.refresh_token, "abc.def.ghi");
    }
}
