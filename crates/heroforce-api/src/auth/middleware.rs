/// Request gates for protected routes
///
/// Two layers, applied in order at route registration time:
/// 1. Authentication: bearer extraction, revocation check, token
///    verification; attaches the [`Principal`] to request extensions.
/// 2. Authorization: compares the principal's role against the role set
///    declared for the route.
///
/// Unlike login, these failures are distinguishable to the caller: a
/// client holding a token can react differently to an expired token
/// (silently refresh) than to a revoked one (force re-login).
use super::jwt::{Claims, JwtError};
use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use heroforce_core::Role;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Authenticated identity reconstructed from verified token claims.
///
/// Ephemeral: rebuilt per request, attached to request extensions by the
/// authentication gate, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
            role: claims.role,
        }
    }
}

/// Gate rejection kinds
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Token has been revoked")]
    RevokedToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Insufficient role")]
    InsufficientRole,
}

impl AuthError {
    fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::RevokedToken => "TOKEN_REVOKED",
            AuthError::ExpiredToken => "TOKEN_EXPIRED",
            AuthError::MalformedToken => "TOKEN_MALFORMED",
            AuthError::InvalidSignature => "INVALID_SIGNATURE",
            AuthError::InsufficientRole => "INSUFFICIENT_ROLE",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::InsufficientRole => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        };

        let body = serde_json::json!({
            "code": self.code(),
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

fn verify_error(e: &JwtError) -> AuthError {
    match e {
        JwtError::Expired => AuthError::ExpiredToken,
        JwtError::InvalidSignature => AuthError::InvalidSignature,
        _ => AuthError::MalformedToken,
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// Absent header, non-bearer scheme, and a value that is empty after
/// trimming all count as missing.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Authentication gate
///
/// Terminal states per request: accept (principal attached, next layer
/// runs) or reject with a distinguishable [`AuthError`]. Checks run in
/// order: bearer presence, revocation registry, signature + expiry.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let ip_address = extract_ip_address(request.headers());
    let user_agent = extract_user_agent(request.headers());

    let token = bearer_token(request.headers()).ok_or(AuthError::MissingToken)?;

    if state.auth.blacklist().is_revoked(token) {
        audit_log(&AuditEvent::InvalidToken {
            ip_address,
            user_agent,
            reason: "Token has been revoked".to_string(),
        });
        return Err(AuthError::RevokedToken);
    }

    let claims = match state.auth.codec().verify(token) {
        Ok(claims) => claims,
        Err(e) => {
            audit_log(&AuditEvent::InvalidToken {
                ip_address,
                user_agent,
                reason: e.to_string(),
            });
            return Err(verify_error(&e));
        }
    };

    request.extensions_mut().insert(Principal::from(claims));

    Ok(next.run(request).await)
}

/// Authorization decision
///
/// `None` or an empty role set allows any authenticated principal;
/// otherwise allow iff the principal's role is in the set. There is no
/// implicit admin bypass: routes that admit admins list [`Role::Admin`].
pub fn authorize(required: Option<&[Role]>, principal: &Principal) -> Result<(), AuthError> {
    match required {
        None => Ok(()),
        Some(roles) if roles.is_empty() => Ok(()),
        Some(roles) if roles.contains(&principal.role) => Ok(()),
        Some(_) => Err(AuthError::InsufficientRole),
    }
}

/// Type alias for role middleware future
type RoleMiddlewareFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>>;

/// Middleware factory for role-based access control.
///
/// The role set is declared once at route registration and is read-only
/// at request time. Must be layered after [`auth_middleware`]: with no
/// principal in the extensions there is no decision to make and the
/// request is rejected.
///
/// ```ignore
/// use axum::{middleware, routing::get, Router};
/// use heroforce_api::auth::middleware::{auth_middleware, require_any_role};
/// use heroforce_core::Role;
///
/// let admin_routes = Router::new()
///     .route("/users/:id", get(users::get_user_handler))
///     .route_layer(middleware::from_fn(require_any_role(&[Role::Admin])))
///     .route_layer(middleware::from_fn_with_state(state, auth_middleware));
/// ```
pub fn require_any_role(
    required_roles: &'static [Role],
) -> impl Fn(Request<Body>, Next) -> RoleMiddlewareFuture + Clone {
    move |request: Request<Body>, next: Next| {
        Box::pin(async move {
            let ip_address = extract_ip_address(request.headers());
            let user_agent = extract_user_agent(request.headers());

            let principal = request
                .extensions()
                .get::<Principal>()
                .ok_or(AuthError::MissingToken)?
                .clone();

            if let Err(e) = authorize(Some(required_roles), &principal) {
                audit_log(&AuditEvent::AccessDenied {
                    user_id: Some(principal.id),
                    email: Some(principal.email.clone()),
                    resource: request.uri().path().to_string(),
                    required_roles: required_roles.iter().map(|r| r.to_string()).collect(),
                    ip_address,
                    user_agent,
                });
                return Err(e);
            }

            Ok(next.run(request).await)
        })
    }
}
