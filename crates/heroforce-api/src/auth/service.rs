//! Authentication service layer
//!
//! Orchestrates credential verification, token-pair issuance and rotation,
//! logout revocation, and principal resolution. The HTTP layer calls into
//! this service and maps its errors to status codes; all security
//! decisions live here and in the token codec.

use super::blacklist::TokenBlacklist;
use super::jwt::TokenCodec;
use super::password::verify_password;
use heroforce_core::{UserPublic, UserStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Session service failures
///
/// `InvalidCredentials` and `InvalidRefreshToken` are deliberately
/// uninformative: the login message is identical for unknown email and
/// wrong password, and the refresh message does not distinguish expired
/// from malformed from unsigned.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// User login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Authentication response with the issued token pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserPublic,
}

/// Rotated token pair returned by `refresh`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Authentication service
///
/// Holds the credential store, the token codec, and the shared revocation
/// registry. Cheap to clone; all state is behind `Arc`s.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    codec: TokenCodec,
    blacklist: Arc<TokenBlacklist>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, codec: TokenCodec) -> Self {
        Self {
            users,
            codec,
            blacklist: Arc::new(TokenBlacklist::new()),
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn blacklist(&self) -> &TokenBlacklist {
        &self.blacklist
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    /// Login with email and password, issuing an access/refresh pair.
    ///
    /// Unknown email and wrong password produce the identical
    /// [`SessionError::InvalidCredentials`] so a caller cannot tell which
    /// check failed.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, SessionError> {
        let email = email.trim().to_lowercase();

        let user = match self.users.find_by_email(&email).await {
            Some(user) => user,
            None => {
                warn!(email = %email, "Login failed: unknown email");
                return Err(SessionError::InvalidCredentials);
            }
        };

        let password_valid = verify_password(password, &user.password_hash)
            .map_err(|e| SessionError::Internal(format!("Password verification failed: {e}")))?;

        if !password_valid {
            warn!(email = %email, "Login failed: wrong password");
            return Err(SessionError::InvalidCredentials);
        }

        let access_token = self
            .codec
            .issue(
                user.id,
                &user.email,
                &user.name,
                user.role,
                self.codec.config().access_ttl_secs,
            )
            .map_err(|e| SessionError::Internal(format!("Failed to issue access token: {e}")))?;

        let refresh_token = self
            .codec
            .issue(
                user.id,
                &user.email,
                &user.name,
                user.role,
                self.codec.config().refresh_ttl_secs,
            )
            .map_err(|e| SessionError::Internal(format!("Failed to issue refresh token: {e}")))?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.codec.config().access_ttl_secs,
            user: user.to_public(),
        })
    }

    /// Rotate a refresh token into a fresh access/refresh pair.
    ///
    /// The presented token must verify (signature + expiry) and must not
    /// have been revoked by a logout; any failure is the uniform
    /// [`SessionError::InvalidRefreshToken`].
    ///
    /// Claims are re-derived from the verified payload without re-fetching
    /// the user record, so a role change propagates only once the refresh
    /// token itself expires (staleness window = refresh TTL). The
    /// presented token stays valid until then; only logout revokes it.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, SessionError> {
        if self.blacklist.is_revoked(refresh_token) {
            warn!("Refresh rejected: token revoked");
            return Err(SessionError::InvalidRefreshToken);
        }

        let claims = self.codec.verify(refresh_token).map_err(|e| {
            warn!(reason = %e, "Refresh rejected: verification failed");
            SessionError::InvalidRefreshToken
        })?;

        let new_access = self
            .codec
            .issue(
                claims.sub,
                &claims.email,
                &claims.name,
                claims.role,
                self.codec.config().access_ttl_secs,
            )
            .map_err(|e| SessionError::Internal(format!("Failed to issue access token: {e}")))?;

        let new_refresh = self
            .codec
            .issue(
                claims.sub,
                &claims.email,
                &claims.name,
                claims.role,
                self.codec.config().refresh_ttl_secs,
            )
            .map_err(|e| SessionError::Internal(format!("Failed to issue refresh token: {e}")))?;

        Ok(TokenPair {
            access_token: new_access,
            refresh_token: new_refresh,
        })
    }

    /// Revoke whichever of the two tokens are present and still live.
    ///
    /// Never fails: the user-facing contract ("you are logged out") holds
    /// regardless of token salvageability, so decode failures are logged
    /// and swallowed. A token already past its expiry is not registered;
    /// the expiry check rejects it anyway.
    pub async fn logout(&self, access_token: Option<&str>, refresh_token: Option<&str>) {
        if let Some(token) = refresh_token {
            self.revoke_if_live(token, "refresh");
        }
        if let Some(token) = access_token {
            self.revoke_if_live(token, "access");
        }
    }

    fn revoke_if_live(&self, token: &str, kind: &str) {
        let claims = match self.codec.decode_unsafe(token) {
            Some(claims) => claims,
            None => {
                warn!(kind, "Failed to decode token during logout");
                return;
            }
        };

        let now = match self.codec.now_unix() {
            Ok(now) => now,
            Err(e) => {
                warn!(kind, error = %e, "Clock failure during logout");
                return;
            }
        };

        if claims.exp > now {
            self.blacklist.revoke(token, claims.exp, now);
        } else {
            warn!(kind, "Token already expired at logout");
        }
    }

    /// Resolve a token to the public view of its principal.
    ///
    /// Full verification: signature, expiry, and non-revocation. Any
    /// failure is the uniform [`SessionError::InvalidToken`].
    pub async fn resolve_principal(&self, token: &str) -> Result<UserPublic, SessionError> {
        if self.blacklist.is_revoked(token) {
            warn!("Token resolution rejected: token revoked");
            return Err(SessionError::InvalidToken);
        }

        let claims = self.codec.verify(token).map_err(|e| {
            warn!(reason = %e, "Token resolution rejected: verification failed");
            SessionError::InvalidToken
        })?;

        Ok(UserPublic {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
            role: claims.role,
        })
    }
}
