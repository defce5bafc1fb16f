//! JWT token issuance and verification
//!
//! Implements the dual-token scheme with HMAC-SHA256 signing. Access and
//! refresh tokens share the same claims layout and differ only in their
//! configured lifetime. Expiry is checked against an injectable clock so
//! token lifecycles can be driven deterministically in tests.

use heroforce_core::Role;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};
use thiserror::Error;

/// JWT Claims structure containing user information
///
/// These claims are embedded in both access and refresh tokens and
/// extracted during verification. Invariant: `exp > iat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Token issuer
    pub iss: String,
    /// Subject - user ID
    pub sub: i64,
    /// User's email address
    pub email: String,
    /// User's display name
    pub name: String,
    /// User's role (ADMIN, HERO)
    pub role: Role,
    /// Issued at timestamp (Unix epoch seconds)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch seconds)
    pub exp: u64,
}

/// Token codec errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Malformed token")]
    Malformed,

    #[error("System time error: {0}")]
    SystemTime(#[from] SystemTimeError),
}

/// JWT Configuration
///
/// Contains the signing key and the lifetimes for both token kinds.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for HMAC signing
    pub secret: String,
    /// Access token lifetime in seconds (default: 3600 = 1 hour)
    pub access_ttl_secs: u64,
    /// Refresh token lifetime in seconds (default: 604800 = 7 days)
    pub refresh_ttl_secs: u64,
    /// Token issuer identifier
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "development-secret-key-change-in-production".to_string(),
            access_ttl_secs: 3600,           // 1 hour
            refresh_ttl_secs: 7 * 24 * 3600, // 7 days
            issuer: "heroforce-api".to_string(),
        }
    }
}

impl JwtConfig {
    /// Create a new JWT configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| "development-secret-key-change-in-production".to_string()),
            access_ttl_secs: std::env::var("JWT_ACCESS_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
            refresh_ttl_secs: std::env::var("JWT_REFRESH_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(7 * 24 * 3600),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "heroforce-api".to_string()),
        }
    }
}

/// Time source consulted on every issue and verify call.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> Result<u64, SystemTimeError>;
}

/// Wall-clock time source used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> Result<u64, SystemTimeError> {
        Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
    }
}

/// Manually advanceable clock for deterministic expiry tests.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<std::sync::atomic::AtomicU64>,
}

#[cfg(any(test, feature = "test-utils"))]
impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: Arc::new(std::sync::atomic::AtomicU64::new(now)),
        }
    }

    pub fn advance(&self, secs: u64) {
        self.now
            .fetch_add(secs, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Clock for ManualClock {
    fn now_unix(&self) -> Result<u64, SystemTimeError> {
        Ok(self.now.load(std::sync::atomic::Ordering::SeqCst))
    }
}

/// Signs and verifies compact tokens carrying [`Claims`].
///
/// Pure: the output depends only on the input, the signing key, and the
/// clock. The codec never consults the revocation registry; callers
/// combine the two checks.
#[derive(Clone)]
pub struct TokenCodec {
    config: JwtConfig,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(config: JwtConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: JwtConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    /// Current time according to the codec's clock (Unix epoch seconds).
    pub fn now_unix(&self) -> Result<u64, JwtError> {
        Ok(self.clock.now_unix()?)
    }

    /// Issue a signed token with `exp = now + ttl_secs`.
    pub fn issue(
        &self,
        sub: i64,
        email: &str,
        name: &str,
        role: Role,
        ttl_secs: u64,
    ) -> Result<String, JwtError> {
        let now = self.clock.now_unix()?;

        let claims = Claims {
            iss: self.config.issuer.clone(),
            sub,
            email: email.to_string(),
            name: name.to_string(),
            role,
            iat: now,
            exp: now + ttl_secs,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        )
        .map_err(JwtError::Encoding)
    }

    /// Verify a token's signature, issuer, and expiry, returning its claims.
    ///
    /// Fails closed: any parse error, signature mismatch, or `now >= exp`
    /// is a rejection. Expiry is evaluated against the injected clock with
    /// zero leeway.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        // Expiry is checked below against the codec clock, not wall time
        validation.validate_exp = false;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Malformed,
        })?;

        let now = self.clock.now_unix()?;
        if now >= token_data.claims.exp {
            return Err(JwtError::Expired);
        }

        Ok(token_data.claims)
    }

    /// Decode a token's claims without verifying signature or expiry.
    ///
    /// Only for logout bookkeeping (reading `exp` off a token that may
    /// already be past its prime). Never use the result for access-control
    /// decisions.
    pub fn decode_unsafe(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .ok()
            .map(|data| data.claims)
    }
}
