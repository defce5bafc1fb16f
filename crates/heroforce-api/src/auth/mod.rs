//! Authentication and authorization module
//!
//! JWT-based session management with the following components:
//! - Token issuance and verification (access + refresh pairs)
//! - In-memory revoked-token registry
//! - Password hashing with Argon2
//! - Request gates for authentication and role checks
//! - Session service tying credentials, tokens, and revocation together

pub mod blacklist;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use blacklist::TokenBlacklist;
pub use jwt::{Claims, Clock, JwtConfig, JwtError, SystemClock, TokenCodec};
pub use middleware::{auth_middleware, authorize, require_any_role, AuthError, Principal};
pub use password::{hash_password, verify_password, PasswordError};
pub use service::{AuthResponse, AuthService, LoginRequest, SessionError, TokenPair};

#[cfg(any(test, feature = "test-utils"))]
pub use jwt::ManualClock;
