//! HeroForce Core - Domain models, traits, and shared types
//!
//! This crate defines the abstractions shared across the HeroForce auth
//! system:
//! - User accounts and roles
//! - The credential store contract ([`UserStore`])
//! - Configuration management

pub mod config;

pub use config::{AppConfig, ConfigError, LoggingConfig, ServerConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

// ============================================================================
// Roles
// ============================================================================

/// Access role carried in token claims and compared against route
/// requirements.
///
/// - `Admin`: full access including user management
/// - `Hero`: regular authenticated user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Hero,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "ADMIN",
            Role::Hero => "HERO",
        }
    }

    /// Parse a role from its wire representation (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ADMIN" => Some(Role::Admin),
            "HERO" => Some(Role::Hero),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Users
// ============================================================================

/// User account record as returned by the credential store.
///
/// The password hash is never serialized in API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: i64,

    /// Email address (unique, stored lower-cased, used for login)
    pub email: String,

    /// Argon2id password hash (PHC string format)
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Display name
    pub name: String,

    /// Access role
    pub role: Role,
}

impl User {
    pub fn new(
        id: i64,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id,
            email: email.into(),
            password_hash: password_hash.into(),
            name: name.into(),
            role,
        }
    }

    /// Public representation, safe for API responses.
    pub fn to_public(&self) -> UserPublic {
        UserPublic {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }
}

/// Public user representation (no credentials or security settings).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPublic {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

// ============================================================================
// Credential store contract
// ============================================================================

/// Lookup interface to the user store.
///
/// The auth subsystem only ever needs these two queries; everything else
/// about user management (creation, persistence, field validation) lives
/// behind this trait and is not its concern. `email` is expected to be
/// normalized (trimmed, lower-cased) by the caller.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Option<User>;

    async fn find_by_id(&self, id: i64) -> Option<User>;
}

/// In-memory user store.
///
/// Backs development, the seeded default deployment, and tests. A
/// database-backed store slots in behind [`UserStore`] without touching
/// the auth code.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<i64, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user, replacing any existing record with the same id.
    pub fn insert(&self, user: User) {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        users.insert(user.id, user);
    }

    pub fn contains_email(&self, email: &str) -> bool {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        users.values().any(|u| u.email == email)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Option<User> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        users.values().find(|u| u.email == email).cloned()
    }

    async fn find_by_id(&self, id: i64) -> Option<User> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        users.get(&id).cloned()
    }
}
