//! HeroForce API Server

use heroforce_api::auth::{hash_password, JwtConfig, TokenCodec};
use heroforce_api::{create_router, state::AppState};
use heroforce_core::config::AppConfig;
use heroforce_core::{InMemoryUserStore, Role, User};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration: CONFIG_FILE takes precedence over the environment
    let config = match std::env::var("CONFIG_FILE") {
        Ok(path) => AppConfig::from_file(path)?,
        Err(_) => AppConfig::from_env().unwrap_or_default(),
    };
    let jwt_config = JwtConfig::from_env();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "heroforce_api={},tower_http=debug",
            config.logging.level
        )
        .into()
    });
    if config.logging.json_format {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Seed the admin account
    let store = Arc::new(InMemoryUserStore::new());
    seed_admin(&store)?;

    // Create application state
    let state = Arc::new(AppState::new(
        config,
        store,
        TokenCodec::new(jwt_config),
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("HeroForce API Server starting on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Insert the bootstrap admin unless a user with that email exists.
fn seed_admin(store: &Arc<InMemoryUserStore>) -> anyhow::Result<()> {
    let email = std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@heroforce.com".to_string());
    let password = match std::env::var("ADMIN_PASSWORD") {
        Ok(p) => p,
        Err(_) => {
            tracing::warn!("ADMIN_PASSWORD not set, using development default");
            "admin123".to_string()
        }
    };

    if store.contains_email(&email) {
        return Ok(());
    }

    let password_hash = hash_password(&password)?;
    store.insert(User::new(1, email.clone(), password_hash, "Admin", Role::Admin));
    tracing::info!(email = %email, "Seeded admin account");

    Ok(())
}
