//! API Integration Tests
//!
//! Runs the full router against an in-memory user store seeded with one
//! hero and one admin account. Token lifecycles are driven by a manual
//! clock, so expiry tests do not sleep.

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use heroforce_api::auth::{JwtConfig, ManualClock};
use heroforce_api::test_support::{
    seeded_state, ADMIN_EMAIL, ADMIN_PASSWORD, HERO_EMAIL, HERO_PASSWORD,
};
use heroforce_api::create_router;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app() -> (Router, ManualClock) {
    let (state, clock) = seeded_state(JwtConfig::default());
    (create_router(state), clock)
}

/// Helper to create a test request
fn create_json_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Login and return the parsed response body.
async fn login(app: &Router, email: &str, password: &str) -> Value {
    let request = create_json_request(
        "POST",
        "/api/v1/auth/login",
        Some(json!({ "email": email, "password": password })),
    );

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    body_json(response).await
}

fn bearer_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

// =============================================================================
// Health Check
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let (app, _) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_success() {
    let (app, _) = test_app();

    let request = create_json_request(
        "POST",
        "/api/v1/auth/login",
        Some(json!({
            "email": HERO_EMAIL,
            "password": HERO_PASSWORD
        })),
    );

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    // Refresh token also travels as an httpOnly cookie
    let set_cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("refresh_token="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));

    let json = body_json(response).await;

    assert!(json["access_token"].is_string());
    assert!(!json["access_token"].as_str().unwrap().is_empty());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["token_type"], "Bearer");
    assert!(json["expires_in"].is_number());

    assert_eq!(json["user"]["email"], HERO_EMAIL);
    assert_eq!(json["user"]["name"], "Super Hero");
    assert_eq!(json["user"]["role"], "HERO");
    assert!(json["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let (app, _) = test_app();

    let unknown = app
        .clone()
        .oneshot(create_json_request(
            "POST",
            "/api/v1/auth/login",
            Some(json!({ "email": "nobody@heroforce.com", "password": "whatever" })),
        ))
        .await
        .unwrap();

    let wrong_password = app
        .oneshot(create_json_request(
            "POST",
            "/api/v1/auth/login",
            Some(json!({ "email": HERO_EMAIL, "password": "wrong-password" })),
        ))
        .await
        .unwrap();

    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);

    // Identical bodies: the response never reveals which check failed
    let unknown_json = body_json(unknown).await;
    let wrong_json = body_json(wrong_password).await;
    assert_eq!(unknown_json, wrong_json);
    assert_eq!(unknown_json["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_login_normalizes_email() {
    let (app, _) = test_app();

    let response = app
        .oneshot(create_json_request(
            "POST",
            "/api/v1/auth/login",
            Some(json!({ "email": "  HERO@heroforce.com ", "password": HERO_PASSWORD })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Protected routes
// =============================================================================

#[tokio::test]
async fn test_me_returns_principal() {
    let (app, _) = test_app();

    let login_json = login(&app, HERO_EMAIL, HERO_PASSWORD).await;
    let access_token = login_json["access_token"].as_str().unwrap();

    let response = app
        .oneshot(bearer_request("GET", "/api/v1/auth/me", access_token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["id"], 1);
    assert_eq!(json["email"], HERO_EMAIL);
    assert_eq!(json["name"], "Super Hero");
    assert_eq!(json["role"], "HERO");
}

#[tokio::test]
async fn test_me_without_token() {
    let (app, _) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/auth/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["code"], "MISSING_TOKEN");
}

#[tokio::test]
async fn test_me_with_garbage_token() {
    let (app, _) = test_app();

    let response = app
        .oneshot(bearer_request("GET", "/api/v1/auth/me", "not.a.token"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["code"], "TOKEN_MALFORMED");
}

// =============================================================================
// Role-gated routes
// =============================================================================

#[tokio::test]
async fn test_admin_route_rejects_hero() {
    let (app, _) = test_app();

    let login_json = login(&app, HERO_EMAIL, HERO_PASSWORD).await;
    let access_token = login_json["access_token"].as_str().unwrap();

    let response = app
        .oneshot(bearer_request("GET", "/api/v1/users/2", access_token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let json = body_json(response).await;
    assert_eq!(json["code"], "INSUFFICIENT_ROLE");
}

#[tokio::test]
async fn test_admin_route_allows_admin() {
    let (app, _) = test_app();

    let login_json = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let access_token = login_json["access_token"].as_str().unwrap();

    let response = app
        .oneshot(bearer_request("GET", "/api/v1/users/1", access_token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["id"], 1);
    assert_eq!(json["email"], HERO_EMAIL);
    assert_eq!(json["role"], "HERO");
    assert!(json.get("password_hash").is_none());
}

#[tokio::test]
async fn test_admin_route_unknown_user_is_404() {
    let (app, _) = test_app();

    let login_json = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let access_token = login_json["access_token"].as_str().unwrap();

    let response = app
        .oneshot(bearer_request("GET", "/api/v1/users/99", access_token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Logout and revocation
// =============================================================================

#[tokio::test]
async fn test_logout_invalidates_access_token() {
    let (app, _) = test_app();

    let login_json = login(&app, HERO_EMAIL, HERO_PASSWORD).await;
    let access_token = login_json["access_token"].as_str().unwrap();

    // Token works before logout
    let me_before = app
        .clone()
        .oneshot(bearer_request("GET", "/api/v1/auth/me", access_token))
        .await
        .unwrap();
    assert_eq!(me_before.status(), StatusCode::OK);

    let logout_response = app
        .clone()
        .oneshot(bearer_request("POST", "/api/v1/auth/logout", access_token))
        .await
        .unwrap();

    assert_eq!(logout_response.status(), StatusCode::OK);

    // Logout clears the refresh cookie
    let set_cookie = logout_response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(set_cookie.contains("Max-Age=0"));

    let logout_json = body_json(logout_response).await;
    assert_eq!(logout_json["message"], "Logged out successfully");

    // The revoked token is now rejected before signature checks matter
    let me_after = app
        .oneshot(bearer_request("GET", "/api/v1/auth/me", access_token))
        .await
        .unwrap();

    assert_eq!(me_after.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(me_after).await;
    assert_eq!(json["code"], "TOKEN_REVOKED");
}

#[tokio::test]
async fn test_logout_with_garbage_token_still_succeeds() {
    let (app, _) = test_app();

    let response = app
        .oneshot(bearer_request("POST", "/api/v1/auth/logout", "garbage"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_without_any_token_still_succeeds() {
    let (app, _) = test_app();

    let response = app
        .oneshot(create_json_request("POST", "/api/v1/auth/logout", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_after_logout_is_rejected() {
    let (app, _) = test_app();

    let login_json = login(&app, HERO_EMAIL, HERO_PASSWORD).await;
    let access_token = login_json["access_token"].as_str().unwrap();
    let refresh_token = login_json["refresh_token"].as_str().unwrap();

    // Logout with the refresh cookie attached revokes both tokens
    let logout_request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/logout")
        .header("Authorization", format!("Bearer {access_token}"))
        .header("Cookie", format!("refresh_token={refresh_token}"))
        .body(Body::empty())
        .unwrap();

    let logout_response = app.clone().oneshot(logout_request).await.unwrap();
    assert_eq!(logout_response.status(), StatusCode::OK);

    let refresh_response = app
        .oneshot(create_json_request(
            "POST",
            "/api/v1/auth/refresh",
            Some(json!({ "refresh_token": refresh_token })),
        ))
        .await
        .unwrap();

    assert_eq!(refresh_response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(refresh_response).await;
    assert_eq!(json["message"], "Invalid refresh token");
}

// =============================================================================
// Refresh and expiry
// =============================================================================

#[tokio::test]
async fn test_expired_access_token_then_refresh() {
    let (app, clock) = test_app();

    let login_json = login(&app, HERO_EMAIL, HERO_PASSWORD).await;
    let access_token = login_json["access_token"].as_str().unwrap();
    let refresh_token = login_json["refresh_token"].as_str().unwrap();

    // Past the access lifetime but well within the refresh lifetime
    clock.advance(3601);

    let me_expired = app
        .clone()
        .oneshot(bearer_request("GET", "/api/v1/auth/me", access_token))
        .await
        .unwrap();
    assert_eq!(me_expired.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(me_expired).await;
    assert_eq!(json["code"], "TOKEN_EXPIRED");

    let refresh_response = app
        .clone()
        .oneshot(create_json_request(
            "POST",
            "/api/v1/auth/refresh",
            Some(json!({ "refresh_token": refresh_token })),
        ))
        .await
        .unwrap();
    assert_eq!(refresh_response.status(), StatusCode::OK);

    let refresh_json = body_json(refresh_response).await;
    let new_access = refresh_json["access_token"].as_str().unwrap();
    assert_ne!(new_access, access_token);

    // The fresh pair is usable again
    let me_again = app
        .oneshot(bearer_request("GET", "/api/v1/auth/me", new_access))
        .await
        .unwrap();
    assert_eq!(me_again.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_with_invalid_token() {
    let (app, _) = test_app();

    let response = app
        .oneshot(create_json_request(
            "POST",
            "/api/v1/auth/refresh",
            Some(json!({ "refresh_token": "invalid_refresh_token_12345" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Invalid refresh token");
}

#[tokio::test]
async fn test_refresh_via_cookie() {
    let (app, _) = test_app();

    let login_json = login(&app, HERO_EMAIL, HERO_PASSWORD).await;
    let refresh_token = login_json["refresh_token"].as_str().unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/refresh")
        .header("Cookie", format!("refresh_token={refresh_token}"))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    // Rotation: a new cookie is set on every refresh
    let set_cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("refresh_token="));

    let json = body_json(response).await;
    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
}

#[tokio::test]
async fn test_refresh_without_token_anywhere() {
    let (app, _) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/refresh")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Verify
// =============================================================================

#[tokio::test]
async fn test_verify_valid_token() {
    let (app, _) = test_app();

    let login_json = login(&app, HERO_EMAIL, HERO_PASSWORD).await;
    let access_token = login_json["access_token"].as_str().unwrap();

    let response = app
        .oneshot(bearer_request("GET", "/api/v1/auth/verify", access_token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["valid"], true);
    assert_eq!(json["user"]["email"], HERO_EMAIL);
}

#[tokio::test]
async fn test_verify_failures_are_uniform() {
    let (app, clock) = test_app();

    let login_json = login(&app, HERO_EMAIL, HERO_PASSWORD).await;
    let access_token = login_json["access_token"].as_str().unwrap().to_string();

    clock.advance(3601);

    let expired = app
        .clone()
        .oneshot(bearer_request("GET", "/api/v1/auth/verify", &access_token))
        .await
        .unwrap();
    let garbage = app
        .oneshot(bearer_request("GET", "/api/v1/auth/verify", "nonsense"))
        .await
        .unwrap();

    assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);

    let expired_json = body_json(expired).await;
    let garbage_json = body_json(garbage).await;
    assert_eq!(expired_json, garbage_json);
}
