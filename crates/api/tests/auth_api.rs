//! HTTP-level integration tests for registration, tokens and profiles.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_user, get, get_auth, patch_json_auth, post_json, post_json_auth,
    TEST_PASSWORD,
};
use sqlx::PgPool;
use storefront_db::repositories::UserRepo;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Log in via the API and return the JSON response.
async fn login_user(app: axum::Router, username: &str, password: &str) -> serde_json::Value {
    let body = serde_json::json!({ "username": username, "password": password });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

fn registration(username: &str) -> serde_json::Value {
    serde_json::json!({
        "username": username,
        "email": format!("{username}@shop.test"),
        "password": "s3cure-pass",
        "password_confirm": "s3cure-pass",
        "first_name": "Ada",
        "last_name": "Lovelace",
        "is_seller": true,
    })
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Registering returns 201 with tokens and the public user fields.
#[sqlx::test(migrations = "../../db/migrations")]
async fn register_success(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(app, "/api/v1/auth/register", registration("ada")).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["expires_in"], 15 * 60);
    assert_eq!(json["user"]["username"], "ada");
    assert_eq!(json["user"]["is_seller"], true);
    assert!(json["user"].get("password_hash").is_none());
}

/// Mismatched confirmation is a validation error on `password_confirm`.
#[sqlx::test(migrations = "../../db/migrations")]
async fn register_password_mismatch(pool: PgPool) {
    let mut body = registration("ada");
    body["password_confirm"] = serde_json::json!("something-else");

    let app = common::build_test_app(pool);
    let response = post_json(app, "/api/v1/auth/register", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["field"], "password_confirm");
    assert_eq!(json["error"], "Passwords don't match");
}

/// Short passwords and malformed emails are rejected.
#[sqlx::test(migrations = "../../db/migrations")]
async fn register_rejects_weak_input(pool: PgPool) {
    let mut short = registration("ada");
    short["password"] = serde_json::json!("short");
    short["password_confirm"] = serde_json::json!("short");
    let response = post_json(common::build_test_app(pool.clone()), "/api/v1/auth/register", short).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["field"], "password");

    let mut bad_email = registration("bob");
    bad_email["email"] = serde_json::json!("not-an-email");
    let response = post_json(common::build_test_app(pool), "/api/v1/auth/register", bad_email).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["details"]["email"].is_array());
}

/// A taken username is reported as a field error.
#[sqlx::test(migrations = "../../db/migrations")]
async fn register_duplicate_username(pool: PgPool) {
    create_user(&pool, "ada", false).await;

    let app = common::build_test_app(pool);
    let response = post_json(app, "/api/v1/auth/register", registration("ada")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["field"], "username");
}

// ---------------------------------------------------------------------------
// Login / refresh / logout
// ---------------------------------------------------------------------------

/// Successful login returns tokens and user info.
#[sqlx::test(migrations = "../../db/migrations")]
async fn login_success(pool: PgPool) {
    let user = create_user(&pool, "loginuser", false).await;
    let app = common::build_test_app(pool);

    let json = login_user(app, "loginuser", TEST_PASSWORD).await;

    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["user"]["id"], user.id);
    assert_eq!(json["user"]["email"], "loginuser@test.com");
}

/// Wrong password and unknown user both return 401.
#[sqlx::test(migrations = "../../db/migrations")]
async fn login_bad_credentials(pool: PgPool) {
    create_user(&pool, "wrongpw", false).await;

    let body = serde_json::json!({ "username": "wrongpw", "password": "incorrect" });
    let response = post_json(common::build_test_app(pool.clone()), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = serde_json::json!({ "username": "ghost", "password": "whatever" });
    let response = post_json(common::build_test_app(pool), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Login to a deactivated account returns 403.
#[sqlx::test(migrations = "../../db/migrations")]
async fn login_inactive_user(pool: PgPool) {
    let user = create_user(&pool, "inactive", false).await;
    UserRepo::deactivate(&pool, user.id).await.unwrap();

    let app = common::build_test_app(pool);
    let body = serde_json::json!({ "username": "inactive", "password": TEST_PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// Refresh tokens rotate and cannot be reused.
#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_rotates_token(pool: PgPool) {
    create_user(&pool, "refresher", false).await;
    let login = login_user(common::build_test_app(pool.clone()), "refresher", TEST_PASSWORD).await;
    let refresh_token = login["refresh_token"].as_str().unwrap().to_string();

    let body = serde_json::json!({ "refresh_token": refresh_token });
    let response = post_json(common::build_test_app(pool.clone()), "/api/v1/auth/refresh", body.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_ne!(json["refresh_token"].as_str().unwrap(), refresh_token);

    let reused = post_json(common::build_test_app(pool), "/api/v1/auth/refresh", body).await;
    assert_eq!(reused.status(), StatusCode::UNAUTHORIZED);
}

/// Concurrent refreshes with one token: exactly one wins.
#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_refresh_succeeds_once(pool: PgPool) {
    create_user(&pool, "racer", false).await;
    let login = login_user(common::build_test_app(pool.clone()), "racer", TEST_PASSWORD).await;
    let body = serde_json::json!({ "refresh_token": login["refresh_token"] });

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..16 {
        let app = common::build_test_app(pool.clone());
        let body = body.clone();
        tasks.spawn(async move { post_json(app, "/api/v1/auth/refresh", body).await.status() });
    }

    let mut ok = 0;
    while let Some(status) = tasks.join_next().await {
        match status.unwrap() {
            StatusCode::OK => ok += 1,
            other => assert_eq!(other, StatusCode::UNAUTHORIZED),
        }
    }
    assert_eq!(ok, 1);
}

/// Logout revokes every refresh token of the caller.
#[sqlx::test(migrations = "../../db/migrations")]
async fn logout_revokes_sessions(pool: PgPool) {
    create_user(&pool, "leaver", false).await;
    let login = login_user(common::build_test_app(pool.clone()), "leaver", TEST_PASSWORD).await;
    let access = login["access_token"].as_str().unwrap();
    let refresh = login["refresh_token"].as_str().unwrap();

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/auth/logout",
        serde_json::json!({}),
        access,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let body = serde_json::json!({ "refresh_token": refresh });
    let response = post_json(common::build_test_app(pool), "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Profile endpoints require a token.
#[sqlx::test(migrations = "../../db/migrations")]
async fn profile_requires_auth(pool: PgPool) {
    let response = get(common::build_test_app(pool.clone()), "/api/v1/auth/profile").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_auth(common::build_test_app(pool), "/api/v1/auth/profile", "garbage").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// PATCH updates only the given fields; `null` clears the phone number.
#[sqlx::test(migrations = "../../db/migrations")]
async fn profile_partial_update(pool: PgPool) {
    let user = create_user(&pool, "editor", false).await;
    let token = common::token_for(&user);

    let response = patch_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/auth/profile",
        serde_json::json!({ "first_name": "Grace", "phone_number": "+1 555 0100" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["first_name"], "Grace");
    assert_eq!(json["data"]["phone_number"], "+1 555 0100");
    assert_eq!(json["data"]["email"], "editor@test.com");

    let response = patch_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/auth/profile",
        serde_json::json!({ "phone_number": null }),
        &token,
    )
    .await;
    let json = body_json(response).await;
    assert!(json["data"]["phone_number"].is_null());
    assert_eq!(json["data"]["first_name"], "Grace");

    let response = get_auth(common::build_test_app(pool), "/api/v1/auth/profile", &token).await;
    assert_eq!(body_json(response).await["data"]["username"], "editor");
}
