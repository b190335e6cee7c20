//! Integration tests for the account pages and password reset.
//!
//! Run with: cargo test -p dealshop-integration-tests --test auth

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use chrono::{Duration, Utc};

use dealshop_core::PasswordResetToken;
use dealshop_integration_tests::{TestApp, fixtures};
use dealshop_storefront::db::{CustomerRepository, ResetTokenRepository};
use dealshop_storefront::services::{AuthError, AuthService};

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_page_accessible() {
    let app = TestApp::new();

    let response = app.get("/login", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains(r#"id="login-form""#));
}

#[tokio::test]
async fn test_login_successful_with_username() {
    let app = TestApp::new();
    let user = fixtures::user(&app.store).await;

    let cookie = app.login("testuser", fixtures::USER_PASSWORD).await;

    let home = app.get("/", Some(&cookie)).await;
    assert_eq!(home.status, StatusCode::OK);
    assert!(home.body.contains(&user.username));
}

#[tokio::test]
async fn test_login_successful_with_email() {
    let app = TestApp::new();
    fixtures::user(&app.store).await;

    let cookie = app.login("Test@Example.com", fixtures::USER_PASSWORD).await;

    assert!(cookie.starts_with("ds_session="));
}

#[tokio::test]
async fn test_login_failed_with_wrong_password() {
    let app = TestApp::new();
    fixtures::user(&app.store).await;

    let response = app
        .post_form(
            "/login",
            &[("login", "testuser"), ("password", "WrongPassword")],
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some("/login?error=credentials"));
    assert!(response.session_cookie().is_none());
}

#[tokio::test]
async fn test_login_failed_with_nonexistent_user() {
    let app = TestApp::new();

    let response = app
        .post_form(
            "/login",
            &[("login", "nobody"), ("password", "whatever123")],
            None,
        )
        .await;

    assert_eq!(response.location(), Some("/login?error=credentials"));
}

#[tokio::test]
async fn test_login_redirects_authenticated_user() {
    let app = TestApp::new();
    fixtures::user(&app.store).await;
    let cookie = app.login("testuser", fixtures::USER_PASSWORD).await;

    let response = app.get("/login", Some(&cookie)).await;

    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some("/"));
}

#[tokio::test]
async fn test_logout() {
    let app = TestApp::new();
    fixtures::user(&app.store).await;
    let cookie = app.login("testuser", fixtures::USER_PASSWORD).await;

    let response = app.get("/logout", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some("/login"));

    // The old cookie no longer identifies anyone.
    let response = app.get("/login", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    let response = app.get("/cart", Some(&cookie)).await;
    assert_eq!(response.location(), Some("/login"));
}

// ============================================================================
// Signup
// ============================================================================

#[tokio::test]
async fn test_signup_page_accessible() {
    let app = TestApp::new();

    let response = app.get("/signup", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains(r#"id="register-form""#));
}

#[tokio::test]
async fn test_signup_redirects_authenticated_user() {
    let app = TestApp::new();
    fixtures::user(&app.store).await;
    let cookie = app.login("testuser", fixtures::USER_PASSWORD).await;

    let response = app.get("/signup", Some(&cookie)).await;

    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some("/"));
}

#[tokio::test]
async fn test_signup_logs_in_and_creates_customer_on_first_cart() {
    let app = TestApp::new();

    let response = app
        .post_form(
            "/signup",
            &[
                ("username", "awa"),
                ("email", "awa@example.com"),
                ("password", "Secure@2024"),
                ("password_confirm", "Secure@2024"),
                ("first_name", "Awa"),
                ("last_name", "Koné"),
            ],
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some("/"));
    let cookie = response.session_cookie().expect("signup logs in");

    let user = AuthService::new(&app.store)
        .authenticate("awa", "Secure@2024")
        .await
        .unwrap();
    assert!(app.store.find_customer_by_user(user.id).await.unwrap().is_none());

    let cart = app.get("/cart", Some(&cookie)).await;
    assert_eq!(cart.status, StatusCode::OK);
    let customer = app.store.find_customer_by_user(user.id).await.unwrap();
    assert_eq!(customer.map(|c| c.user_id), Some(user.id));
}

#[tokio::test]
async fn test_signup_password_mismatch() {
    let app = TestApp::new();

    let response = app
        .post_form(
            "/signup",
            &[
                ("username", "awa"),
                ("email", "awa@example.com"),
                ("password", "Secure@2024"),
                ("password_confirm", "Different@2024"),
            ],
            None,
        )
        .await;

    assert_eq!(response.location(), Some("/signup?error=password_mismatch"));
}

#[tokio::test]
async fn test_signup_duplicate_username() {
    let app = TestApp::new();
    fixtures::user(&app.store).await;

    let response = app
        .post_form(
            "/signup",
            &[
                ("username", "testuser"),
                ("email", "other@example.com"),
                ("password", "Secure@2024"),
                ("password_confirm", "Secure@2024"),
            ],
            None,
        )
        .await;

    assert_eq!(response.location(), Some("/signup?error=user_exists"));
}

// ============================================================================
// Password Reset
// ============================================================================

#[tokio::test]
async fn test_forgot_password_page_accessible() {
    let app = TestApp::new();

    let response = app.get("/forgot-password", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains(r#"id="forgot-password-form""#));
}

#[tokio::test]
async fn test_forgot_password_same_answer_for_unknown_email() {
    let app = TestApp::new();
    let user = fixtures::user(&app.store).await;

    let known = app
        .post_form("/forgot-password", &[("email", "test@example.com")], None)
        .await;
    let unknown = app
        .post_form("/forgot-password", &[("email", "ghost@example.com")], None)
        .await;

    assert_eq!(known.location(), Some("/forgot-password?success=sent"));
    assert_eq!(unknown.location(), known.location());

    // Only the real account received a token; deleting returns how many existed.
    assert_eq!(app.store.delete_reset_tokens(user.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_password_reset_token_creation() {
    let app = TestApp::new();
    let user = fixtures::user(&app.store).await;

    let token = fixtures::password_reset_token(&app.store, &user).await;

    assert_eq!(token.user_id, user.id);
    assert_eq!(token.token.len(), PasswordResetToken::LENGTH);
    assert!(token.token.chars().all(|c| c.is_ascii_alphanumeric()));
    assert!(token.is_valid(Utc::now()));
}

#[tokio::test]
async fn test_password_reset_token_validity_window() {
    let app = TestApp::new();
    let user = fixtures::user(&app.store).await;
    let now = Utc::now();

    let recent = app
        .store
        .insert_reset_token_at(user.id, "recent", now - Duration::minutes(30))
        .await;
    let old = app
        .store
        .insert_reset_token_at(user.id, "old", now - Duration::hours(2))
        .await;

    assert!(recent.is_valid(now));
    assert!(!old.is_valid(now));

    let service = AuthService::new(&app.store);
    assert!(service.validate_reset_token("recent").await.is_ok());
    assert!(matches!(
        service.validate_reset_token("old").await,
        Err(AuthError::ExpiredToken)
    ));
}

#[tokio::test]
async fn test_reset_password_through_pages() {
    let app = TestApp::new();
    let user = fixtures::user(&app.store).await;
    let token = fixtures::password_reset_token(&app.store, &user).await;
    let path = format!("/reset-password/{}", token.token);

    let page = app.get(&path, None).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains(r#"id="reset-password-form""#));

    let response = app
        .post_form(
            &path,
            &[("password", "Nouveau@2024"), ("password_confirm", "Nouveau@2024")],
            None,
        )
        .await;
    assert_eq!(response.location(), Some("/login?success=password_reset"));

    // Old password is gone, the new one works, the token is spent.
    let service = AuthService::new(&app.store);
    assert!(service
        .authenticate("testuser", fixtures::USER_PASSWORD)
        .await
        .is_err());
    app.login("testuser", "Nouveau@2024").await;
    assert!(app.store.find_reset_token(&token.token).await.unwrap().is_none());

    let page = app.get(&path, None).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(!page.body.contains(r#"id="reset-password-form""#));
}

#[tokio::test]
async fn test_expired_reset_link_hides_form() {
    let app = TestApp::new();
    let user = fixtures::user(&app.store).await;
    app.store
        .insert_reset_token_at(user.id, "stale", Utc::now() - Duration::hours(2))
        .await;

    let page = app.get("/reset-password/stale", None).await;

    assert_eq!(page.status, StatusCode::OK);
    assert!(!page.body.contains(r#"id="reset-password-form""#));
    assert!(page.body.contains(r#"href="/forgot-password""#));
}
