//! HTTP tests for registration, login, logout and profile
//!
//! Each test runs the full route table against in-memory stores.

mod common;

use actix_web::http::StatusCode;
use actix_web::{test, App};
use blog_service::models::Role;
use chrono::{Duration, Utc};
use common::{bearer, send, TestContext, PASSWORD};
use serde_json::json;

fn register_body(username: &str, email: &str) -> serde_json::Value {
    json!({
        "username": username,
        "email": email,
        "password": PASSWORD,
        "password_confirmation": PASSWORD,
    })
}

// ============================================================================
// Full session lifecycle
// ============================================================================

#[actix_web::test]
async fn test_register_profile_logout_cycle() {
    let ctx = TestContext::new();
    let app = test::init_service(App::new().configure(|cfg| ctx.state.configure(cfg))).await;

    // Register
    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(register_body("octocat1", "octocat1@example.com"))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["username"], "octocat1");
    assert!(body["data"].get("password_hash").is_none());
    let token = body["token"].as_str().expect("token").to_string();

    // Profile
    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header(bearer(&token))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "writer");
    assert_eq!(body["data"]["email"], "octocat1@example.com");

    // Logout
    let req = test::TestRequest::post()
        .uri("/api/logout")
        .insert_header(bearer(&token))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!ctx.revocations.is_empty().await);

    // Same token is now revoked
    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header(bearer(&token))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "error");
    assert_eq!(body["code"], 401);
}

#[actix_web::test]
async fn test_login_issues_working_token() {
    let ctx = TestContext::new();
    ctx.seed_user("octocat1", Role::Writer).await;
    let app = test::init_service(App::new().configure(|cfg| ctx.state.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({ "username": " OctoCat1", "password": PASSWORD }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().expect("token");

    let claims = ctx.jwt.validate(token).expect("valid token");
    assert_eq!(claims.sub, "octocat1");
    assert_eq!(claims.role, "writer");

    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header(bearer(token))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// Credential failures
// ============================================================================

#[actix_web::test]
async fn test_wrong_password_matches_unknown_user() {
    let ctx = TestContext::new();
    ctx.seed_user("octocat1", Role::Writer).await;
    let app = test::init_service(App::new().configure(|cfg| ctx.state.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({ "username": "octocat1", "password": "WrongPass1!" }))
        .to_request();
    let (wrong_status, wrong_body) = send(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({ "username": "nobody_here", "password": PASSWORD }))
        .to_request();
    let (unknown_status, unknown_body) = send(&app, req).await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body["message"], "authentication failed");
    assert_eq!(wrong_body, unknown_body);
}

#[actix_web::test]
async fn test_soft_deleted_user_cannot_login() {
    let ctx = TestContext::new();
    let user = ctx.seed_user("octocat1", Role::Writer).await;
    blog_service::db::UserRepository::soft_delete(ctx.repository.as_ref(), user.id)
        .await
        .unwrap();
    let app = test::init_service(App::new().configure(|cfg| ctx.state.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({ "username": "octocat1", "password": PASSWORD }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "authentication failed");
}

// ============================================================================
// Registration rules
// ============================================================================

#[actix_web::test]
async fn test_duplicate_after_normalization_conflicts() {
    let ctx = TestContext::new();
    let app = test::init_service(App::new().configure(|cfg| ctx.state.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(register_body("Alice ", "alice@example.com"))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["username"], "alice");

    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(register_body("alice", "someone.else@example.com"))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 409);

    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(register_body("alice_two", " ALICE@example.com"))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_register_validation_errors() {
    let ctx = TestContext::new();
    let app = test::init_service(App::new().configure(|cfg| ctx.state.configure(cfg))).await;

    let cases = [
        json!({ "username": "ok_name", "email": "not-an-email", "password": PASSWORD, "password_confirmation": PASSWORD }),
        json!({ "username": "ok_name", "email": "a@example.com", "password": "short", "password_confirmation": "short" }),
        json!({ "username": "ok_name", "email": "a@example.com", "password": PASSWORD, "password_confirmation": "Different1!" }),
        json!({ "username": "x", "email": "a@example.com", "password": PASSWORD, "password_confirmation": PASSWORD }),
    ];

    for body in cases {
        let req = test::TestRequest::post()
            .uri("/api/register")
            .set_json(body.clone())
            .to_request();
        let (status, resp) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {} should be rejected", body);
        assert_eq!(resp["status"], "error");
    }
}

#[actix_web::test]
async fn test_malformed_json_uses_error_envelope() {
    let ctx = TestContext::new();
    let app = test::init_service(App::new().configure(|cfg| ctx.state.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/api/login")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

// ============================================================================
// Token handling at the middleware
// ============================================================================

#[actix_web::test]
async fn test_missing_or_malformed_header_is_rejected() {
    let ctx = TestContext::new();
    let app = test::init_service(App::new().configure(|cfg| ctx.state.configure(cfg))).await;

    let req = test::TestRequest::get().uri("/api/profile").to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    for value in ["Bearer", "justonetoken", "Bearer "] {
        let req = test::TestRequest::get()
            .uri("/api/profile")
            .insert_header(("Authorization", value))
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "header {:?}", value);
        assert_eq!(body["code"], 401);
    }
}

#[actix_web::test]
async fn test_expired_and_forged_tokens_are_rejected() {
    let ctx = TestContext::new();
    let user = ctx.seed_user("octocat1", Role::Writer).await;
    let app = test::init_service(App::new().configure(|cfg| ctx.state.configure(cfg))).await;

    let expired = ctx
        .jwt
        .issue_at(&user.username, &user.role, Utc::now() - Duration::hours(25))
        .unwrap();
    let forged = crypto_core::jwt::JwtKeys::new(&"x".repeat(32), Duration::hours(1))
        .unwrap()
        .issue(&user.username, "admin")
        .unwrap();

    for token in [expired, forged, "garbage.token.value".to_string()] {
        let req = test::TestRequest::get()
            .uri("/api/profile")
            .insert_header(bearer(&token))
            .to_request();
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[actix_web::test]
async fn test_revoked_token_rejected_on_every_route() {
    let ctx = TestContext::new();
    let admin = ctx.seed_user("root_admin", Role::Admin).await;
    let token = ctx.token_for(&admin);
    let app = test::init_service(App::new().configure(|cfg| ctx.state.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/api/logout")
        .insert_header(bearer(&token))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    for uri in ["/api/profile", "/api/users"] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(bearer(&token))
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["message"], "Token revoked");
    }
}

#[actix_web::test]
async fn test_public_endpoints() {
    let ctx = TestContext::new();
    let app = test::init_service(App::new().configure(|cfg| ctx.state.configure(cfg))).await;

    let (status, body) = send(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, test::TestRequest::get().uri("/api/").to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let resp = test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
