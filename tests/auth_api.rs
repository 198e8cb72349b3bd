//! Auth API tests.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot()` over an
//! in-memory user store.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use scalewatch::auth::{AuthState, InMemoryUserStore, TokenSigner, create_router};
use scalewatch::config::AuthConfig;

const SECRET: &str = "test-secret";

fn make_app() -> Router {
    let config = AuthConfig::new(SECRET);
    create_router(AuthState::new(Arc::new(InMemoryUserStore::new()), &config))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp: Response = app.clone().oneshot(req).await.expect("router returned error");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("response is not valid JSON")
    };
    (status, json)
}

fn json_req(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn me_req(authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri("/api/auth/me");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

async fn signup(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        json_req(
            "/api/auth/signup",
            json!({ "email": email, "password": password }),
        ),
    )
    .await
}

// ---------------------------------------------------------------------------
// signup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn signup_creates_account_and_returns_token() {
    let app = make_app();

    let (status, body) = signup(&app, "ops@example.com", "hunter22").await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["token"].as_str().is_some_and(|t| t.split('.').count() == 3));
    assert_eq!(body["user"]["email"], "ops@example.com");
    assert!(body["user"]["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn signup_rejects_duplicate_email() {
    let app = make_app();
    let (first, _) = signup(&app, "ops@example.com", "hunter22").await;
    assert_eq!(first, StatusCode::CREATED);

    let (status, body) = signup(&app, "ops@example.com", "other-password").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "error": "Email already in use" }));
}

#[tokio::test]
async fn signup_requires_email_and_password() {
    let app = make_app();

    for body in [
        json!({}),
        json!({ "email": "ops@example.com" }),
        json!({ "password": "hunter22" }),
        json!({ "email": "", "password": "hunter22" }),
    ] {
        let (status, resp) = send(&app, json_req("/api/auth/signup", body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(resp, json!({ "error": "Email and password are required" }));
    }
}

#[tokio::test]
async fn signup_with_unparseable_body_is_a_bad_request() {
    let app = make_app();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email and password are required");
}

// ---------------------------------------------------------------------------
// signin
// ---------------------------------------------------------------------------

#[tokio::test]
async fn signin_with_correct_password_returns_token() {
    let app = make_app();
    let (_, created) = signup(&app, "ops@example.com", "hunter22").await;

    let (status, body) = send(
        &app,
        json_req(
            "/api/auth/signin",
            json!({ "email": "ops@example.com", "password": "hunter22" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], created["user"]["id"]);
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn signin_failures_do_not_reveal_which_part_was_wrong() {
    let app = make_app();
    signup(&app, "ops@example.com", "hunter22").await;

    for (email, password) in [
        ("ops@example.com", "wrong"),
        ("nobody@example.com", "hunter22"),
    ] {
        let (status, body) = send(
            &app,
            json_req(
                "/api/auth/signin",
                json!({ "email": email, "password": password }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{email}");
        assert_eq!(body, json!({ "error": "Invalid credentials" }));
    }
}

// ---------------------------------------------------------------------------
// me
// ---------------------------------------------------------------------------

#[tokio::test]
async fn me_returns_user_for_valid_token() {
    let app = make_app();
    let (_, created) = signup(&app, "ops@example.com", "hunter22").await;
    let token = created["token"].as_str().unwrap();

    let (status, body) = send(&app, me_req(Some(&format!("Bearer {token}")))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "ops@example.com");
    assert_eq!(body["user"]["id"], created["user"]["id"]);
}

#[tokio::test]
async fn me_without_bearer_token_is_unauthorized() {
    let app = make_app();

    for header in [None, Some("Basic abc"), Some("Bearer ")] {
        let (status, body) = send(&app, me_req(header)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{header:?}");
        assert_eq!(body, json!({ "error": "Missing token" }));
    }
}

#[tokio::test]
async fn me_rejects_forged_and_expired_tokens() {
    let app = make_app();
    let (_, created) = signup(&app, "ops@example.com", "hunter22").await;
    let id = created["user"]["id"].as_str().unwrap();

    let forged = TokenSigner::new(b"another-secret", Duration::from_secs(60))
        .issue(id, "ops@example.com")
        .unwrap();
    let expired = TokenSigner::new(SECRET.as_bytes(), Duration::from_secs(60))
        .issue_at(id, "ops@example.com", 1_000)
        .unwrap();

    for token in ["garbage", forged.as_str(), expired.as_str()] {
        let (status, body) = send(&app, me_req(Some(&format!("Bearer {token}")))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Invalid token" }));
    }
}

#[tokio::test]
async fn me_with_token_for_unknown_user_is_unauthorized() {
    let app = make_app();
    let token = TokenSigner::new(SECRET.as_bytes(), Duration::from_secs(60))
        .issue("missing-user", "ghost@example.com")
        .unwrap();

    let (status, body) = send(&app, me_req(Some(&format!("Bearer {token}")))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "User not found" }));
}

// ---------------------------------------------------------------------------
// health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_ok() {
    let app = make_app();
    let req = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
}
