//! Drives the account routes through the router with an in-memory user
//! store and a mailer that keeps every message.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use safar::{auth::TokenKeys, build_app, mailer::Mailer, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<(String, String)>>, // (to, body)
}

impl Outbox {
    fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn last_token(&self) -> String {
        let sent = self.sent.lock().unwrap();
        let (_, body) = sent.last().expect("a mail was sent");
        let start = body.find("token=").expect("link with token") + "token=".len();
        body[start..].split_whitespace().next().unwrap().to_string()
    }
}

#[async_trait]
impl Mailer for Outbox {
    async fn send_mail(&self, to: &str, _subject: &str, body: &str) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push((to.into(), body.into()));
        Ok(())
    }
}

fn setup() -> (Router, Arc<Outbox>, AppState) {
    let outbox = Arc::new(Outbox::default());
    let state = AppState::fake_with_mailer(outbox.clone());
    (build_app(state.clone()), outbox, state)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn register_and_verify(app: &Router, outbox: &Outbox, username: &str, email: &str, pw: &str) {
    let (status, _) = send(
        app,
        post_json(
            "/users/register",
            json!({ "username": username, "email": email, "password": pw }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(app, get(&format!("/users/verify?token={}", outbox.last_token()))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn register_verify_login_scenario() {
    let (app, outbox, _) = setup();

    let (status, body) = send(
        &app,
        post_json(
            "/users/register",
            json!({ "username": "alice", "email": "a@x.com", "password": "pw1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("Verification email sent"));
    {
        let sent = outbox.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "a@x.com");
        assert!(sent[0].1.contains("http://localhost:3000/verify?token="));
    }

    let token = outbox.last_token();
    let (status, _) = send(&app, get(&format!("/users/verify?token={}", token))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        post_json("/users/login", json!({ "email": "a@x.com", "password": "pw1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let session = body["token"].as_str().unwrap().to_string();
    assert!(!session.is_empty());

    let (status, body) = send(
        &app,
        post_json("/users/login", json!({ "email": "a@x.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid email or password");

    let me = Request::builder()
        .uri("/users/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", session))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, me).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "a@x.com");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn replayed_verification_link_is_rejected() {
    let (app, outbox, _) = setup();
    register_and_verify(&app, &outbox, "alice", "a@x.com", "pw1").await;

    let (status, body) = send(&app, get(&format!("/users/verify?token={}", outbox.last_token()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists");
}

#[tokio::test]
async fn register_with_taken_email_sends_nothing() {
    let (app, outbox, _) = setup();
    register_and_verify(&app, &outbox, "alice", "a@x.com", "pw1").await;
    let before = outbox.count();

    let (status, body) = send(
        &app,
        post_json(
            "/users/register",
            json!({ "username": "other", "email": "A@X.com ", "password": "pw" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists");
    assert_eq!(outbox.count(), before);
}

#[tokio::test]
async fn verify_with_bad_token_is_bad_request() {
    let (app, _, _) = setup();
    for uri in ["/users/verify?token=garbage", "/users/verify"] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid or expired token");
    }
}

#[tokio::test]
async fn unknown_email_login_matches_wrong_password() {
    let (app, outbox, _) = setup();
    register_and_verify(&app, &outbox, "alice", "a@x.com", "pw1").await;

    let wrong = send(
        &app,
        post_json("/users/login", json!({ "email": "a@x.com", "password": "nope" })),
    )
    .await;
    let unknown = send(
        &app,
        post_json("/users/login", json!({ "email": "who@x.com", "password": "pw1" })),
    )
    .await;
    assert_eq!(wrong, unknown);
}

#[tokio::test]
async fn forgot_and_reset_password() {
    let (app, outbox, _) = setup();
    register_and_verify(&app, &outbox, "alice", "a@x.com", "pw1").await;

    let (status, _) = send(
        &app,
        post_json("/users/forgot-password", json!({ "email": "nobody@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        post_json("/users/forgot-password", json!({ "email": "a@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let reset = outbox.last_token();

    let (status, _) = send(
        &app,
        post_json("/users/reset-password/not-a-token", json!({ "password": "pw2" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        post_json(&format!("/users/reset-password/{}", reset), json!({ "password": "pw2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password has been reset successfully!");

    let (status, _) = send(
        &app,
        post_json("/users/login", json!({ "email": "a@x.com", "password": "pw2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app,
        post_json("/users/login", json!({ "email": "a@x.com", "password": "pw1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_routes_require_a_session_token() {
    let (app, outbox, state) = setup();

    let (status, _) = send(&app, get("/travel")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // a registration token is not a session
    send(
        &app,
        post_json(
            "/users/register",
            json!({ "username": "bob", "email": "b@x.com", "password": "pw" }),
        ),
    )
    .await;
    let req = Request::builder()
        .uri("/users/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", outbox.last_token()))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // validation runs before the database is touched
    register_and_verify(&app, &outbox, "alice", "a@x.com", "pw1").await;
    let user = state.users.find_by_email("a@x.com").await.unwrap().unwrap();
    let session = TokenKeys::new(&state.config.jwt).issue_session(&user).unwrap();
    let req = Request::builder()
        .method("PUT")
        .uri(format!("/travelbookings/{}", uuid::Uuid::new_v4()))
        .header(header::AUTHORIZATION, format!("Bearer {}", session))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "bookingStatus": "" }).to_string()))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Booking status is required.");
}

#[tokio::test]
async fn malformed_bodies_get_a_json_bad_request() {
    let (app, outbox, _) = setup();
    for raw in ["{not json", r#"{"email":5,"password":"pw"}"#] {
        let req = Request::builder()
            .method("POST")
            .uri("/users/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(raw))
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {raw:?}");
        assert!(body["message"].is_string(), "body {raw:?}");
    }

    let (status, body) = send(
        &app,
        post_json("/users/register", json!({ "username": ["alice"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
    assert_eq!(outbox.count(), 0);
}

#[tokio::test]
async fn health_is_ok() {
    let (app, _, _) = setup();
    let resp = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
