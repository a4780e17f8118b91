//! End-to-end flows through the full router, guards included.

use anyhow::{Context, Result};
use axum::body::{to_bytes, Body};
use axum::http::{
    header::{CONTENT_TYPE, COOKIE, HOST, ORIGIN, SET_COOKIE},
    Request, Response, StatusCode,
};
use axum::Router;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use gatehouse::api::{self, AuthConfig, AuthState, Mailer};
use gatehouse::store::MemoryStore;

const COOKIE_NAME: &str = "gatehouse_session";

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<String>>,
}

impl Mailer for RecordingMailer {
    fn send(&self, _recipient: &str, _subject: &str, body: &str) -> Result<()> {
        self.sent.lock().expect("lock").push(body.to_string());
        Ok(())
    }
}

impl RecordingMailer {
    fn last_code(&self) -> Option<String> {
        let sent = self.sent.lock().expect("lock");
        let body = sent.last()?;
        let line = body.lines().find(|line| line.contains(':'))?;
        Some(line.rsplit(':').next()?.trim().to_string())
    }
}

struct App {
    router: Router,
    store: Arc<MemoryStore>,
    mailer: Arc<RecordingMailer>,
}

fn app() -> App {
    app_with_config(AuthConfig::new())
}

fn app_with_config(config: AuthConfig) -> App {
    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(RecordingMailer::default());
    let state = Arc::new(AuthState::new(config, store.clone(), mailer.clone()));
    App {
        router: api::router(state),
        store,
        mailer,
    }
}

fn post_json(path: &str, body: serde_json::Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(HOST, "app.test")
        .header(ORIGIN, "http://app.test")
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = cookie {
        builder = builder.header(COOKIE, format!("{COOKIE_NAME}={token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("GET")
        .uri(path)
        .header(HOST, "app.test");
    if let Some(token) = cookie {
        builder = builder.header(COOKIE, format!("{COOKIE_NAME}={token}"));
    }
    builder.body(Body::empty()).expect("request")
}

fn session_token(response: &Response<Body>) -> Option<String> {
    let value = response.headers().get(SET_COOKIE)?.to_str().ok()?;
    let rest = value.strip_prefix(&format!("{COOKIE_NAME}="))?;
    let token = rest.split(';').next()?.to_string();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

async fn body_string(response: Response<Body>) -> Result<String> {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .context("failed to read body")?;
    Ok(String::from_utf8_lossy(&bytes).to_string())
}

#[tokio::test]
async fn signup_session_logout_flow() -> Result<()> {
    let app = app();

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/v1/auth/signup",
            json!({"email": "a@b.com", "password": "hunter2!"}),
            None,
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let token = session_token(&response).context("no session cookie")?;
    assert_eq!(app.store.user_count(), 1);
    assert_eq!(app.store.session_count(), 1);

    // The cookie resolves to a session.
    let response = app
        .router
        .clone()
        .oneshot(get("/v1/auth/session", Some(&token)))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await?;
    assert!(body.contains("a@b.com"));
    assert!(body.contains("\"email_verified\":false"));

    // No cookie means no session, not an error.
    let response = app
        .router
        .clone()
        .oneshot(get("/v1/auth/session", None))
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Logout deletes the session and clears the cookie.
    let response = app
        .router
        .clone()
        .oneshot(post_json("/v1/auth/logout", json!({}), Some(&token)))
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .context("no clearing cookie")?;
    assert!(cookie.contains("Max-Age=0"));
    assert_eq!(app.store.session_count(), 0);
    Ok(())
}

#[tokio::test]
async fn login_failures_share_status_and_body() -> Result<()> {
    let app = app();
    app.router
        .clone()
        .oneshot(post_json(
            "/v1/auth/signup",
            json!({"email": "a@b.com", "password": "hunter2!"}),
            None,
        ))
        .await?;

    let wrong_password = app
        .router
        .clone()
        .oneshot(post_json(
            "/v1/auth/login",
            json!({"email": "a@b.com", "password": "nope"}),
            None,
        ))
        .await?;
    let unknown_email = app
        .router
        .clone()
        .oneshot(post_json(
            "/v1/auth/login",
            json!({"email": "nobody@b.com", "password": "hunter2!"}),
            None,
        ))
        .await?;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), wrong_password.status());
    assert_eq!(
        body_string(wrong_password).await?,
        body_string(unknown_email).await?
    );
    Ok(())
}

#[tokio::test]
async fn verify_email_flow_rotates_the_session() -> Result<()> {
    let app = app();
    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/v1/auth/signup",
            json!({"email": "a@b.com", "password": "hunter2!"}),
            None,
        ))
        .await?;
    let old_token = session_token(&response).context("no session cookie")?;
    let code = app.mailer.last_code().context("no email delivered")?;
    assert_eq!(code.len(), 8);

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/v1/auth/verify-email",
            json!({"code": code}),
            Some(&old_token),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let new_token = session_token(&response).context("no fresh cookie")?;
    assert_ne!(new_token, old_token);
    let body = body_string(response).await?;
    assert!(body.contains("\"email_verified\":true"));

    // The old cookie is dead; presenting it gets a clearing Set-Cookie.
    let response = app
        .router
        .clone()
        .oneshot(get("/v1/auth/session", Some(&old_token)))
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .context("no clearing cookie")?;
    assert!(cookie.contains("Max-Age=0"));

    // Replaying the code fails: it was burned on first use.
    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/v1/auth/verify-email",
            json!({"code": code}),
            Some(&new_token),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn cross_origin_posts_are_rejected() -> Result<()> {
    let app = app();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/auth/signup")
        .header(HOST, "app.test")
        .header(ORIGIN, "http://evil.test")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"email": "a@b.com", "password": "x"}).to_string(),
        ))?;
    let response = app.router.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // A POST without any Origin is rejected too.
    let request = Request::builder()
        .method("POST")
        .uri("/v1/auth/signup")
        .header(HOST, "app.test")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"email": "a@b.com", "password": "x"}).to_string(),
        ))?;
    let response = app.router.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.store.user_count(), 0);

    // GET is exempt from the origin check.
    let response = app.router.clone().oneshot(get("/health", None)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn configured_allowed_host_passes_origin_check() -> Result<()> {
    let app = app_with_config(
        AuthConfig::new().with_allowed_hosts(vec!["front.test".to_string()]),
    );

    let request = Request::builder()
        .method("POST")
        .uri("/v1/auth/signup")
        .header(HOST, "api.test")
        .header(ORIGIN, "https://front.test")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"email": "a@b.com", "password": "hunter2!"}).to_string(),
        ))?;
    let response = app.router.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn service_routes_respond() -> Result<()> {
    let app = app();

    let response = app.router.clone().oneshot(get("/", None)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await?;
    assert!(body.starts_with("gatehouse"));

    let response = app
        .router
        .clone()
        .oneshot(get("/openapi.json", None))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await?;
    let spec: serde_json::Value = serde_json::from_str(&body)?;
    assert!(spec["paths"]["/v1/auth/signup"].is_object());
    Ok(())
}
