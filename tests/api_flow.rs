//! End-to-end flows through the assembled router, backed by the memory store.

use anyhow::{Result, anyhow};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        HeaderMap, Method, Request, StatusCode,
        header::{CONTENT_TYPE, COOKIE, ORIGIN, SET_COOKIE},
    },
};
use kuteeram::{
    api::{
        self, AppState,
        handlers::auth::{AuthConfig, AuthState},
        lifecycle::BookingLifecycle,
    },
    store::{MemoryStore, SharedStore},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tower::ServiceExt;

const ADMIN_EMAIL: &str = "admin@kuteeram.dev";
const FRONTEND: &str = "http://localhost:5173";

fn app() -> Result<Router> {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let config = AuthConfig::new(
        SecretString::from("integration-signing-secret".to_string()),
        ADMIN_EMAIL.to_string(),
    );
    let state = AppState {
        store: store.clone(),
        auth: Arc::new(AuthState::new(config)?),
        lifecycle: Arc::new(BookingLifecycle::new(store, Duration::from_secs(10))),
    };
    api::app(&state, FRONTEND)
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

impl Reply {
    /// `token=<value>` from the first `Set-Cookie`, ready for a `Cookie` header.
    fn session_cookie(&self) -> Result<String> {
        let raw = self
            .headers
            .get(SET_COOKIE)
            .ok_or_else(|| anyhow!("no Set-Cookie header"))?
            .to_str()?;
        let pair = raw.split(';').next().unwrap_or_default().trim();
        Ok(pair.to_string())
    }

    fn str_at(&self, pointer: &str) -> Option<&str> {
        self.body.pointer(pointer).and_then(Value::as_str)
    }
}

async fn call(
    app: &Router,
    method: Method,
    path: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Result<Reply> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    Ok(Reply {
        status,
        headers,
        body,
    })
}

async fn register(app: &Router, name: &str, email: &str, password: &str) -> Result<Reply> {
    call(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": name, "email": email, "password": password })),
    )
    .await
}

async fn login(app: &Router, email: &str, password: &str) -> Result<Reply> {
    call(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

/// Register `email` and return the session cookie from the follow-up login.
async fn signed_in(app: &Router, email: &str) -> Result<String> {
    let reply = register(app, "Someone", email, "correct horse").await?;
    assert_eq!(reply.status, StatusCode::CREATED);
    let reply = login(app, email, "correct horse").await?;
    assert_eq!(reply.status, StatusCode::OK);
    reply.session_cookie()
}

async fn create_service(app: &Router, cookie: &str, title: &str) -> Result<Reply> {
    call(
        app,
        Method::POST,
        "/api/services",
        Some(cookie),
        Some(json!({ "title": title, "description": "Deep clean", "price": 49.5 })),
    )
    .await
}

#[tokio::test]
async fn register_login_validate_logout() -> Result<()> {
    let app = app()?;

    let reply = register(&app, "Alice", "alice@example.com", "s3cret").await?;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.str_at("/user/email"), Some("alice@example.com"));
    assert!(reply.body.pointer("/user/password").is_none());
    let cookie = reply.session_cookie()?;
    assert!(cookie.starts_with("token="));

    let reply = register(&app, "Alice again", "alice@example.com", "other").await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = login(&app, "alice@example.com", "wrong").await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.str_at("/error"), Some("Invalid credentials"));

    let reply = login(&app, "nobody@example.com", "s3cret").await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let reply = login(&app, "alice@example.com", "s3cret").await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.str_at("/user/role"), Some("user"));

    let reply = call(&app, Method::GET, "/api/auth/validate", Some(&cookie), None).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.str_at("/user/name"), Some("Alice"));

    let reply = call(&app, Method::GET, "/api/auth/validate", None, None).await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let reply = call(&app, Method::POST, "/api/auth/logout", None, None).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.str_at("/message"), Some("Logged out successfully"));
    let cleared = reply
        .headers
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert!(cleared.starts_with("token=;"));
    assert!(cleared.contains("Max-Age=0"));
    Ok(())
}

#[tokio::test]
async fn unknown_email_costs_as_much_as_a_wrong_password() -> Result<()> {
    let app = app()?;
    register(&app, "Frank", "frank@example.com", "s3cret").await?;

    let started = Instant::now();
    let reply = login(&app, "frank@example.com", "wrong").await?;
    let known = started.elapsed();
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let started = Instant::now();
    let reply = login(&app, "ghost@example.com", "wrong").await?;
    let unknown = started.elapsed();
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.str_at("/error"), Some("Invalid credentials"));

    // Both run one Argon2 verification; a skipped one is orders of magnitude faster.
    assert!(
        unknown * 10 >= known,
        "unknown email took {unknown:?}, wrong password took {known:?}"
    );
    Ok(())
}

#[tokio::test]
async fn registration_reports_every_problem() -> Result<()> {
    let app = app()?;
    let reply = register(&app, " ", "not-an-email", "").await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    let details = reply
        .body
        .get("details")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    assert_eq!(details, 3);
    Ok(())
}

#[tokio::test]
async fn only_the_administrator_creates_services() -> Result<()> {
    let app = app()?;

    let user_cookie = signed_in(&app, "bob@example.com").await?;
    let reply = create_service(&app, &user_cookie, "Cleaning").await?;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = call(
        &app,
        Method::POST,
        "/api/services",
        None,
        Some(json!({ "title": "Cleaning", "description": "Deep clean", "price": 10 })),
    )
    .await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    // Registering with the administrator email and logging in grants the role.
    register(&app, "Admin", ADMIN_EMAIL, "admin-pass").await?;
    let reply = login(&app, ADMIN_EMAIL, "admin-pass").await?;
    assert_eq!(reply.str_at("/user/role"), Some("admin"));
    let admin_cookie = reply.session_cookie()?;

    let reply = create_service(&app, &admin_cookie, "Cleaning").await?;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.str_at("/title"), Some("Cleaning"));

    let reply = call(
        &app,
        Method::POST,
        "/api/services",
        Some(&admin_cookie),
        Some(json!({ "title": "Free", "description": "x", "price": -1 })),
    )
    .await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = call(&app, Method::GET, "/api/services", None, None).await?;
    assert_eq!(reply.status, StatusCode::OK);
    let services = reply.body.as_array().cloned().unwrap_or_default();
    assert_eq!(services.len(), 1);
    assert_eq!(
        services[0].pointer("/createdBy/email").and_then(Value::as_str),
        Some(ADMIN_EMAIL)
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn bookings_complete_after_the_delay() -> Result<()> {
    let app = app()?;

    register(&app, "Admin", ADMIN_EMAIL, "admin-pass").await?;
    let admin_cookie = login(&app, ADMIN_EMAIL, "admin-pass").await?.session_cookie()?;
    let service = create_service(&app, &admin_cookie, "Plumbing").await?;
    let service_id = service
        .str_at("/id")
        .ok_or_else(|| anyhow!("service has no id"))?
        .to_string();

    let cookie = signed_in(&app, "carol@example.com").await?;

    let reply = call(
        &app,
        Method::POST,
        "/api/bookings",
        Some(&cookie),
        Some(json!({ "serviceId": service_id })),
    )
    .await?;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.str_at("/status"), Some("pending"));
    assert_eq!(reply.str_at("/service/title"), Some("Plumbing"));
    assert_eq!(reply.str_at("/user/email"), Some("carol@example.com"));

    let reply = call(&app, Method::GET, "/api/bookings", Some(&cookie), None).await?;
    assert_eq!(reply.str_at("/0/status"), Some("pending"));

    tokio::time::sleep(Duration::from_secs(11)).await;

    let reply = call(&app, Method::GET, "/api/bookings", Some(&cookie), None).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.str_at("/0/status"), Some("completed"));

    // Other users do not see carol's booking.
    let other = signed_in(&app, "dave@example.com").await?;
    let reply = call(&app, Method::GET, "/api/bookings", Some(&other), None).await?;
    assert_eq!(reply.body, json!([]));
    Ok(())
}

#[tokio::test]
async fn bookings_reject_bad_service_ids() -> Result<()> {
    let app = app()?;
    let cookie = signed_in(&app, "erin@example.com").await?;

    for payload in [
        json!({}),
        json!({ "serviceId": "not-a-uuid" }),
        json!({ "serviceId": "6f1c9c2e-9a43-4b5e-8f51-0d6a2d1f7a10" }),
    ] {
        let reply = call(&app, Method::POST, "/api/bookings", Some(&cookie), Some(payload)).await?;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    }
    Ok(())
}

#[tokio::test]
async fn root_health_and_request_id() -> Result<()> {
    let app = app()?;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    assert!(String::from_utf8_lossy(&bytes).ends_with("is running"));

    let reply = call(&app, Method::GET, "/health", None, None).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.headers.contains_key("x-request-id"));
    assert!(reply.headers.contains_key("x-app"));
    Ok(())
}

#[tokio::test]
async fn cors_allows_the_frontend_with_credentials() -> Result<()> {
    let app = app()?;
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/auth/login")
        .header(ORIGIN, FRONTEND)
        .header("access-control-request-method", "POST")
        .body(Body::empty())?;
    let response = app.oneshot(request).await?;
    let headers = response.headers();
    assert_eq!(
        headers
            .get("access-control-allow-origin")
            .and_then(|value| value.to_str().ok()),
        Some(FRONTEND)
    );
    assert_eq!(
        headers
            .get("access-control-allow-credentials")
            .and_then(|value| value.to_str().ok()),
        Some("true")
    );
    Ok(())
}
