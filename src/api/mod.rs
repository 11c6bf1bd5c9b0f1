use crate::{
    api::{
        handlers::{auth, health, root},
        lifecycle::BookingLifecycle,
    },
    store::SharedStore,
};
use anyhow::{Context, Result, anyhow};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{
        HeaderName, HeaderValue, Method, Request,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, options},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Span, error, info, info_span};
use ulid::Ulid;
use url::Url;
use utoipa_axum::router::OpenApiRouter;

pub mod error;
pub mod handlers;
pub mod lifecycle;
// OpenAPI router wiring and route registration live in openapi.rs.
mod openapi;

pub use openapi::openapi;

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

pub const PRODUCTION_FRONTEND_ORIGIN: &str = "https://kuteeram-frontend.vercel.app";
pub const DEVELOPMENT_FRONTEND_ORIGIN: &str = "http://localhost:5173";

/// Shared handles every request needs.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub auth: Arc<auth::AuthState>,
    pub lifecycle: Arc<BookingLifecycle>,
}

/// Assemble the full application: documented routes, undocumented extras,
/// request-id propagation, tracing, CORS and the shared extensions.
///
/// # Errors
/// Returns an error if `frontend_url` is not a valid origin.
pub fn app(state: &AppState, frontend_url: &str) -> Result<Router> {
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(AllowOrigin::exact(frontend_origin(frontend_url)?))
        .allow_credentials(true);

    // Build the router from OpenAPI-wired routes, then extend it with non-doc routes like `/` and
    // preflight-only `OPTIONS /health`. The spec stays in openapi.rs for the `openapi` binary.
    let (router, _openapi) = router().split_for_parts();
    Ok(router
        .route("/", get(root::root))
        .route("/health", options(health::health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(state.auth.clone()))
                .layer(Extension(state.lifecycle.clone()))
                .layer(Extension(state.store.clone())),
        ))
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, state: AppState, frontend_url: &str) -> Result<()> {
    let app = app(&state, frontend_url)?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    state.lifecycle.shutdown();

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

/// Default CORS origin for `environment` when none is configured.
#[must_use]
pub const fn default_frontend_url(environment: auth::Environment) -> &'static str {
    match environment {
        auth::Environment::Production => PRODUCTION_FRONTEND_ORIGIN,
        auth::Environment::Development => DEVELOPMENT_FRONTEND_ORIGIN,
    }
}

fn frontend_origin(frontend_base_url: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(frontend_base_url)
        .with_context(|| format!("Invalid frontend base URL: {frontend_base_url}"))?;
    let host = parsed.host_str().ok_or_else(|| {
        anyhow!("Frontend base URL must include a valid host: {frontend_base_url}")
    })?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build frontend origin header")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontend_origin_strips_path_and_keeps_port() -> Result<()> {
        assert_eq!(
            frontend_origin("http://localhost:5173/app/")?,
            HeaderValue::from_static("http://localhost:5173")
        );
        assert_eq!(
            frontend_origin(PRODUCTION_FRONTEND_ORIGIN)?,
            HeaderValue::from_static("https://kuteeram-frontend.vercel.app")
        );
        Ok(())
    }

    #[test]
    fn frontend_origin_rejects_hostless_urls() {
        assert!(frontend_origin("not a url").is_err());
        assert!(frontend_origin("mailto:team@kuteeram.dev").is_err());
    }

    #[test]
    fn default_frontend_follows_environment() {
        assert_eq!(
            default_frontend_url(auth::Environment::Production),
            PRODUCTION_FRONTEND_ORIGIN
        );
        assert_eq!(
            default_frontend_url(auth::Environment::Development),
            DEVELOPMENT_FRONTEND_ORIGIN
        );
    }
}
