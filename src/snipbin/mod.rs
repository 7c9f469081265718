//! HTTP server wiring: pool, templates, sessions, router and shutdown.

pub mod handlers;
pub mod middleware;
pub mod session;
pub mod templates;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use axum::{
    extract::{MatchedPath, Request},
    http::{
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
            X_XSS_PROTECTION,
        },
        HeaderName, HeaderValue,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Extension, Router,
};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer,
    services::ServeDir,
    set_header::{SetRequestHeaderLayer, SetResponseHeaderLayer},
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

use crate::snipbin::middleware::{load_session, require_authentication};
use crate::snipbin::session::SessionStore;
use crate::snipbin::templates::{TemplateEngine, TEMPLATE_GLOB};

const X_REQUEST_ID: &str = "x-request-id";

/// Connect to the database, parse templates and serve until interrupted.
pub async fn new(port: u16, dsn: String, session_ttl: chrono::Duration) -> Result<()> {
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(StdDuration::from_secs(120))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("failed to connect to the database")?;

    let engine = Arc::new(TemplateEngine::new(TEMPLATE_GLOB)?);
    let sessions = SessionStore::new(session_ttl);

    let app = router(pool, engine, sessions);

    let listener = tokio::net::TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

fn router(pool: PgPool, engine: Arc<TemplateEngine>, sessions: SessionStore) -> Router {
    let protected = Router::new()
        .route(
            "/snippet/create",
            get(handlers::snippet_create).post(handlers::snippet_create_post),
        )
        .route("/user/logout", post(handlers::logout))
        .route_layer(axum_middleware::from_fn(require_authentication));

    Router::new()
        .route("/", get(handlers::home))
        .route("/snippet/view/:id", get(handlers::snippet_view))
        .route(
            "/user/signup",
            get(handlers::signup).post(handlers::signup_post),
        )
        .route(
            "/user/login",
            get(handlers::login).post(handlers::login_post),
        )
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static(X_REQUEST_ID),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    X_REQUEST_ID,
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(SetResponseHeaderLayer::if_not_present(
                    CONTENT_SECURITY_POLICY,
                    HeaderValue::from_static(
                        "default-src 'self'; style-src 'self' fonts.googleapis.com; font-src fonts.gstatic.com",
                    ),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    REFERRER_POLICY,
                    HeaderValue::from_static("origin-when-cross-origin"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    X_FRAME_OPTIONS,
                    HeaderValue::from_static("deny"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    X_XSS_PROTECTION,
                    HeaderValue::from_static("0"),
                ))
                .layer(Extension(pool))
                .layer(Extension(engine))
                .layer(Extension(sessions))
                .layer(axum_middleware::from_fn(load_session)),
        )
        .route("/health", get(handlers::health))
        .nest_service("/static", ServeDir::new("ui/static"))
}

fn make_span(request: &Request) -> Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("none");

    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id,
    )
}

async fn shutdown_signal() {
    if let Ok(()) = signal::ctrl_c().await {
        info!("Gracefully shutdown");
    }
}
