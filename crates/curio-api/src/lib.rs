//! # curio-api
//!
//! HTTP surface for the curio collection service: item lists, editorial
//! lists and the activity feed.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use curio_core::AggregateKind;
use curio_db::{log_pool_metrics, Database};

pub use config::ServerConfig;
pub use error::ApiError;

// =============================================================================
// STATE
// =============================================================================

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the full application router with middleware.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_check))
        .nest(
            "/item-lists",
            handlers::lists::routes(AggregateKind::ItemList),
        )
        .nest(
            "/editorial-lists",
            handlers::lists::routes(AggregateKind::Editorial),
        )
        .route("/activity", get(handlers::activity::list_activity));

    if config.trust_actor_headers {
        router = router.layer(axum::middleware::from_fn(auth::trusted_actor_headers));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors_layer(config.allowed_origins.clone()))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .with_state(state)
}

/// CORS restricted to the configured origin list.
fn cors_layer(allowed_origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

// =============================================================================
// HEALTH CHECK
// =============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let pool = log_pool_metrics(state.db.pool());
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "pool": pool,
    }))
}
