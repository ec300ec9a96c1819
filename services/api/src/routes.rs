use crate::infra::{AppState, Services};
use axum::http::{header, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;
use std::sync::Arc;
use valuation_desk::api::authenticate;
use valuation_desk::identity::{identity_router, TokenTable, UserId};
use valuation_desk::reports::report_router;
use valuation_desk::sketches::sketch_router;
use valuation_desk::statistics::statistics_router;
use valuation_desk::store::MemoryStore;
use valuation_desk::transfers::transfer_router;
use valuation_desk::valuations::valuation_router;

/// Every component router behind bearer-token authentication.
pub(crate) fn api_routes(services: &Services, tokens: Vec<(String, UserId)>) -> Router {
    let provider = Arc::new(TokenTable::new(tokens, services.identity.clone()));

    identity_router(services.identity.clone())
        .merge(valuation_router(services.valuations.clone()))
        .merge(transfer_router(services.transfers.clone()))
        .merge(sketch_router(services.sketches.clone()))
        .merge(report_router(services.reports.clone()))
        .merge(statistics_router(services.statistics.clone()))
        .layer(from_fn_with_state(
            provider,
            authenticate::<TokenTable<MemoryStore>>,
        ))
}

/// Health, readiness, and metrics endpoints; these stay reachable without a token.
pub(crate) fn with_operational_routes(api: Router, state: AppState) -> Router {
    api.route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .layer(Extension(state))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
