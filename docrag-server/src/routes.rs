//! HTTP surface: health endpoints and the two event handlers.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use docrag_core::{CollectionStats, QueryAnswer, RagError, UpsertReceipt};
use docrag_runner::{Admission, StepContext};

use crate::functions::{self, IngestPdfEvent, QueryPdfEvent};
use crate::state::AppState;

/// A pipeline failure crossing the HTTP boundary. The body is the stable
/// wire form of [`RagError`]; internal chains stay in the logs.
struct ApiError(RagError);

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(kind = self.0.kind(), error = %self.0, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self.0.wire())).into_response()
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/health/ready", get(ready))
        .route("/health/live", get(live))
        .route("/events/ingest_pdf", post(ingest_pdf))
        .route("/events/query_pdf", post(query_pdf))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn index(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "app": state.settings.app_name,
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/health",
    }))
}

/// Overall service health. Reports degraded (503) when the vector store is
/// unreachable, with per-component detail in the body.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let store_healthy = state.store.health_check().await;
    let stats = if store_healthy {
        state.store.collection_info().await
    } else {
        CollectionStats::unavailable(&state.settings.qdrant_collection, "health check failed")
    };

    let mut components = serde_json::Map::new();
    components.insert(
        state.store.backend().to_owned(),
        json!({
            "status": if store_healthy { "healthy" } else { "unhealthy" },
            "info": stats,
        }),
    );

    let code = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = Json(json!({
        "status": if store_healthy { "healthy" } else { "degraded" },
        "environment": state.settings.app_env,
        "components": components,
    }));
    (code, body)
}

async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    if state.store.health_check().await {
        (StatusCode::OK, Json(json!({"ready": true})))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"ready": false})))
    }
}

async fn live() -> impl IntoResponse {
    Json(json!({"alive": true}))
}

async fn ingest_pdf(
    State(state): State<AppState>,
    Json(event): Json<IngestPdfEvent>,
) -> Result<Json<UpsertReceipt>, Response> {
    let admission = state.ingest_gate.admit(event.admission_key()).await;
    if let Some(response) = rejection(&admission) {
        return Err(response);
    }

    let ctx = new_invocation(&state);
    info!(
        invocation_id = %ctx.invocation_id(),
        source = event.admission_key(),
        "ingest_pdf accepted"
    );
    let receipt = functions::run_ingest_pdf(&ctx, &state, &event)
        .await
        .map_err(|err| ApiError(err).into_response())?;
    Ok(Json(receipt))
}

async fn query_pdf(
    State(state): State<AppState>,
    Json(event): Json<QueryPdfEvent>,
) -> Result<Json<QueryAnswer>, ApiError> {
    let ctx = new_invocation(&state);
    info!(invocation_id = %ctx.invocation_id(), "query_pdf accepted");
    let answer = functions::run_query_pdf(&ctx, &state, &event).await?;
    Ok(Json(answer))
}

fn new_invocation(state: &AppState) -> StepContext {
    StepContext::new(Uuid::new_v4().to_string(), Arc::clone(&state.ledger))
}

/// 429 body for an ingestion the gate turned away, or `None` when the
/// invocation may start. Mirrors the error wire shape so clients parse one
/// format.
fn rejection(admission: &Admission) -> Option<Response> {
    let (kind, message, retry_after) = match admission {
        Admission::Granted => return None,
        Admission::Throttled { retry_after } => (
            "throttled",
            "too many ingestions started in the current window",
            retry_after,
        ),
        Admission::RateLimited { retry_after } => (
            "rate_limited",
            "this source already started an ingestion recently",
            retry_after,
        ),
    };
    let body = Json(json!({
        "kind": kind,
        "message": message,
        "details": {"retry_after_secs": retry_after.as_secs()},
    }));
    Some((StatusCode::TOO_MANY_REQUESTS, body).into_response())
}
