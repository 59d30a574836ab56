use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dataset_sdk::DataRequest;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::metrics;
use crate::seed;
use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
}

#[derive(Deserialize)]
struct InitParams {
    #[serde(default)]
    force: bool,
}

#[derive(Serialize)]
struct InitResponse {
    message: String,
}

async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.uptime_secs(),
    })
}

async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather(),
    )
}

async fn data(State(state): State<AppState>, Json(request): Json<DataRequest>) -> Response {
    match state.dataset().query(&request).await {
        Ok(page) => {
            metrics::DATA_REQUESTS.with_label_values(&["ok"]).inc();
            metrics::ROWS_SERVED.inc_by(page.data.len() as u64);
            info!(
                offset = request.offset,
                limit = request.limit,
                filters = request.filters.len(),
                sorts = request.sorts.len(),
                returned = page.data.len(),
                total = page.total,
                "page served"
            );
            Json(page).into_response()
        }
        Err(err) => {
            metrics::DATA_REQUESTS.with_label_values(&["rejected"]).inc();
            warn!(error = %err, offset = request.offset, "rejected data request");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "detail": err.to_string() })),
            )
                .into_response()
        }
    }
}

async fn init_db(
    State(state): State<AppState>,
    Query(params): Query<InitParams>,
) -> Json<InitResponse> {
    let dataset = state.dataset();
    if !params.force && !dataset.is_empty().await {
        metrics::SEED_RUNS.with_label_values(&["skipped"]).inc();
        return Json(InitResponse {
            message: "dataset already initialised".into(),
        });
    }
    let count = state.seed_records();
    let records = seed::generate_records(count, &mut rand::thread_rng());
    dataset.replace_records(records).await;
    metrics::SEED_RUNS.with_label_values(&["seeded"]).inc();
    info!(count, force = params.force, "dataset seeded");
    Json(InitResponse {
        message: format!("dataset initialised with {count} records"),
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_handler))
        .route("/data", post(data))
        .route("/init_db", post(init_db))
        .with_state(state)
}
