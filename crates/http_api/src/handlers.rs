use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;

use app_api::{
    AlertsRequest, AppContext, BudgetDeleteRequest, BudgetPutRequest, EmptyRequest,
    GreenScoreRequest, HotspotsRequest, IntensityReplaceRequest, OkResponse, RangeRequest,
    RecordsRequest,
};

use crate::{errors::HttpError, state::HttpState};

/// Runs a store-backed handler on the blocking pool; SQLite calls block.
async fn blocking<T, F>(state: HttpState, handler: F) -> Result<Json<T>, HttpError>
where
    T: Send + 'static,
    F: FnOnce(&AppContext) -> verdant_app::Result<T> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || handler(&state.context))
        .await
        .map_err(HttpError::task_failed)?;
    Ok(Json(result?))
}

pub async fn health(State(state): State<HttpState>) -> impl IntoResponse {
    match blocking(state, app_api::health).await {
        Ok(Json(response)) if response.ok => (StatusCode::OK, Json(response)),
        Ok(_) | Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(OkResponse { ok: false }),
        ),
    }
}

pub async fn ingest_usage(
    State(state): State<HttpState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, HttpError> {
    blocking(state, move |ctx| app_api::ingest_usage(ctx, body)).await
}

pub async fn ingest_events(
    State(state): State<HttpState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, HttpError> {
    blocking(state, move |ctx| app_api::ingest_events(ctx, body)).await
}

pub async fn summary(
    State(state): State<HttpState>,
    Json(req): Json<RangeRequest>,
) -> Result<impl IntoResponse, HttpError> {
    blocking(state, move |ctx| app_api::summary(ctx, req)).await
}

pub async fn green_score(
    State(state): State<HttpState>,
    Json(req): Json<GreenScoreRequest>,
) -> Result<impl IntoResponse, HttpError> {
    blocking(state, move |ctx| app_api::green_score(ctx, req)).await
}

pub async fn hotspots(
    State(state): State<HttpState>,
    Json(req): Json<HotspotsRequest>,
) -> Result<impl IntoResponse, HttpError> {
    blocking(state, move |ctx| app_api::hotspots(ctx, req)).await
}

pub async fn alerts(
    State(state): State<HttpState>,
    Json(req): Json<AlertsRequest>,
) -> Result<impl IntoResponse, HttpError> {
    blocking(state, move |ctx| app_api::alerts(ctx, req)).await
}

pub async fn records(
    State(state): State<HttpState>,
    Json(req): Json<RecordsRequest>,
) -> Result<impl IntoResponse, HttpError> {
    blocking(state, move |ctx| app_api::records(ctx, req)).await
}

pub async fn daily_rollup(
    State(state): State<HttpState>,
    Json(req): Json<RangeRequest>,
) -> Result<impl IntoResponse, HttpError> {
    blocking(state, move |ctx| app_api::daily_rollup(ctx, req)).await
}

pub async fn intensity_list(
    State(state): State<HttpState>,
    Json(_): Json<EmptyRequest>,
) -> Result<impl IntoResponse, HttpError> {
    blocking(state, app_api::intensity_list).await
}

pub async fn intensity_replace(
    State(state): State<HttpState>,
    Json(req): Json<IntensityReplaceRequest>,
) -> Result<impl IntoResponse, HttpError> {
    blocking(state, move |ctx| app_api::intensity_replace(ctx, req)).await
}

pub async fn budgets_list(
    State(state): State<HttpState>,
    Json(_): Json<EmptyRequest>,
) -> Result<impl IntoResponse, HttpError> {
    blocking(state, app_api::budgets_list).await
}

pub async fn budgets_put(
    State(state): State<HttpState>,
    Json(req): Json<BudgetPutRequest>,
) -> Result<impl IntoResponse, HttpError> {
    blocking(state, move |ctx| app_api::budgets_put(ctx, req)).await
}

pub async fn budgets_delete(
    State(state): State<HttpState>,
    Json(req): Json<BudgetDeleteRequest>,
) -> Result<impl IntoResponse, HttpError> {
    blocking(state, move |ctx| app_api::budgets_delete(ctx, req)).await
}

pub async fn settings_get(
    State(state): State<HttpState>,
    Json(_): Json<EmptyRequest>,
) -> Result<impl IntoResponse, HttpError> {
    blocking(state, app_api::settings_get).await
}
