mod errors;
mod handlers;
mod middleware;
mod state;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use errors::HttpError;
pub use state::HttpState;

pub fn router(state: HttpState) -> Router<()> {
    let ingest = Router::new()
        .route("/ingest/usage", post(handlers::ingest_usage))
        .route("/ingest/events", post(handlers::ingest_events))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_ingest_token,
        ));

    let api = Router::new()
        .route("/summary", post(handlers::summary))
        .route("/green_score", post(handlers::green_score))
        .route("/hotspots", post(handlers::hotspots))
        .route("/alerts", post(handlers::alerts))
        .route("/records", post(handlers::records))
        .route("/daily_rollup", post(handlers::daily_rollup))
        .route("/intensity_list", post(handlers::intensity_list))
        .route("/intensity_replace", post(handlers::intensity_replace))
        .route("/budgets_list", post(handlers::budgets_list))
        .route("/budgets_put", post(handlers::budgets_put))
        .route("/budgets_delete", post(handlers::budgets_delete))
        .route("/settings_get", post(handlers::settings_get))
        .merge(ingest);

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
