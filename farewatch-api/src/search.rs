use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use farewatch_search::SearchSnapshot;
use farewatch_shared::{FilterSpec, SearchContext};

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/search", post(submit_search))
        .route("/v1/filters", put(change_filters))
        .route("/v1/state", get(current_state))
}

/// POST /v1/search
/// Run a new search; a failing source is reported in the snapshot's `error`
async fn submit_search(
    State(state): State<AppState>,
    Json(context): Json<SearchContext>,
) -> Result<Json<SearchSnapshot>, AppError> {
    let snapshot = state.orchestrator.submit_search(context).await?;
    Ok(Json(snapshot))
}

/// PUT /v1/filters
/// Replace the filters of the current search
async fn change_filters(
    State(state): State<AppState>,
    Json(filters): Json<FilterSpec>,
) -> Result<Json<SearchSnapshot>, AppError> {
    let snapshot = state.orchestrator.change_filters(filters).await?;
    Ok(Json(snapshot))
}

/// GET /v1/state
async fn current_state(State(state): State<AppState>) -> Json<SearchSnapshot> {
    Json(state.orchestrator.snapshot().await)
}
