//! Manual reconciliation trigger.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::{ApiState, Route};
use crate::checker::ConsistencyCheck;
use crate::http::response::ApiError;

#[derive(Debug, Serialize)]
pub struct PollOutcome {
    pub status: &'static str,
}

pub fn routes() -> Vec<Route> {
    vec![Route::post("/v1/poll", poll)]
}

/// Run one consistency pass over every tenant.
pub async fn poll(State(state): State<ApiState>) -> Result<Json<PollOutcome>, ApiError> {
    state.checker.check(None).await?;
    Ok(Json(PollOutcome { status: "ok" }))
}
