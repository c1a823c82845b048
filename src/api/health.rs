use axum::Json;
use serde::Serialize;

use crate::api::Route;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

pub fn routes() -> Vec<Route> {
    vec![Route::get("/health", health)]
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
