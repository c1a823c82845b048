use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;

use crate::api::{ApiState, Route};
use crate::http::response::ApiError;

pub fn routes() -> Vec<Route> {
    vec![Route::get("/v1/tenants/{id}/nginx", tenant_nginx)]
}

/// Render the tenant's sidecar configuration.
pub async fn tenant_nginx(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rendered = Vec::new();
    state.generator.generate(&mut rendered, &id)?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], rendered))
}
