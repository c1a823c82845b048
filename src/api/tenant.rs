//! Tenant proxy configuration endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use url::Url;

use crate::api::{ApiState, Route};
use crate::http::response::ApiError;
use crate::storage::{StorageError, TenantConfig};

pub fn routes() -> Vec<Route> {
    vec![
        Route::post("/v1/tenants", create_tenant),
        Route::get("/v1/tenants/{id}", get_tenant),
        Route::put("/v1/tenants/{id}", put_tenant),
        Route::delete("/v1/tenants/{id}", delete_tenant),
    ]
}

/// Reject configurations the checker could never act on.
pub fn validate_tenant(config: &TenantConfig) -> Result<(), ApiError> {
    if config.id.is_empty() {
        return Err(ApiError::bad_request("id must not be empty"));
    }
    if !config
        .id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::bad_request(format!(
            "id {:?} may only contain letters, digits, '-' and '_'",
            config.id
        )));
    }

    let url = Url::parse(&config.registry.url).map_err(|e| {
        ApiError::bad_request(format!("registry url {:?} is invalid: {e}", config.registry.url))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::bad_request(format!(
            "registry url scheme {:?} is not http or https",
            url.scheme()
        )));
    }
    Ok(())
}

pub async fn create_tenant(
    State(state): State<ApiState>,
    body: Result<Json<TenantConfig>, JsonRejection>,
) -> Result<(StatusCode, Json<TenantConfig>), ApiError> {
    let Json(config) = body?;
    validate_tenant(&config)?;

    state.proxy_config.create(config.clone())?;
    if let Err(e) = state.checker.register(&config.id) {
        // Keep rules and catalog in step.
        let _ = state.proxy_config.delete(&config.id);
        return Err(e.into());
    }

    tracing::info!(tenant = %config.id, "Tenant created");
    Ok((StatusCode::CREATED, Json(config)))
}

pub async fn get_tenant(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<TenantConfig>, ApiError> {
    Ok(Json(state.proxy_config.get(&id)?))
}

pub async fn put_tenant(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    body: Result<Json<TenantConfig>, JsonRejection>,
) -> Result<Json<TenantConfig>, ApiError> {
    let Json(config) = body?;
    if config.id != id {
        return Err(ApiError::bad_request(format!(
            "body id {:?} does not match path id {id:?}",
            config.id
        )));
    }
    validate_tenant(&config)?;

    state.proxy_config.set(config.clone())?;
    tracing::info!(tenant = %id, "Tenant updated");
    Ok(Json(config))
}

pub async fn delete_tenant(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.proxy_config.delete(&id)?;
    match state.checker.deregister(&id) {
        Ok(()) | Err(StorageError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    tracing::info!(tenant = %id, "Tenant deleted");
    Ok(StatusCode::NO_CONTENT)
}
