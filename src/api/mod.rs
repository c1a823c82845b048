//! Controller HTTP API.
//!
//! # Data Flow
//! ```text
//! SetupHandler (Ready)
//!     → route table (health, poll, tenant, nginx)
//!     → metrics route layer (matched path, status, latency)
//!     → handler → checker / proxyconfig manager / generator
//! ```
//!
//! # Design Decisions
//! - Each area contributes a route list; the table is assembled once
//! - Conflicting or malformed routes fail bootstrap instead of panicking
//! - A panicking handler answers 500 with a JSON error body

pub mod health;
pub mod nginx;
pub mod poll;
pub mod tenant;

use std::any::Any;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{MatchedPath, Request, State};
use axum::handler::Handler;
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{self, MethodRouter};
use axum::Router;
use thiserror::Error;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;

use crate::checker::Checker;
use crate::http::response::ApiError;
use crate::nginx::Generator;
use crate::observability::metrics::Reporter;
use crate::proxyconfig::ProxyConfigManager;

/// Shared state injected into API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub checker: Arc<Checker>,
    pub generator: Arc<dyn Generator>,
    pub proxy_config: Arc<ProxyConfigManager>,
    pub reporter: Reporter,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    #[error("route {method} {path} is registered twice")]
    Duplicate { method: String, path: String },
    #[error("route path {0:?} must start with '/'")]
    InvalidPath(String),
}

/// One method + path binding.
pub struct Route {
    pub method: Method,
    pub path: &'static str,
    handler: MethodRouter<ApiState>,
}

impl Route {
    pub fn get<H, T>(path: &'static str, handler: H) -> Self
    where
        H: Handler<T, ApiState>,
        T: 'static,
    {
        Self::with(Method::GET, path, routing::get(handler))
    }

    pub fn post<H, T>(path: &'static str, handler: H) -> Self
    where
        H: Handler<T, ApiState>,
        T: 'static,
    {
        Self::with(Method::POST, path, routing::post(handler))
    }

    pub fn put<H, T>(path: &'static str, handler: H) -> Self
    where
        H: Handler<T, ApiState>,
        T: 'static,
    {
        Self::with(Method::PUT, path, routing::put(handler))
    }

    pub fn delete<H, T>(path: &'static str, handler: H) -> Self
    where
        H: Handler<T, ApiState>,
        T: 'static,
    {
        Self::with(Method::DELETE, path, routing::delete(handler))
    }

    fn with(method: Method, path: &'static str, handler: MethodRouter<ApiState>) -> Self {
        Self {
            method,
            path,
            handler,
        }
    }
}

/// Every route the controller serves.
pub fn routes() -> Vec<Route> {
    [health::routes(), poll::routes(), tenant::routes(), nginx::routes()]
        .into_iter()
        .flatten()
        .collect()
}

/// Build the API router from the standard route table.
pub fn build_router(state: ApiState, request_timeout: Duration) -> Result<Router, RouterError> {
    assemble(routes(), state, request_timeout)
}

/// Build a router from an explicit route list.
#[allow(deprecated)]
pub fn assemble(
    routes: impl IntoIterator<Item = Route>,
    state: ApiState,
    request_timeout: Duration,
) -> Result<Router, RouterError> {
    let mut seen = HashSet::new();
    let mut by_path: BTreeMap<&'static str, MethodRouter<ApiState>> = BTreeMap::new();

    for route in routes {
        if !route.path.starts_with('/') {
            return Err(RouterError::InvalidPath(route.path.to_string()));
        }
        if !seen.insert((route.method.clone(), route.path)) {
            return Err(RouterError::Duplicate {
                method: route.method.to_string(),
                path: route.path.to_string(),
            });
        }
        let handler = match by_path.remove(route.path) {
            Some(existing) => existing.merge(route.handler),
            None => route.handler,
        };
        by_path.insert(route.path, handler);
    }

    let mut router = Router::new();
    for (path, handler) in by_path {
        router = router.route(path, handler);
    }

    Ok(router
        .route_layer(middleware::from_fn_with_state(state.reporter, track_metrics))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "API handler panicked");
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", "internal server error").into_response()
}

async fn track_metrics(State(reporter): State<Reporter>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;
    reporter.record_api_request(&route, method.as_str(), response.status().as_u16(), started.elapsed());
    response
}
