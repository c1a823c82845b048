//! Request handling across bootstrap.
//!
//! # States
//! - Pending: bootstrap still running, every request gets 503 "starting"
//! - Failed: bootstrap failed, every request gets 503 with the cause
//! - Ready: every request is forwarded to the installed router
//!
//! # State Transitions
//! ```text
//! Pending → Failed   (set_error, first terminal write)
//! Pending → Ready    (set_handler, first terminal write)
//! Failed / Ready     (terminal, later writes are rejected)
//! ```
//!
//! # Design Decisions
//! - State is an immutable snapshot behind an atomic pointer; readers never
//!   take a lock and never see a half-written state
//! - The terminal write is a compare-and-swap against the initial Pending
//!   snapshot, so exactly one writer can ever win

use std::error::Error as StdError;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use thiserror::Error;
use tower::ServiceExt;

/// Body returned while bootstrap is still running.
pub const STARTING_MESSAGE: &str = "Service starting, please retry shortly";

/// Cause recorded when bootstrap fails.
pub type SetupCause = Arc<dyn StdError + Send + Sync>;

/// Snapshot of the handler's state.
#[derive(Clone)]
pub enum SetupState {
    Pending,
    Failed(SetupCause),
    Ready(Router),
}

impl SetupState {
    pub fn phase(&self) -> SetupPhase {
        match self {
            Self::Pending => SetupPhase::Pending,
            Self::Failed(_) => SetupPhase::Failed,
            Self::Ready(_) => SetupPhase::Ready,
        }
    }
}

impl std::fmt::Debug for SetupState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Failed(cause) => f.debug_tuple("Failed").field(&cause.to_string()).finish(),
            Self::Ready(_) => write!(f, "Ready(..)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupPhase {
    Pending,
    Failed,
    Ready,
}

impl SetupPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Failed => "failed",
            Self::Ready => "ready",
        }
    }
}

/// A second terminal write was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("setup handler already finalized as {}", .current.as_str())]
pub struct FinalizeError {
    pub current: SetupPhase,
}

/// The HTTP entry point for the whole process lifetime.
pub struct SetupHandler {
    state: ArcSwap<SetupState>,
    pending: Arc<SetupState>,
}

impl Default for SetupHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SetupHandler {
    pub fn new() -> Self {
        let pending = Arc::new(SetupState::Pending);
        Self {
            state: ArcSwap::new(Arc::clone(&pending)),
            pending,
        }
    }

    /// Current state snapshot.
    pub fn observe(&self) -> Arc<SetupState> {
        self.state.load_full()
    }

    pub fn phase(&self) -> SetupPhase {
        self.state.load().phase()
    }

    /// Move from Pending to `terminal`. Only the first call can succeed.
    pub fn try_finalize(&self, terminal: SetupState) -> Result<(), FinalizeError> {
        let next = Arc::new(terminal);
        let previous = self.state.compare_and_swap(&self.pending, next);
        if Arc::ptr_eq(&*previous, &self.pending) {
            Ok(())
        } else {
            let current = previous.phase();
            tracing::warn!(current = current.as_str(), "Ignoring second terminal setup state");
            Err(FinalizeError { current })
        }
    }

    /// Record a bootstrap failure.
    pub fn set_error<E>(&self, cause: E) -> Result<(), FinalizeError>
    where
        E: StdError + Send + Sync + 'static,
    {
        self.try_finalize(SetupState::Failed(Arc::new(cause)))
    }

    /// Install the application router.
    pub fn set_handler(&self, router: Router) -> Result<(), FinalizeError> {
        self.try_finalize(SetupState::Ready(router))
    }

    /// Serve one request according to the current state.
    pub async fn handle(&self, request: Request) -> Response {
        let snapshot = self.observe();
        match &*snapshot {
            SetupState::Pending => unavailable(STARTING_MESSAGE.to_string()),
            SetupState::Failed(cause) => unavailable(failure_message(cause.as_ref())),
            SetupState::Ready(router) => match router.clone().oneshot(request).await {
                Ok(response) => response,
                Err(never) => match never {},
            },
        }
    }
}

/// Human-readable description of a bootstrap failure.
pub fn failure_message(cause: &(dyn StdError + Send + Sync)) -> String {
    format!("Service failed to start: {cause}")
}

fn unavailable(message: String) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from(message),
    )
        .into_response()
}

/// Axum fallback that routes every request through the handler.
pub async fn dispatch(State(handler): State<Arc<SetupHandler>>, request: Request) -> Response {
    handler.handle(request).await
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::thread;

    use axum::http::Request;
    use axum::routing::get;

    use super::*;

    #[derive(Debug, Error)]
    #[error("storage unreachable")]
    struct TestCause;

    fn app() -> Router {
        Router::new().route("/hello", get(|| async { (StatusCode::IM_A_TEAPOT, "hi") }))
    }

    async fn call(handler: &SetupHandler, path: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = handler.handle(request).await;
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_pending_by_default() {
        let handler = SetupHandler::new();
        for path in ["/", "/hello", "/v1/poll"] {
            let (status, body) = call(&handler, path).await;
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(body, STARTING_MESSAGE);
        }
        assert_eq!(handler.phase(), SetupPhase::Pending);
    }

    #[tokio::test]
    async fn test_error_is_terminal() {
        let handler = SetupHandler::new();
        handler.set_error(TestCause).unwrap();

        let err = handler.set_handler(app()).unwrap_err();
        assert_eq!(err.current, SetupPhase::Failed);

        for _ in 0..3 {
            let (status, body) = call(&handler, "/hello").await;
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(body, "Service failed to start: storage unreachable");
        }
    }

    #[tokio::test]
    async fn test_ready_forwards_unmodified() {
        let handler = SetupHandler::new();
        handler.set_handler(app()).unwrap();
        assert!(handler.set_error(TestCause).is_err());

        let (status, body) = call(&handler, "/hello").await;
        assert_eq!(status, StatusCode::IM_A_TEAPOT);
        assert_eq!(body, "hi");

        let (status, _) = call(&handler, "/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_concurrent_readers_see_terminal_error() {
        let handler = Arc::new(SetupHandler::new());
        handler.set_error(TestCause).unwrap();

        let mut tasks = Vec::new();
        for _ in 0..32 {
            let handler = Arc::clone(&handler);
            tasks.push(tokio::spawn(async move { call(&handler, "/hello").await }));
        }
        for task in tasks {
            let (status, body) = task.await.unwrap();
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
            assert!(body.contains("storage unreachable"));
        }
    }

    #[test]
    fn test_rejected_write_names_current_phase() {
        let handler = SetupHandler::new();
        handler.set_handler(app()).unwrap();

        let err = handler.set_error(TestCause).unwrap_err();
        assert_eq!(err.to_string(), "setup handler already finalized as ready");
        let err = handler.set_handler(app()).unwrap_err();
        assert_eq!(err.current, SetupPhase::Ready);
        assert_eq!(handler.phase(), SetupPhase::Ready);
    }

    #[test]
    fn test_racing_terminal_writes_have_one_winner() {
        for _ in 0..200 {
            let handler = Arc::new(SetupHandler::new());
            let barrier = Arc::new(Barrier::new(2));

            let error_writer = {
                let handler = Arc::clone(&handler);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    handler.set_error(TestCause).is_ok()
                })
            };
            let ready_writer = {
                let handler = Arc::clone(&handler);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    handler.set_handler(app()).is_ok()
                })
            };

            let error_won = error_writer.join().unwrap();
            let ready_won = ready_writer.join().unwrap();
            assert!(error_won ^ ready_won, "exactly one terminal write must win");

            let expected = if error_won { SetupPhase::Failed } else { SetupPhase::Ready };
            for _ in 0..10 {
                assert_eq!(handler.phase(), expected);
            }
        }
    }
}
