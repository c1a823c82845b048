//! Fixed-interval reconciliation loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::checker::ConsistencyCheck;
use crate::lifecycle::Shutdown;
use crate::observability::metrics::Reporter;
use crate::reconcile::ReconcilerConfig;

/// Counts reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub attempts: u64,
    pub failures: u64,
}

/// Handle to a running reconciliation loop.
#[derive(Debug)]
pub struct ReconcilerHandle {
    stop: Shutdown,
    task: JoinHandle<ReconcileSummary>,
}

impl ReconcilerHandle {
    /// Ask the loop to stop. An in-flight check is abandoned.
    pub fn cancel(&self) {
        self.stop.trigger();
    }

    /// Wait for the loop to exit.
    pub async fn join(self) -> Result<ReconcileSummary, JoinError> {
        self.task.await
    }

    /// Cancel, then wait for the loop to exit.
    pub async fn shutdown(self) -> Result<ReconcileSummary, JoinError> {
        self.cancel();
        self.join().await
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// First tick of the `period` grid anchored at `start` at or after `now`,
/// and strictly after the tick that `fired`.
pub fn next_tick(start: Instant, period: Duration, fired: Instant, now: Instant) -> Instant {
    let elapsed = now.saturating_duration_since(start).as_nanos();
    let period_nanos = period.as_nanos().max(1);
    let ticks = elapsed.div_ceil(period_nanos);
    let offset = u64::try_from(ticks.saturating_mul(period_nanos)).unwrap_or(u64::MAX);
    (start + Duration::from_nanos(offset)).max(fired + period)
}

pub struct Reconciler<C> {
    checker: Arc<C>,
    interval: Duration,
    reporter: Reporter,
}

impl<C: ConsistencyCheck + 'static> Reconciler<C> {
    pub fn new(checker: Arc<C>, config: ReconcilerConfig) -> Self {
        Self {
            checker,
            interval: config.interval,
            reporter: Reporter::new(),
        }
    }

    /// Spawn the loop. The first check runs immediately.
    ///
    /// Returns `None` when the configured interval is zero.
    pub fn start(checker: Arc<C>, config: ReconcilerConfig) -> Option<ReconcilerHandle> {
        if !config.is_enabled() {
            return None;
        }
        let stop = Shutdown::new();
        let task = tokio::spawn(Self::new(checker, config).run(stop.clone()));
        Some(ReconcilerHandle { stop, task })
    }

    async fn run(self, stop: Shutdown) -> ReconcileSummary {
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "Beginning periodic poll...");

        let start = Instant::now();
        let mut ticker = time::interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut summary = ReconcileSummary::default();

        loop {
            let fired = tokio::select! {
                fired = ticker.tick() => fired,
                _ = stop.wait() => break,
            };

            summary.attempts += 1;
            tracing::debug!(attempt = summary.attempts, "Polling");
            let started = Instant::now();

            let outcome = tokio::select! {
                outcome = self.checker.check(None) => outcome,
                _ = stop.wait() => break,
            };

            let ok = outcome.is_ok();
            self.reporter.record_check(ok, started.elapsed());
            if let Err(e) = outcome {
                summary.failures += 1;
                tracing::error!(attempt = summary.attempts, error = %e, "Periodic poll failed");
            }

            // Ticks that elapsed while the check ran are dropped, not replayed.
            ticker.reset_at(next_tick(start, self.interval, fired, Instant::now()));
        }

        tracing::info!(
            attempts = summary.attempts,
            failures = summary.failures,
            "Periodic poll stopped"
        );
        summary
    }
}
