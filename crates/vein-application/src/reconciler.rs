//! Periodic reconciliation driver.
//!
//! Sweeps every open session on a fixed cadence and converts its elapsed
//! time into persisted balance, independent of any individual user request.
//! Transient store errors are logged and retried implicitly on the next
//! tick; a failed session keeps its reconciliation point, so no elapsed
//! time is ever dropped.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;

use vein_core::accrual::AccrualEngine;
use vein_core::session::SessionRegistry;

/// Outcome of one sweep over the registry.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SweepStats {
    pub reconciled: usize,
    pub failed: usize,
    pub earned: f64,
}

pub struct Reconciler {
    registry: Arc<SessionRegistry>,
    engine: Arc<AccrualEngine>,
    interval: Duration,
}

impl Reconciler {
    pub fn new(
        registry: Arc<SessionRegistry>,
        engine: Arc<AccrualEngine>,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            engine,
            interval,
        }
    }

    /// Starts the periodic sweep in a background task.
    ///
    /// The task runs for the lifetime of the process; dropping the handle
    /// detaches it, aborting the handle stops the cadence.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let reconciler = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(reconciler.interval);
            // The first tick fires immediately and would sweep an interval
            // of zero; skip it.
            ticker.tick().await;
            tracing::info!(
                interval_secs = reconciler.interval.as_secs(),
                "reconciliation sweep started"
            );

            loop {
                ticker.tick().await;
                let stats = reconciler.sweep().await;
                if stats.failed > 0 {
                    tracing::warn!(
                        failed = stats.failed,
                        reconciled = stats.reconciled,
                        "sweep finished with failures, will retry next tick"
                    );
                } else if stats.reconciled > 0 {
                    tracing::debug!(
                        reconciled = stats.reconciled,
                        earned = stats.earned,
                        "sweep finished"
                    );
                }
            }
        })
    }

    /// Reconciles every open session once, sequentially.
    ///
    /// A sequential sweep keeps reconciliation single-writer per account
    /// without any extra locking; the per-session mutex additionally
    /// excludes a concurrent explicit stop.
    pub async fn sweep(&self) -> SweepStats {
        let now = Utc::now();
        let mut stats = SweepStats::default();

        for (subject_id, handle) in self.registry.active().await {
            let mut session = handle.lock().await;
            // An explicit stop may have ended the session while the sweep
            // waited for its lock; a removed session must not accrue.
            if !self.registry.is_active(&subject_id).await {
                continue;
            }
            match self.engine.reconcile_at(&mut session, now).await {
                Ok(earned) => {
                    stats.reconciled += 1;
                    stats.earned += earned;
                }
                Err(err) => {
                    stats.failed += 1;
                    tracing::warn!(%subject_id, identity = %session.identity, %err, "reconciliation failed");
                }
            }
        }

        stats
    }
}
