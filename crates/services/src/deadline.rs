use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use assess_core::model::{AssessmentId, DeadlineMonitor, DeadlineTick, ExpiryLatch, FallbackPolicy};

use crate::Clock;
use crate::api::AssessmentApi;

/// Establishes the session deadline from the server's start/duration.
#[derive(Clone)]
pub struct DeadlineService {
    api: Arc<dyn AssessmentApi>,
    clock: Clock,
    fallback: FallbackPolicy,
}

impl DeadlineService {
    #[must_use]
    pub fn new(api: Arc<dyn AssessmentApi>, clock: Clock, fallback: FallbackPolicy) -> Self {
        Self {
            api,
            clock,
            fallback,
        }
    }

    /// Never fails: when the session state cannot be fetched for any reason,
    /// the fallback duration is anchored to now.
    pub async fn establish(&self, assessment_id: AssessmentId, latch: ExpiryLatch) -> DeadlineMonitor {
        match self.api.fetch_session_state(assessment_id).await {
            Ok(state) => DeadlineMonitor::start(state.start_time, state.duration_seconds, latch),
            Err(err) => {
                if err.is_unauthorized() {
                    tracing::debug!(%assessment_id, "session state not authorized, using fallback deadline");
                } else {
                    tracing::warn!(
                        %assessment_id,
                        error = %err,
                        fallback_secs = self.fallback.duration_seconds,
                        "session state unavailable, using fallback deadline"
                    );
                }
                DeadlineMonitor::fallback(self.fallback, self.clock.now(), latch)
            }
        }
    }

    pub fn tick(&self, monitor: &mut DeadlineMonitor) -> DeadlineTick {
        monitor.tick(self.clock.now())
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }
}

/// Background task ticking a `DeadlineMonitor` once per period.
///
/// Stops after the tick that reaches zero, or when dropped.
pub struct DeadlineTicker {
    updates: watch::Receiver<DeadlineTick>,
    task: JoinHandle<()>,
}

impl DeadlineTicker {
    #[must_use]
    pub fn spawn(mut monitor: DeadlineMonitor, clock: Clock, period: Duration) -> Self {
        let first = monitor.tick(clock.now());
        let (sender, updates) = watch::channel(first);

        let task = tokio::spawn(async move {
            if first.remaining == 0 {
                return;
            }
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval.tick().await;
            loop {
                interval.tick().await;
                let tick = monitor.tick(clock.now());
                if sender.send(tick).is_err() || tick.remaining == 0 {
                    break;
                }
            }
        });

        Self { updates, task }
    }

    #[must_use]
    pub fn current(&self) -> DeadlineTick {
        *self.updates.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DeadlineTick> {
        self.updates.clone()
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for DeadlineTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}
