//! Repeating-timer capability
//!
//! The controller never touches `tokio::time` directly; it is handed a
//! [`Scheduler`] so tests can drive ticks by hand.

use crate::error::{DashError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Callback run on every tick
pub type TickFn = Arc<dyn Fn() + Send + Sync>;

/// Handle to a running repeating timer. Dropping it cancels the timer.
pub trait TimerHandle: Send {
    /// Stop the timer; no tick starts after this returns
    fn cancel(&mut self);
}

/// Schedules a callback at a fixed period
pub trait Scheduler: Send + Sync {
    /// Run `tick` every `period`, first one `period` from now
    fn schedule_repeating(&self, period: Duration, tick: TickFn) -> Result<Box<dyn TimerHandle>>;
}

/// [`Scheduler`] backed by a tokio interval task.
///
/// Missed ticks are skipped so ticks stay on the `start + k * period` grid.
#[derive(Debug, Clone, Default)]
pub struct TokioScheduler;

impl TokioScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_repeating(&self, period: Duration, tick: TickFn) -> Result<Box<dyn TimerHandle>> {
        if period.is_zero() {
            return Err(DashError::scheduler("period must be greater than zero"));
        }
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| DashError::scheduler(format!("no tokio runtime: {}", e)))?;

        let start = Instant::now() + period;
        let task = handle.spawn(async move {
            let mut ticker = interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                tick();
            }
        });
        Ok(Box::new(TokioTimerHandle { task: Some(task) }))
    }
}

struct TokioTimerHandle {
    task: Option<JoinHandle<()>>,
}

impl TimerHandle for TokioTimerHandle {
    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for TokioTimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
