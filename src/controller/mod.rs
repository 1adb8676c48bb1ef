//! Polling data controller
//!
//! Drives the refresh lifecycle: one cycle immediately on [`activate`], then
//! one per period until [`deactivate`]. Each cycle fetches `/soc` and
//! `/aggregates` concurrently; each response updates its own gauges as soon as
//! it arrives, a failed fetch leaves them untouched.
//!
//! Cycles are tied to the activation that started them. Deactivating aborts
//! in-flight cycles, and a response that still completes is discarded, so the
//! display never changes after [`deactivate`] returns.
//!
//! [`activate`]: PollingDataController::activate
//! [`deactivate`]: PollingDataController::deactivate

mod cycle;

pub use cycle::{CycleReport, FetchOutcome};

use crate::error::{DashError, Result};
use crate::gateway::GatewayClient;
use crate::logging::{StructuredLogger, get_logger};
use crate::scheduler::{Scheduler, TickFn, TimerHandle};
use crate::state::DisplayStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinSet;

/// Refresh period used when none is configured
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Lifecycle state of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Inactive,
    Active,
}

enum Lifecycle {
    Inactive,
    Active {
        generation: u64,
        activation_id: String,
        timer: Box<dyn TimerHandle>,
        logger: StructuredLogger,
    },
}

struct Inner {
    client: Arc<dyn GatewayClient>,
    scheduler: Arc<dyn Scheduler>,
    store: DisplayStore,
    period: Duration,
    lifecycle: Mutex<Lifecycle>,
    next_generation: AtomicU64,
    inflight: Mutex<JoinSet<CycleReport>>,
    logger: StructuredLogger,
}

/// Periodically refreshes the display state from the gateway
pub struct PollingDataController {
    inner: Arc<Inner>,
}

impl PollingDataController {
    /// Create an inactive controller with all gauges at zero
    pub fn new(
        client: Arc<dyn GatewayClient>,
        scheduler: Arc<dyn Scheduler>,
        period: Duration,
    ) -> Self {
        Self::with_store(client, scheduler, period, DisplayStore::new())
    }

    /// Create an inactive controller publishing into `store`
    pub fn with_store(
        client: Arc<dyn GatewayClient>,
        scheduler: Arc<dyn Scheduler>,
        period: Duration,
        store: DisplayStore,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                scheduler,
                store,
                period,
                lifecycle: Mutex::new(Lifecycle::Inactive),
                next_generation: AtomicU64::new(1),
                inflight: Mutex::new(JoinSet::new()),
                logger: get_logger("controller"),
            }),
        }
    }

    /// Display state this controller publishes to
    pub fn store(&self) -> &DisplayStore {
        &self.inner.store
    }

    pub fn period(&self) -> Duration {
        self.inner.period
    }

    pub fn state(&self) -> ControllerState {
        match *self.inner.lifecycle() {
            Lifecycle::Inactive => ControllerState::Inactive,
            Lifecycle::Active { .. } => ControllerState::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == ControllerState::Active
    }

    /// Identifier of the current activation, used in log context
    pub fn activation_id(&self) -> Option<String> {
        match &*self.inner.lifecycle() {
            Lifecycle::Active { activation_id, .. } => Some(activation_id.clone()),
            Lifecycle::Inactive => None,
        }
    }

    /// Start polling: gauges reset to zero, one cycle now, then one every
    /// period.
    ///
    /// Activating an active controller is a no-op; there is never more than
    /// one timer. Must be called within a tokio runtime.
    pub fn activate(&self) -> Result<()> {
        let inner = &self.inner;
        let mut lifecycle = inner.lifecycle();
        if let Lifecycle::Active { activation_id, .. } = &*lifecycle {
            inner.logger.warn(&format!(
                "Controller already active (activation {}); ignoring activate",
                activation_id
            ));
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| DashError::scheduler(format!("activate outside tokio runtime: {}", e)))?;

        let generation = inner.next_generation.fetch_add(1, Ordering::SeqCst);
        let activation_id = uuid::Uuid::new_v4().to_string();
        let logger = inner.logger.for_activation(&activation_id);

        let weak: Weak<Inner> = Arc::downgrade(inner);
        let tick: TickFn = Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.refresh_for(generation);
            }
        });
        let timer = inner.scheduler.schedule_repeating(inner.period, tick)?;

        inner.store.reset_gauges();
        logger.info(&format!(
            "Activated; polling every {} ms",
            inner.period.as_millis()
        ));
        inner.spawn_cycle(&runtime, Some(generation), logger.clone());

        *lifecycle = Lifecycle::Active {
            generation,
            activation_id,
            timer,
            logger,
        };
        Ok(())
    }

    /// Stop polling. No cycle starts after this returns and no in-flight
    /// response is applied to the display.
    pub fn deactivate(&self) {
        let mut lifecycle = self.inner.lifecycle();
        let previous = std::mem::replace(&mut *lifecycle, Lifecycle::Inactive);
        let Lifecycle::Active {
            mut timer, logger, ..
        } = previous
        else {
            drop(lifecycle);
            self.inner.logger.debug("Deactivate on inactive controller");
            return;
        };
        // Still under the lifecycle lock: activate spawns into the same set
        timer.cancel();
        self.inner.inflight().abort_all();
        drop(lifecycle);
        logger.info("Deactivated");
    }

    /// Run one cycle outside the timer and wait for it. Results are applied
    /// whether or not the controller is active.
    pub async fn refresh_now(&self) -> CycleReport {
        self.inner.store.record_cycle_started();
        self.inner.run_cycle(None, self.inner.logger.clone()).await
    }

    /// Wait for every cycle in flight; aborted cycles are skipped
    pub async fn drain(&self) -> Vec<CycleReport> {
        let mut set = std::mem::take(&mut *self.inner.inflight());
        let mut reports = Vec::new();
        while let Some(joined) = set.join_next().await {
            if let Ok(report) = joined {
                reports.push(report);
            }
        }
        reports
    }
}

impl Drop for PollingDataController {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl Inner {
    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn inflight(&self) -> MutexGuard<'_, JoinSet<CycleReport>> {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Timer entry point; starts a cycle only if `generation` is still active
    fn refresh_for(self: &Arc<Self>, generation: u64) {
        let lifecycle = self.lifecycle();
        let Lifecycle::Active {
            generation: current,
            logger,
            ..
        } = &*lifecycle
        else {
            return;
        };
        if *current != generation {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => self.spawn_cycle(&runtime, Some(generation), logger.clone()),
            Err(e) => logger.error(&format!("Timer tick outside tokio runtime: {}", e)),
        }
    }

    fn spawn_cycle(
        self: &Arc<Self>,
        runtime: &tokio::runtime::Handle,
        generation: Option<u64>,
        logger: StructuredLogger,
    ) {
        self.store.record_cycle_started();
        let inner = Arc::clone(self);
        let mut inflight = self.inflight();
        while inflight.try_join_next().is_some() {}
        inflight.spawn_on(
            async move { inner.run_cycle(generation, logger).await },
            runtime,
        );
    }

    /// Run `apply` unless the cycle belongs to an activation that has ended.
    /// The lifecycle lock is held so `deactivate` cannot interleave.
    fn apply_if_current<F: FnOnce()>(&self, generation: Option<u64>, apply: F) -> bool {
        let Some(generation) = generation else {
            apply();
            return true;
        };
        let lifecycle = self.lifecycle();
        match &*lifecycle {
            Lifecycle::Active {
                generation: current,
                ..
            } if *current == generation => {
                apply();
                true
            }
            _ => false,
        }
    }

    fn settle<T, F>(
        &self,
        endpoint: &str,
        generation: Option<u64>,
        logger: &StructuredLogger,
        result: Result<T>,
        apply: F,
    ) -> FetchOutcome
    where
        F: FnOnce(&T),
    {
        match result {
            Ok(reading) => {
                if self.apply_if_current(generation, || apply(&reading)) {
                    FetchOutcome::Applied
                } else {
                    logger.debug(&format!("Discarding late {} response", endpoint));
                    FetchOutcome::Discarded
                }
            }
            Err(e) => {
                if self.apply_if_current(generation, || self.store.record_fetch_failure()) {
                    logger.warn(&format!("{}; keeping previous values", e));
                    FetchOutcome::Failed(e.to_string())
                } else {
                    FetchOutcome::Discarded
                }
            }
        }
    }

    /// One fetch cycle. Both requests are in flight together and each result
    /// is applied as soon as it completes.
    async fn run_cycle(&self, generation: Option<u64>, logger: StructuredLogger) -> CycleReport {
        let soc = async {
            let result = self.client.fetch_soc().await;
            self.settle(crate::gateway::SOC_PATH, generation, &logger, result, |r| {
                self.store.apply_soc(r)
            })
        };
        let aggregates = async {
            let result = self.client.fetch_aggregates().await;
            self.settle(
                crate::gateway::AGGREGATES_PATH,
                generation,
                &logger,
                result,
                |r| self.store.apply_aggregates(r),
            )
        };
        let (soc, aggregates) = tokio::join!(soc, aggregates);

        let report = CycleReport { soc, aggregates };
        logger.debug(&format!(
            "Cycle finished: soc={:?}, aggregates={:?}",
            report.soc, report.aggregates
        ));
        report
    }
}
