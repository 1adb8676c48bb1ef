//! Display state published to the presentation layer
//!
//! Four gauge cells plus fetch bookkeeping, held in a `watch` channel. Every
//! update goes through a named setter; subscribers are woken only when a
//! published value actually changes.

use crate::gateway::{AggregateReading, SocReading};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// The four gauges, all starting at zero
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayState {
    /// Adjusted state of charge, percent
    pub soc: f64,
    /// Battery power in watts
    pub battery_power: f64,
    /// Grid power in watts (gateway `site`)
    pub grid_power: f64,
    /// Inverter power in watts (gateway `solar`)
    pub inverter_power: f64,
}

/// What subscribers receive: the gauges and when each source last succeeded
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplaySnapshot {
    #[serde(flatten)]
    pub gauges: DisplayState,
    /// RFC 3339 time of the last applied `/soc` reading
    pub soc_updated_at: Option<String>,
    /// RFC 3339 time of the last applied `/aggregates` reading
    pub aggregates_updated_at: Option<String>,
    /// Refresh cycles started
    pub total_cycles: u64,
    /// Individual endpoint fetches that failed
    pub failed_fetches: u64,
}

/// Shared handle to the display state. Clones publish to the same subscribers.
#[derive(Debug, Clone)]
pub struct DisplayStore {
    tx: Arc<watch::Sender<Arc<DisplaySnapshot>>>,
}

impl Default for DisplayStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(DisplaySnapshot::default()));
        Self { tx: Arc::new(tx) }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<DisplaySnapshot> {
        self.tx.borrow().clone()
    }

    /// Current gauge values
    pub fn gauges(&self) -> DisplayState {
        self.tx.borrow().gauges
    }

    /// Receiver notified on every change
    pub fn subscribe(&self) -> watch::Receiver<Arc<DisplaySnapshot>> {
        self.tx.subscribe()
    }

    fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut DisplaySnapshot),
    {
        self.tx.send_if_modified(|current| {
            let mut next = (**current).clone();
            f(&mut next);
            if next == **current {
                return false;
            }
            *current = Arc::new(next);
            true
        })
    }

    pub fn set_soc(&self, value: f64) -> bool {
        self.update(|s| s.gauges.soc = value)
    }

    pub fn set_battery_power(&self, value: f64) -> bool {
        self.update(|s| s.gauges.battery_power = value)
    }

    pub fn set_grid_power(&self, value: f64) -> bool {
        self.update(|s| s.gauges.grid_power = value)
    }

    pub fn set_inverter_power(&self, value: f64) -> bool {
        self.update(|s| s.gauges.inverter_power = value)
    }

    /// Apply a successful `/soc` fetch; only `adjusted_soc` is kept
    pub fn apply_soc(&self, reading: &SocReading) {
        let now = chrono::Utc::now().to_rfc3339();
        self.update(|s| {
            s.gauges.soc = reading.adjusted_soc;
            s.soc_updated_at = Some(now);
        });
    }

    /// Apply a successful `/aggregates` fetch; `load` is not displayed
    pub fn apply_aggregates(&self, reading: &AggregateReading) {
        let now = chrono::Utc::now().to_rfc3339();
        self.update(|s| {
            s.gauges.battery_power = reading.battery;
            s.gauges.grid_power = reading.site;
            s.gauges.inverter_power = reading.solar;
            s.aggregates_updated_at = Some(now);
        });
    }

    /// Zero the four gauges and forget when they were last updated. Cycle
    /// and failure counters are kept.
    pub fn reset_gauges(&self) -> bool {
        self.update(|s| {
            s.gauges = DisplayState::default();
            s.soc_updated_at = None;
            s.aggregates_updated_at = None;
        })
    }

    pub(crate) fn record_cycle_started(&self) {
        self.update(|s| s.total_cycles = s.total_cycles.saturating_add(1));
    }

    pub(crate) fn record_fetch_failure(&self) {
        self.update(|s| s.failed_fetches = s.failed_fetches.saturating_add(1));
    }
}
