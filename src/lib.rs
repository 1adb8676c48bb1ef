//! # pwdash - Powerwall gauge poller
//!
//! Keeps four dashboard gauges (state of charge, battery, grid and inverter
//! power) in sync with a home-battery gateway by polling its `/soc` and
//! `/aggregates` endpoints on a fixed cadence.
//!
//! ## Architecture
//!
//! - `config`: YAML configuration with env overrides and validation
//! - `logging`: Structured logging and tracing
//! - `gateway`: Endpoint URLs and the HTTP client for the gateway
//! - `scheduler`: Repeating-timer capability
//! - `state`: Observable display state
//! - `controller`: Activation lifecycle and fetch cycles
//! - `web`: JSON and SSE feed for the presentation layer

pub mod config;
pub mod controller;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod scheduler;
pub mod state;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use controller::{ControllerState, CycleReport, FetchOutcome, PollingDataController};
pub use error::{DashError, Result};
pub use state::{DisplaySnapshot, DisplayState, DisplayStore};
