//! Response bodies of `/soc` and `/aggregates`

use crate::error::{DashError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Path of the state-of-charge endpoint
pub const SOC_PATH: &str = "/soc";
/// Path of the power aggregates endpoint
pub const AGGREGATES_PATH: &str = "/aggregates";

/// Body of `GET /soc`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SocReading {
    /// Percentage as reported by the battery
    pub raw_soc: f64,
    /// Percentage rescaled by the gateway for display
    pub adjusted_soc: f64,
}

/// Body of `GET /aggregates`, instantaneous power in watts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateReading {
    /// Positive when the battery discharges
    pub battery: f64,
    /// House consumption; not displayed
    pub load: f64,
    /// Grid exchange, positive when importing
    pub site: f64,
    /// Inverter (solar) output
    pub solar: f64,
}

pub(crate) fn decode_body<T: DeserializeOwned>(endpoint: &str, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| DashError::fetch(endpoint, format!("malformed body: {}", e)))
}

/// Decode a `/soc` response body
pub fn decode_soc(body: &[u8]) -> Result<SocReading> {
    decode_body(SOC_PATH, body)
}

/// Decode an `/aggregates` response body
pub fn decode_aggregates(body: &[u8]) -> Result<AggregateReading> {
    decode_body(AGGREGATES_PATH, body)
}
