//! Gateway endpoints consumed by the dashboard
//!
//! The Powerwall gateway serves `/soc` and `/aggregates` on the same origin as
//! the dashboard page. [`GatewayClient`] is the fetch capability handed to the
//! controller; [`HttpGatewayClient`] is the reqwest-backed implementation.

pub mod client;
pub mod location;
pub mod types;

pub use client::HttpGatewayClient;
pub use location::PageLocation;
pub use types::{AGGREGATES_PATH, AggregateReading, SOC_PATH, SocReading, decode_aggregates, decode_soc};

use crate::error::Result;

/// Fetch capability for the two gateway endpoints.
///
/// Any failure (transport, non-2xx status, malformed body) is reported as
/// [`crate::error::DashError::Fetch`].
#[async_trait::async_trait]
pub trait GatewayClient: Send + Sync {
    /// GET `/soc`
    async fn fetch_soc(&self) -> Result<SocReading>;

    /// GET `/aggregates`
    async fn fetch_aggregates(&self) -> Result<AggregateReading>;
}
