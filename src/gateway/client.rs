//! reqwest client for the gateway endpoints

use crate::config::DashboardConfig;
use crate::error::{DashError, Result};
use crate::gateway::location::PageLocation;
use crate::gateway::types::{AGGREGATES_PATH, AggregateReading, SOC_PATH, SocReading, decode_body};
use crate::gateway::GatewayClient;
use crate::logging::{StructuredLogger, get_logger};
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// reqwest-backed [`GatewayClient`] talking to the page's own origin
pub struct HttpGatewayClient {
    http: reqwest::Client,
    location: PageLocation,
    soc_url: Url,
    aggregates_url: Url,
    logger: StructuredLogger,
}

impl HttpGatewayClient {
    /// Create a client for `location`. Without a timeout a request may hang
    /// until the gateway answers.
    pub fn new(location: PageLocation, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let http = builder.build()?;

        let soc_url = location.endpoint_url(SOC_PATH)?;
        let aggregates_url = location.endpoint_url(AGGREGATES_PATH)?;

        Ok(Self {
            http,
            location,
            soc_url,
            aggregates_url,
            logger: get_logger("gateway"),
        })
    }

    /// Build from the `dashboard` config section
    pub fn from_config(config: &DashboardConfig) -> Result<Self> {
        let location = PageLocation::parse(&config.page_url)?;
        Self::new(location, config.request_timeout())
    }

    pub fn location(&self) -> &PageLocation {
        &self.location
    }

    pub fn soc_url(&self) -> &Url {
        &self.soc_url
    }

    pub fn aggregates_url(&self) -> &Url {
        &self.aggregates_url
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, url: &Url) -> Result<T> {
        self.logger.trace(&format!("GET {}", url));

        let resp = self.http.get(url.clone()).send().await.map_err(|e| {
            let reason = if e.is_timeout() { "timed out" } else { "request failed" };
            DashError::fetch(endpoint, format!("{}: {}", reason, e))
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DashError::fetch(endpoint, format!("status {}", status)));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| DashError::fetch(endpoint, format!("reading body failed: {}", e)))?;
        decode_body(endpoint, &body)
    }
}

#[async_trait::async_trait]
impl GatewayClient for HttpGatewayClient {
    async fn fetch_soc(&self) -> Result<SocReading> {
        self.get_json(SOC_PATH, &self.soc_url).await
    }

    async fn fetch_aggregates(&self) -> Result<AggregateReading> {
        self.get_json(AGGREGATES_PATH, &self.aggregates_url).await
    }
}
