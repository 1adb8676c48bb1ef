//! Where the dashboard page is served from, and the endpoint URLs derived from it

use crate::error::{DashError, Result};
use reqwest::Url;
use std::fmt;

/// Protocol, hostname and port of the page the dashboard is served from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    /// Scheme including the trailing colon, e.g. `https:`
    pub protocol: String,
    pub hostname: String,
    /// `None` when the page uses the scheme's default port
    pub port: Option<u16>,
}

impl PageLocation {
    /// Parse a full page URL such as `https://host.example:8443/dashboard`
    pub fn parse(page_url: &str) -> Result<Self> {
        let url = Url::parse(page_url.trim())
            .map_err(|e| DashError::validation("page_url".to_string(), e.to_string()))?;
        let hostname = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| DashError::validation("page_url", "URL must include a host"))?
            .to_string();
        Ok(Self {
            protocol: format!("{}:", url.scheme()),
            hostname,
            port: url.port(),
        })
    }

    /// `<protocol>//<hostname>[:<port>]`
    pub fn base_url(&self) -> String {
        match self.port {
            Some(port) => format!("{}//{}:{}", self.protocol, self.hostname, port),
            None => format!("{}//{}", self.protocol, self.hostname),
        }
    }

    /// Absolute URL of an endpoint path on the same origin
    pub fn endpoint_url(&self, path: &str) -> Result<Url> {
        let raw = format!("{}{}", self.base_url(), path);
        Url::parse(&raw).map_err(|e| DashError::config(format!("Invalid endpoint URL {}: {}", raw, e)))
    }
}

impl fmt::Display for PageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_port_is_kept() {
        let loc = PageLocation::parse("https://host.example:8443/dashboard").unwrap();
        assert_eq!(loc.protocol, "https:");
        assert_eq!(loc.hostname, "host.example");
        assert_eq!(loc.port, Some(8443));
        assert_eq!(loc.base_url(), "https://host.example:8443");
        assert_eq!(
            loc.endpoint_url("/soc").unwrap().as_str(),
            "https://host.example:8443/soc"
        );
        assert_eq!(
            loc.endpoint_url("/aggregates").unwrap().as_str(),
            "https://host.example:8443/aggregates"
        );
    }

    #[test]
    fn default_port_is_omitted() {
        let loc = PageLocation::parse("http://pw.local:80/index.html?x=1#top").unwrap();
        assert_eq!(loc.port, None);
        assert_eq!(loc.base_url(), "http://pw.local");
        assert_eq!(loc.to_string(), "http://pw.local");
    }

    #[test]
    fn ipv6_host_keeps_brackets() {
        let loc = PageLocation::parse("http://[::1]:4200/").unwrap();
        assert_eq!(loc.base_url(), "http://[::1]:4200");
    }

    #[test]
    fn rejects_urls_without_host() {
        assert!(PageLocation::parse("dashboard").is_err());
        assert!(PageLocation::parse("mailto:someone@example.com").is_err());
    }
}
