use super::*;

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            page_url: "http://localhost:8000/".to_string(),
            poll_interval_ms: 10_000,
            request_timeout_ms: None,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8090,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            web_level: None,
            file: "/tmp/pwdash.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}
