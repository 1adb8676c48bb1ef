//! Structured logging and tracing for pwdash
//!
//! Console, rolling file and an in-process broadcast of formatted lines (fed to
//! the SSE log stream) are separate `tracing-subscriber` layers, each with its
//! own level.

use crate::config::LoggingConfig;
use crate::error::{DashError, Result};
use std::path::Path;
use tracing::{Level, info};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod broadcast;
mod level;
mod state;
mod structured;

pub use broadcast::subscribe_log_lines;
pub use level::{parse_line_level, parse_log_level, set_web_log_level_str};
pub use state::{get_web_log_level, set_web_log_level};
pub use structured::{LogContext, StructuredLogger, get_logger, get_logger_with_context};

use broadcast::{BroadcastMakeWriter, get_or_init_log_tx};
use level::{level_rank, min_level};
use state::{INIT_ERROR, INIT_ONCE, LOG_GUARD, WEB_LOG_LEVEL};

/// Levels resolved from a [`LoggingConfig`]
#[derive(Debug, Clone, Copy)]
struct LayerLevels {
    console: Level,
    file: Level,
    web: Level,
}

impl LayerLevels {
    fn resolve(config: &LoggingConfig) -> Result<Self> {
        let base = parse_log_level(&config.level)?;
        let pick = |o: &Option<String>| {
            o.as_deref()
                .and_then(|s| parse_log_level(s).ok())
                .unwrap_or(base)
        };
        Ok(Self {
            console: pick(&config.console_level),
            file: pick(&config.file_level),
            web: pick(&config.web_level),
        })
    }

    fn most_verbose(&self) -> Level {
        min_level(min_level(self.console, self.file), self.web)
    }
}

/// Initialize logging system based on configuration.
///
/// Only the first call installs the subscriber; later calls return the outcome
/// of that first attempt.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    INIT_ONCE.call_once(|| {
        let init_result = (|| -> Result<()> {
            let levels = LayerLevels::resolve(config)?;
            let filter = build_env_filter(levels.most_verbose());

            if should_use_console_only() {
                init_console_only_logging(filter, config.json_format, levels);
            } else {
                init_file_logging(config, filter, levels)?;
            }
            let _ = WEB_LOG_LEVEL.set(std::sync::RwLock::new(levels.web));
            Ok(())
        })();

        if let Err(e) = init_result {
            let _ = INIT_ERROR.set(e.to_string());
        }
    });

    if let Some(err) = INIT_ERROR.get() {
        return Err(DashError::config(err.clone()));
    }
    Ok(())
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("pwdash={},hyper=warn,reqwest=warn", level).into())
}

fn should_use_console_only() -> bool {
    cfg!(test) || std::env::var_os("PWDASH_DISABLE_FILE_LOG").is_some()
}

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

fn stdout_layer(json: bool, level: Level) -> BoxedLayer {
    let base = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);
    if json {
        base.json()
            .with_filter(LevelFilter::from_level(level))
            .boxed()
    } else {
        base.with_filter(LevelFilter::from_level(level)).boxed()
    }
}

fn broadcast_layer(json: bool) -> BoxedLayer {
    let make = BroadcastMakeWriter {
        tx: get_or_init_log_tx(),
    };
    let base = fmt::layer()
        .with_writer(make)
        .with_ansi(false)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);
    // Capture everything; the SSE stream applies the runtime web level
    if json {
        base.json().with_filter(LevelFilter::TRACE).boxed()
    } else {
        base.with_filter(LevelFilter::TRACE).boxed()
    }
}

fn init_console_only_logging(filter: EnvFilter, json_format: bool, levels: LayerLevels) {
    let layers = vec![
        stdout_layer(json_format, levels.console),
        broadcast_layer(json_format),
    ];

    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init();

    info!(
        "Logging initialized - console_level: {:?}, web_level: {:?}, console-only",
        levels.console, levels.web
    );
}

fn init_file_logging(config: &LoggingConfig, filter: EnvFilter, levels: LayerLevels) -> Result<()> {
    let file_appender = rolling::Builder::new()
        .rotation(rolling::Rotation::DAILY)
        .filename_prefix("pwdash")
        .filename_suffix("log")
        .max_log_files(config.backup_count.max(1) as usize)
        .build({
            // A path with an extension names a file; rotate inside its directory
            let p = Path::new(&config.file);
            if p.extension().is_some() {
                p.parent().unwrap_or(p)
            } else {
                p
            }
        })
        .map_err(|e| DashError::io(format!("Failed to create log file appender: {}", e)))?;

    let (non_blocking_appender, guard) = non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let file_layer: BoxedLayer = {
        let base = fmt::layer()
            .with_writer(non_blocking_appender)
            .with_ansi(false)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false);
        if config.json_format {
            base.json()
                .with_filter(LevelFilter::from_level(levels.file))
                .boxed()
        } else {
            base.with_filter(LevelFilter::from_level(levels.file))
                .boxed()
        }
    };

    let mut layers = vec![file_layer, broadcast_layer(config.json_format)];
    if config.console_output {
        layers.push(stdout_layer(config.json_format, levels.console));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| DashError::config(format!("Failed to install subscriber: {}", e)))?;

    info!(
        "Logging initialized - console_level: {:?}, file_level: {:?}, web_level: {:?}, file: {}",
        levels.console, levels.file, levels.web, config.file
    );
    Ok(())
}

/// Whether a formatted line should be emitted to the web SSE stream given the
/// current runtime web level
pub fn should_emit_to_web(line: &str) -> bool {
    let current = get_web_log_level();
    match parse_line_level(line) {
        Some(line_lvl) => level_rank(line_lvl) >= level_rank(current),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_levels_fall_back_to_base() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            console_level: Some("debug".to_string()),
            web_level: Some("bogus".to_string()),
            ..LoggingConfig::default()
        };
        let levels = LayerLevels::resolve(&config).unwrap();
        assert_eq!(levels.console, Level::DEBUG);
        assert_eq!(levels.file, Level::WARN);
        assert_eq!(levels.web, Level::WARN);
        assert_eq!(levels.most_verbose(), Level::DEBUG);
    }

    #[test]
    fn test_invalid_base_level_is_rejected() {
        let config = LoggingConfig {
            level: "LOUD".to_string(),
            ..LoggingConfig::default()
        };
        assert!(LayerLevels::resolve(&config).is_err());
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        let config = LoggingConfig::default();
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&config).is_ok());
        get_logger("test").info("still alive");
    }
}
