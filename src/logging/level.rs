use crate::error::{DashError, Result};
use tracing::Level;

/// Parse a level name (case-insensitive, `WARNING` accepted as `WARN`)
pub fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.trim().to_uppercase().as_str() {
        "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARN" | "WARNING" => Ok(Level::WARN),
        "ERROR" => Ok(Level::ERROR),
        _ => Err(DashError::config(format!(
            "Invalid log level: {}",
            level_str
        ))),
    }
}

pub(crate) fn level_rank(level: Level) -> u8 {
    match level {
        Level::TRACE => 0,
        Level::DEBUG => 1,
        Level::INFO => 2,
        Level::WARN => 3,
        Level::ERROR => 4,
    }
}

pub(crate) fn min_level(a: Level, b: Level) -> Level {
    if level_rank(a) <= level_rank(b) { a } else { b }
}

const LEVELS: [(Level, &str); 5] = [
    (Level::TRACE, "TRACE"),
    (Level::DEBUG, "DEBUG"),
    (Level::INFO, "INFO"),
    (Level::WARN, "WARN"),
    (Level::ERROR, "ERROR"),
];

/// Try to parse a level out of a formatted log line (JSON or plain)
pub fn parse_line_level(line: &str) -> Option<Level> {
    LEVELS
        .iter()
        .find(|(_, name)| line.contains(&format!("\"level\":\"{}\"", name)))
        .or_else(|| {
            LEVELS
                .iter()
                .find(|(_, name)| line.contains(&format!(" {} ", name)))
        })
        .map(|(level, _)| *level)
}

/// Parse and apply the runtime web level
pub fn set_web_log_level_str(level_str: &str) -> Result<()> {
    let lvl = parse_log_level(level_str)?;
    super::state::set_web_log_level(lvl);
    Ok(())
}
