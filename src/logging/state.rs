use once_cell::sync::OnceCell;
use std::sync::{Once, RwLock as StdRwLock};
use tokio::sync::broadcast;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;

// The non-blocking file writer flushes on guard drop; keep it for the process lifetime
pub static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();
pub static INIT_ONCE: Once = Once::new();
pub static INIT_ERROR: OnceCell<String> = OnceCell::new();
pub static LOG_BROADCAST_TX: OnceCell<broadcast::Sender<String>> = OnceCell::new();
pub static WEB_LOG_LEVEL: OnceCell<StdRwLock<Level>> = OnceCell::new();

/// Set the runtime level applied to the SSE log stream
pub fn set_web_log_level(new_level: Level) {
    let lock = WEB_LOG_LEVEL.get_or_init(|| StdRwLock::new(new_level));
    if let Ok(mut guard) = lock.write() {
        *guard = new_level;
    }
}

/// Current runtime web level. Defaults to INFO if unset.
pub fn get_web_log_level() -> Level {
    WEB_LOG_LEVEL
        .get()
        .and_then(|lock| lock.read().ok().map(|guard| *guard))
        .unwrap_or(Level::INFO)
}
