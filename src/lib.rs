pub mod bracket;
pub mod engine;
pub mod error;
pub mod store;
pub mod types;

pub use bracket::{build_bracket, next_power_of_two, record_result};
pub use engine::BracketService;
pub use error::BracketError;
pub use store::{BracketStore, JsonBracketStore, MemoryBracketStore};
pub use types::{
    Bracket, BracketStatus, Entrant, Match, MatchStatus, Slot, BYE_NAME, TBD_NAME,
};

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

// ── Logging bootstrap ──────────────────────────────────────────────────

/// Initialize tracing for the surrounding application. With a logs
/// directory, output goes to a daily-rolling file through a non-blocking
/// writer; keep the returned guard alive for as long as logging should
/// flush. Without one, a plain stderr subscriber is installed.
pub fn init_logging(logs_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match logs_dir {
        Some(dir) => {
            fs::create_dir_all(dir).ok();
            let file_appender = tracing_appender::rolling::daily(dir, "bracket-engine.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(non_blocking)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}
