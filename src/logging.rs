//! Rate-limited diagnostics.
//!
//! Per-frame code paths would flood the log at 90 Hz, so every diagnostic goes
//! through a [`LogLimiter`] keyed by a short static string.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default interval between two log lines sharing a key.
pub const DEFAULT_LOG_INTERVAL_MS: u64 = 500;

/// Allows a log key through at most once per interval.
#[derive(Debug, Default)]
pub struct LogLimiter {
    next_allowed: Mutex<HashMap<String, Instant>>,
}

impl LogLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `key` against the wall clock.
    pub fn allow(&self, key: &str, every: Duration) -> bool {
        self.allow_at(key, every, Instant::now())
    }

    /// Check `key` at an explicit instant (used by tests and replay).
    pub fn allow_at(&self, key: &str, every: Duration, now: Instant) -> bool {
        let mut next_allowed = self.next_allowed.lock();
        if let Some(next) = next_allowed.get(key) {
            if now < *next {
                return false;
            }
        }

        next_allowed.insert(key.to_string(), now + every);
        true
    }

    /// Forget every key, letting the next call for each pass immediately.
    pub fn reset(&self) {
        self.next_allowed.lock().clear();
    }
}

/// Initialize the `env_logger` backend. Honours `RUST_LOG`; `verbose` raises the default to debug.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env = env_logger::Env::default().default_filter_or(default_level);
    // A second init (tests, embedding hosts) is harmless.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}
