//! Event debouncing for asset watching.
//!
//! Build tools and editors often emit several events per save (truncate,
//! write, rename). Each event pushes the path's deadline back, so a burst
//! collapses into a single reload once the file has been quiet for the
//! debounce window.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Thread-safe per-path debouncer.
pub(crate) struct EventDebouncer {
    pending: Mutex<HashMap<PathBuf, Instant>>,
    window: Duration,
}

impl EventDebouncer {
    /// Create a new debouncer with the specified quiet window.
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            window,
        }
    }

    /// Record a change to `path`, restarting its quiet window.
    pub(crate) fn record(&self, path: PathBuf) {
        let deadline = Instant::now() + self.window;
        self.lock().insert(path, deadline);
    }

    /// Drain paths whose quiet window has elapsed.
    pub(crate) fn drain_ready(&self) -> Vec<PathBuf> {
        let now = Instant::now();
        let mut pending = self.lock();
        let mut ready = Vec::new();
        pending.retain(|path, deadline| {
            if *deadline <= now {
                ready.push(path.clone());
                false
            } else {
                true
            }
        });
        ready
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Instant>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
