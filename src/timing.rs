//! Step timing utilities.

use std::time::{Duration, Instant};

use tracing::debug;

/// A simple timer for measuring step durations.
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    /// Start a new timer with the given step name.
    pub fn start(name: &str) -> Self {
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }

    /// Finish the timer, log the elapsed time and return it.
    pub fn finish(self) -> Duration {
        let elapsed = self.start.elapsed();
        let secs = elapsed.as_secs_f64();
        if secs >= 60.0 {
            debug!(step = %self.name, "finished in {:.1}m", secs / 60.0);
        } else {
            debug!(step = %self.name, "finished in {:.1}s", secs);
        }
        elapsed
    }
}
