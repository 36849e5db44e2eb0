//! Iteration and wall-clock budget shared by the engines.

use std::time::{Duration, Instant};

/// Cooperative work budget
///
/// Engines `charge` one unit per push or outer iteration and poll
/// `exhausted` between units, so a timeout is honored within one unit of
/// work.
#[derive(Debug, Clone)]
pub struct Budget {
    max_steps: usize,
    max_time: Duration,
    started: Instant,
    steps: usize,
}

impl Budget {
    /// `max_seconds` that is negative, NaN or too large to represent means
    /// no wall-clock limit.
    pub fn new(max_steps: usize, max_seconds: f64) -> Self {
        Self {
            max_steps,
            max_time: Duration::try_from_secs_f64(max_seconds).unwrap_or(Duration::MAX),
            started: Instant::now(),
            steps: 0,
        }
    }

    #[inline]
    pub fn charge(&mut self) {
        self.steps += 1;
    }

    #[inline]
    pub fn exhausted(&self) -> bool {
        self.steps >= self.max_steps || self.started.elapsed() >= self.max_time
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
