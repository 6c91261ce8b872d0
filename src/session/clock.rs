//! # Session Clock Module
//!
//! Monotonic elapsed-time source for one training run.
//!
//! Elapsed time is always the difference between the current time-source
//! sample and the sample taken at [`SessionClock::start`], never a
//! frame-by-frame accumulation. A stalled or slow tick therefore never
//! drifts the run clock relative to wall-clock reality.
//!
//! The [`TimeSource`] seam exists so the whole session pipeline runs under
//! synthetic time in tests; production uses [`MonotonicTime`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time provider.
pub trait TimeSource: Send {
    /// Time since an arbitrary fixed origin. Must never go backwards.
    fn now(&self) -> Duration;
}

/// Wall-clock monotonic source backed by [`Instant`].
#[derive(Debug)]
pub struct MonotonicTime {
    origin: Instant,
}

impl MonotonicTime {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTime {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-advanced time source for deterministic tests.
///
/// Clones share the same underlying instant, so a test can hold one handle
/// while the clock owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    micros: Arc<AtomicU64>,
}

impl ManualTime {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward.
    pub fn advance(&self, delta: Duration) {
        self.micros
            .fetch_add(delta.as_micros() as u64, Ordering::SeqCst);
    }

    /// Jumps to an absolute instant.
    pub fn set(&self, at: Duration) {
        self.micros.store(at.as_micros() as u64, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Duration {
        Duration::from_micros(self.micros.load(Ordering::SeqCst))
    }
}

/// Run-scoped stopwatch over a [`TimeSource`].
pub struct SessionClock {
    source: Box<dyn TimeSource>,
    started_at: Option<Duration>,
}

impl std::fmt::Debug for SessionClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClock")
            .field("started_at", &self.started_at)
            .finish()
    }
}

impl SessionClock {
    /// Creates a stopped clock over the given source.
    #[must_use]
    pub fn new(source: Box<dyn TimeSource>) -> Self {
        Self {
            source,
            started_at: None,
        }
    }

    /// Creates a clock over real monotonic time.
    #[must_use]
    pub fn monotonic() -> Self {
        Self::new(Box::new(MonotonicTime::new()))
    }

    /// Samples the source and begins measuring. Restarting an already
    /// running clock re-anchors it at the current sample.
    pub fn start(&mut self) {
        self.started_at = Some(self.source.now());
    }

    /// Stops measuring; `elapsed` reads 0 until the next `start`.
    pub fn stop(&mut self) {
        self.started_at = None;
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Seconds since `start`, 0.0 while stopped. Non-blocking.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        match self.started_at {
            Some(anchor) => (self.source.now().saturating_sub(anchor)).as_secs_f32(),
            None => 0.0,
        }
    }
}
