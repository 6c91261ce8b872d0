//! # Training Session Module
//!
//! Owns one run: the clock, the target sequence, and the judgment engine,
//! driven by the host's tick loop.
//!
//! Completion is derived, never stored: the run is complete once the clock
//! passes the sequence's total duration. Stopping a run resets target,
//! combo, and score state in one bulk operation so a restart begins clean.

use tracing::debug;

use crate::input::InputVector;
use crate::judge::{JudgmentEngine, JudgmentSettings, RunSummary};
use crate::notify::JudgmentSink;
use crate::sequence::TargetSequence;
use crate::session::clock::SessionClock;

/// One training run from start to summary.
#[derive(Debug)]
pub struct TrainingSession {
    clock: SessionClock,
    sequence: TargetSequence,
    engine: JudgmentEngine,
}

impl TrainingSession {
    /// Assembles a session over a validated sequence.
    #[must_use]
    pub fn new(settings: JudgmentSettings, sequence: TargetSequence, clock: SessionClock) -> Self {
        Self {
            clock,
            sequence,
            engine: JudgmentEngine::new(settings),
        }
    }

    /// Starts (or restarts) the run clock.
    pub fn start(&mut self) {
        debug!(
            targets = self.sequence.len(),
            duration_s = self.sequence.total_duration,
            "session started"
        );
        self.clock.start();
    }

    /// Seconds into the run, 0.0 before `start`.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.clock.elapsed()
    }

    /// Whether the clock has passed the sequence's total duration.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.clock.is_running() && self.clock.elapsed() >= self.sequence.total_duration
    }

    #[must_use]
    pub fn sequence(&self) -> &TargetSequence {
        &self.sequence
    }

    /// Runs one judgment pass and fans resolved targets out to the sink.
    pub fn tick(&mut self, input: &InputVector, sink: &mut dyn JudgmentSink) {
        if !self.clock.is_running() {
            return;
        }
        let elapsed = self.clock.elapsed();
        let events = self.engine.evaluate(&mut self.sequence, input, elapsed);
        for event in &events {
            sink.on_judgment(event);
        }
    }

    /// Stops the run and bulk-resets all per-run state for a clean restart.
    pub fn stop(&mut self) {
        self.clock.stop();
        self.sequence.reset();
        self.engine.reset();
    }

    /// Results accumulated so far.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        self.engine.summary()
    }
}
