//! # Notification Module
//!
//! Fan-out seam for resolved judgments. Audio and UI collaborators implement
//! [`JudgmentSink`]; the session loop calls it fire-and-forget, once per
//! resolved target, and a sink must never block the tick.

use tracing::info;

use crate::judge::JudgmentEvent;

/// Receiver for judgment events.
pub trait JudgmentSink {
    /// Called once per resolved (hit or missed) target.
    fn on_judgment(&mut self, event: &JudgmentEvent);
}

/// Sink that logs each judgment through tracing.
#[derive(Debug, Default)]
pub struct LogSink;

impl JudgmentSink for LogSink {
    fn on_judgment(&mut self, event: &JudgmentEvent) {
        info!(
            target_id = event.target_id,
            lane = ?event.lane,
            tier = ?event.tier,
            delta_ms = (event.delta_t * 1000.0) as i64,
            "judgment"
        );
    }
}

/// Sink that discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl JudgmentSink for NullSink {
    fn on_judgment(&mut self, _event: &JudgmentEvent) {}
}
