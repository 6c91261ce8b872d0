//! # Session Subsystem
//!
//! Run lifecycle: the monotonic [`clock`] and the [`runner`] that drives the
//! judgment engine from the host tick loop.

pub mod clock;
pub mod runner;

pub use clock::{ManualTime, MonotonicTime, SessionClock, TimeSource};
pub use runner::TrainingSession;
