//! # Heel-Toe Trainer Library
//!
//! Rhythm-style trainer for sim-racing pedal, wheel and shifter inputs.
//!
//! This library resolves physical controller state into semantic channels,
//! schedules timed input targets, and judges the driver's inputs against
//! them with DDR-style timing tiers, combo, and scoring.

pub mod config;
pub mod error;
pub mod input;
pub mod judge;
pub mod notify;
pub mod sequence;
pub mod session;
