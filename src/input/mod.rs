//! # Input Subsystem
//!
//! Resolves volatile physical controller state into a stable per-tick
//! [`InputVector`](aggregator::InputVector) of semantic channels.
//!
//! The pipeline is strictly layered:
//!
//! 1. [`backend`] polls the platform (gilrs) into plain [`device::DeviceSnapshot`]s
//! 2. [`device`] matches configured logical devices against those snapshots
//! 3. [`mapping`] turns matched axes/buttons into normalized channel values
//! 4. [`keyboard`] supplies the same channels from held keys
//! 5. [`aggregator`] merges both sources into one `InputVector` per tick
//!
//! Everything below the backend is pure and runs without hardware, which is
//! what makes the judgment engine testable.

pub mod aggregator;
pub mod backend;
pub mod device;
pub mod keyboard;
pub mod mapping;

pub use aggregator::{InputAggregator, InputVector};
pub use device::{DeviceSnapshot, Fingerprint};
pub use mapping::{Channel, MappingConfig, MappingConfigV2};
