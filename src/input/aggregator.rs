//! # Input Aggregator Module
//!
//! Merges physical-device channels and the keyboard fallback into one
//! [`InputVector`] per tick.
//!
//! Per channel, the physical value wins whenever its magnitude clears the
//! deadzone; otherwise the keyboard value substitutes. The aggregator keeps
//! no per-tick counters, so it can be called at arbitrary times without
//! assuming fixed tick spacing.

use crate::input::keyboard::KeyboardMap;
use crate::input::mapping::{Channel, MappingConfigV2};
use crate::input::device::DeviceSnapshot;

/// Unified semantic input state for one tick.
///
/// Produced fresh on every [`InputAggregator::tick`]; never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputVector {
    /// Steering, -1.0 (full left) to 1.0 (full right).
    pub wheel: f32,
    /// Accelerator pedal, 0.0 to 1.0.
    pub accelerator: f32,
    /// Brake pedal, 0.0 to 1.0.
    pub brake: f32,
    /// Clutch pedal, 0.0 to 1.0.
    pub clutch: f32,
    /// Shift-up pressed this tick.
    pub shift_up: bool,
    /// Shift-down pressed this tick.
    pub shift_down: bool,
}

/// Merges mapped device channels with the keyboard fallback.
#[derive(Debug)]
pub struct InputAggregator {
    mapping: MappingConfigV2,
    keyboard: KeyboardMap,
    deadzone: f32,
    keyboard_mode: bool,
}

impl InputAggregator {
    /// Creates an aggregator over a v2 mapping config and a keyboard map.
    #[must_use]
    pub fn new(mapping: MappingConfigV2, keyboard: KeyboardMap, deadzone: f32) -> Self {
        Self {
            mapping,
            keyboard,
            deadzone,
            keyboard_mode: false,
        }
    }

    /// Mutable access to the keyboard map for feeding press/release edges.
    pub fn keyboard_mut(&mut self) -> &mut KeyboardMap {
        &mut self.keyboard
    }

    /// Mutable access to the mapping config (authoring UI).
    pub fn mapping_mut(&mut self) -> &mut MappingConfigV2 {
        &mut self.mapping
    }

    /// Whether progressive keyboard mode is active (zero devices connected).
    ///
    /// Purely a usability affordance for the presentation layer; channel
    /// merging does not depend on it.
    #[must_use]
    pub fn keyboard_mode(&self) -> bool {
        self.keyboard_mode
    }

    /// Produces the unified input vector for this tick.
    ///
    /// Side-effect free beyond reading current device and keyboard state
    /// (and refreshing the keyboard-mode flag).
    pub fn tick(&mut self, connected: &[DeviceSnapshot]) -> InputVector {
        self.keyboard_mode = connected.is_empty();

        InputVector {
            wheel: self.merged(Channel::Wheel, connected),
            accelerator: self.merged(Channel::Accelerator, connected),
            brake: self.merged(Channel::Brake, connected),
            clutch: self.merged(Channel::Clutch, connected),
            shift_up: self.merged(Channel::ShiftUp, connected) >= 0.5,
            shift_down: self.merged(Channel::ShiftDown, connected) >= 0.5,
        }
    }

    /// Physical value if it clears the deadzone, keyboard value otherwise.
    fn merged(&self, channel: Channel, connected: &[DeviceSnapshot]) -> f32 {
        let physical = self.mapping.resolve_channel(channel, connected);
        if physical.abs() > self.deadzone {
            physical
        } else {
            self.keyboard.value_for(channel)
        }
    }
}
