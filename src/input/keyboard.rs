//! # Keyboard Fallback Module
//!
//! Supplies the semantic channels from held keys when no physical device
//! backs them.
//!
//! The map is an explicitly constructed service: bindings and the
//! pressed-key set live on the [`KeyboardMap`] instance handed to the
//! aggregator, never in module-level state. Press/release edges are fed in
//! by the host window layer; reads are pure.
//!
//! Wheel is the only directional channel: pressed wheel keys *sum* their
//! signed contributions (left+right held together cancel out) and clamp to
//! -1.0..1.0. Every other channel takes the *maximum* contribution among its
//! pressed keys.

use std::collections::{HashMap, HashSet};

use crate::input::mapping::Channel;

/// Host key code. The trainer does not interpret these beyond identity.
pub type KeyCode = u32;

/// Conventional key codes for the default layout.
pub mod keys {
    use super::KeyCode;

    /// Left arrow - steer left
    pub const ARROW_LEFT: KeyCode = 37;
    /// Up arrow - accelerator
    pub const ARROW_UP: KeyCode = 38;
    /// Right arrow - steer right
    pub const ARROW_RIGHT: KeyCode = 39;
    /// Down arrow - brake
    pub const ARROW_DOWN: KeyCode = 40;
    /// A - shift down
    pub const KEY_A: KeyCode = 65;
    /// S - shift up
    pub const KEY_S: KeyCode = 83;
    /// C - clutch
    pub const KEY_C: KeyCode = 67;
}

/// One key-to-channel binding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyBinding {
    /// Target semantic channel.
    pub channel: Channel,
    /// Contribution while held: signed for wheel, 0.0..1.0 elsewhere.
    pub contribution: f32,
}

/// Held-key-to-channel table plus the set of currently-pressed keys.
#[derive(Debug, Clone, Default)]
pub struct KeyboardMap {
    bindings: HashMap<KeyCode, KeyBinding>,
    pressed: HashSet<KeyCode>,
}

impl KeyboardMap {
    /// Creates an empty keyboard map with no bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the default arrow-key layout.
    #[must_use]
    pub fn default_layout() -> Self {
        let mut map = Self::new();
        map.bind(keys::ARROW_LEFT, Channel::Wheel, -1.0);
        map.bind(keys::ARROW_RIGHT, Channel::Wheel, 1.0);
        map.bind(keys::ARROW_UP, Channel::Accelerator, 1.0);
        map.bind(keys::ARROW_DOWN, Channel::Brake, 1.0);
        map.bind(keys::KEY_C, Channel::Clutch, 1.0);
        map.bind(keys::KEY_S, Channel::ShiftUp, 1.0);
        map.bind(keys::KEY_A, Channel::ShiftDown, 1.0);
        map
    }

    /// Binds a key to a channel with the given held contribution.
    pub fn bind(&mut self, code: KeyCode, channel: Channel, contribution: f32) {
        self.bindings.insert(
            code,
            KeyBinding {
                channel,
                contribution,
            },
        );
    }

    /// Records a key-down edge.
    pub fn key_down(&mut self, code: KeyCode) {
        self.pressed.insert(code);
    }

    /// Records a key-up edge.
    pub fn key_up(&mut self, code: KeyCode) {
        self.pressed.remove(&code);
    }

    /// Releases all keys (focus loss, run reset).
    pub fn release_all(&mut self) {
        self.pressed.clear();
    }

    /// Current value for a channel from held keys alone.
    #[must_use]
    pub fn value_for(&self, channel: Channel) -> f32 {
        let contributions = self
            .pressed
            .iter()
            .filter_map(|code| self.bindings.get(code))
            .filter(|binding| binding.channel == channel)
            .map(|binding| binding.contribution);

        match channel {
            Channel::Wheel => contributions.sum::<f32>().clamp(-1.0, 1.0),
            _ => contributions.fold(0.0, f32::max),
        }
    }
}
