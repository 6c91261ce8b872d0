//! # Controller Backend Module
//!
//! Polls the platform gamepad layer (gilrs) into plain [`DeviceSnapshot`]s.
//!
//! This is the only module that touches hardware. Everything downstream
//! consumes snapshots through the [`SnapshotSource`] trait, so the registry,
//! mapper, and judgment engine run unchanged against synthetic devices in
//! tests.
//!
//! Axis and button enumeration order is fixed by the [`AXES`] and [`BUTTONS`]
//! tables below; gilrs guarantees stable codes per device model, which is
//! what makes the persisted fingerprints meaningful.

use gilrs::{Axis, Button, Gilrs};
use tracing::{debug, warn};

use crate::input::device::DeviceSnapshot;

/// Axis enumeration order for snapshots.
pub const AXES: [Axis; 6] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::RightStickX,
    Axis::RightStickY,
    Axis::LeftZ,
    Axis::RightZ,
];

/// Button enumeration order for snapshots.
pub const BUTTONS: [Button; 14] = [
    Button::South,
    Button::East,
    Button::North,
    Button::West,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadDown,
];

/// Source of per-tick device snapshots.
///
/// Implemented by the gilrs backend in production and by in-memory fakes in
/// tests.
pub trait SnapshotSource {
    /// Returns the current snapshot of every connected device.
    ///
    /// Non-blocking; called once per tick.
    fn poll(&mut self) -> Vec<DeviceSnapshot>;
}

/// gilrs-backed snapshot source.
pub struct GilrsSource {
    gilrs: Gilrs,
}

impl GilrsSource {
    /// Opens the platform gamepad layer.
    ///
    /// # Errors
    ///
    /// Returns a boxed gilrs error when the platform layer cannot be
    /// initialized (e.g. no input subsystem available).
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let gilrs = Gilrs::new().map_err(|e| {
            warn!("failed to initialize gamepad backend: {}", e);
            Box::new(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
        })?;
        Ok(Self { gilrs })
    }
}

impl SnapshotSource for GilrsSource {
    fn poll(&mut self) -> Vec<DeviceSnapshot> {
        // Drain pending events so gilrs's cached gamepad state is current.
        while let Some(event) = self.gilrs.next_event() {
            debug!("gamepad event: {:?}", event.event);
        }

        self.gilrs
            .gamepads()
            .map(|(_, gamepad)| DeviceSnapshot {
                name: gamepad.name().to_string(),
                axes: AXES.iter().map(|&axis| gamepad.value(axis)).collect(),
                buttons: BUTTONS
                    .iter()
                    .map(|&button| gamepad.is_pressed(button))
                    .collect(),
            })
            .collect()
    }
}

/// Snapshot source for keyboard-only operation (no gamepad layer).
#[derive(Debug, Default)]
pub struct NullSource;

impl SnapshotSource for NullSource {
    fn poll(&mut self) -> Vec<DeviceSnapshot> {
        Vec::new()
    }
}
