//! # Device Registry Module
//!
//! Resolves configured logical devices against the currently-connected raw
//! controller snapshots.
//!
//! ## Logical identity
//!
//! A logical device is keyed by its platform name. Two identical wheels both
//! reporting `"SimJack"` are disambiguated by a slot suffix (`"SimJack #2"`).
//! OS re-enumeration reorders slots but does not change a device's
//! capabilities, so a persisted [`Fingerprint`] (axis count, button count) is
//! preferred over positional lookup when a slot suffix is present.
//!
//! ## Failure semantics
//!
//! Resolution is pure and never errors: an unplugged or unmatched device
//! simply resolves to `None` and the channel it backs reads as 0.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Raw snapshot of one connected controller, as reported by the backend.
///
/// Axis values are already normalized to -1.0..1.0. Axis and button order is
/// stable for a given device model, which is what the fingerprint relies on.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    /// Platform-reported device name (not unique across identical hardware).
    pub name: String,
    /// Normalized axis values in enumeration order.
    pub axes: Vec<f32>,
    /// Button pressed-states in enumeration order.
    pub buttons: Vec<bool>,
}

impl DeviceSnapshot {
    /// Creates a snapshot with the given name and centered/released inputs.
    #[must_use]
    pub fn new(name: impl Into<String>, axis_count: usize, button_count: usize) -> Self {
        Self {
            name: name.into(),
            axes: vec![0.0; axis_count],
            buttons: vec![false; button_count],
        }
    }
}

/// Capability fingerprint used to disambiguate identically-named devices.
///
/// Persisted alongside the mapping config when a mapping is authored and
/// compared against live snapshots on every resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Number of axes the device reported when the mapping was authored.
    pub axis_count: usize,
    /// Number of buttons the device reported when the mapping was authored.
    pub button_count: usize,
    /// Axis indices actually referenced by mappings on this device.
    #[serde(default)]
    pub used_axes: BTreeSet<usize>,
}

impl Fingerprint {
    /// Captures a fingerprint from a live snapshot.
    #[must_use]
    pub fn of(snapshot: &DeviceSnapshot, used_axes: BTreeSet<usize>) -> Self {
        Self {
            axis_count: snapshot.axes.len(),
            button_count: snapshot.buttons.len(),
            used_axes,
        }
    }

    /// Checks whether a live snapshot reports exactly the fingerprinted counts.
    #[must_use]
    pub fn matches(&self, snapshot: &DeviceSnapshot) -> bool {
        snapshot.axes.len() == self.axis_count && snapshot.buttons.len() == self.button_count
    }
}

/// A parsed device key: base platform name plus optional 1-based slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceKey<'a> {
    /// Platform name without the slot suffix.
    pub base: &'a str,
    /// 1-based slot among identically-named devices, if the key carries one.
    pub slot: Option<usize>,
}

impl<'a> DeviceKey<'a> {
    /// Parses a device key, splitting off a `" #<n>"` slot suffix if present.
    ///
    /// A suffix that does not parse as a positive integer is treated as part
    /// of the name.
    #[must_use]
    pub fn parse(key: &'a str) -> Self {
        if let Some(pos) = key.rfind(" #") {
            let (base, suffix) = key.split_at(pos);
            if let Ok(slot) = suffix[2..].parse::<usize>() {
                if slot >= 1 {
                    return Self {
                        base,
                        slot: Some(slot),
                    };
                }
            }
        }
        Self { base: key, slot: None }
    }
}

/// Builds the stable key for the device at `index` in the connected list.
///
/// The first device with a given name keeps the bare name; further devices
/// with the same name get a 1-based slot suffix (`"SimJack #2"`), counted in
/// enumeration order.
#[must_use]
pub fn key_for(connected: &[DeviceSnapshot], index: usize) -> Option<String> {
    let device = connected.get(index)?;
    let slot = connected[..index]
        .iter()
        .filter(|d| d.name == device.name)
        .count()
        + 1;
    if slot == 1 {
        Some(device.name.clone())
    } else {
        Some(format!("{} #{}", device.name, slot))
    }
}

/// Resolves a configured device key to a currently-connected snapshot.
///
/// Candidates are the connected devices whose platform name equals the key's
/// base name. Without a slot suffix the first candidate wins. With a slot
/// suffix, the fingerprint acts as a filter over the candidates: a unique
/// capability match wins outright (this is what survives re-enumeration),
/// while several identical matches fall back to the slot position among
/// them, so two indistinguishable wheels stay addressable as distinct
/// devices. Without any fingerprint match, positional lookup among all
/// same-named candidates is the last resort.
///
/// Returns `None` when nothing matches; callers treat the channel as 0.
#[must_use]
pub fn resolve<'a>(
    key: &str,
    fingerprint: Option<&Fingerprint>,
    connected: &'a [DeviceSnapshot],
) -> Option<&'a DeviceSnapshot> {
    let parsed = DeviceKey::parse(key);
    let mut candidates = connected.iter().filter(|d| d.name == parsed.base);

    match parsed.slot {
        None => candidates.next(),
        Some(slot) => {
            if let Some(fp) = fingerprint {
                let matching: Vec<&DeviceSnapshot> = connected
                    .iter()
                    .filter(|d| d.name == parsed.base && fp.matches(d))
                    .collect();
                match matching.len() {
                    1 => return Some(matching[0]),
                    n if n >= slot => return Some(matching[slot - 1]),
                    _ => {}
                }
            }
            candidates.nth(slot - 1)
        }
    }
}
