//! # Channel Mapper Module
//!
//! Maps physical axes and buttons of resolved devices to the six semantic
//! channels the trainer understands.
//!
//! ## Source index encoding
//!
//! A mapping's source index addresses an axis when non-negative and a button
//! when negative: `button_index = -source - 1`. Index `-1` is button 0.
//!
//! ## Normalization
//!
//! | Channel | Raw axis range | Output |
//! |---------|----------------|--------|
//! | wheel | -1.0..1.0 | kept as -1.0..1.0 |
//! | accelerator / brake / clutch | -1.0..1.0 | `(raw + 1) / 2` → 0.0..1.0 |
//! | any (button source) | pressed / released | 1.0 / 0.0 |
//!
//! `invert` negates the wheel and computes `1 - v` everywhere else.
//!
//! ## Config versions
//!
//! The persisted mapping config exists in two versions: v1 keys mappings by
//! raw device index (fragile across re-enumeration), v2 by stable device key.
//! [`MappingConfigV1::migrate`] is a pure, total upgrade: entries whose index
//! has no live device are dropped with a warning and everything else is
//! re-keyed, fingerprinted, and never touched again.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use crate::error::{Result, TrainerError};
use crate::input::device::{self, DeviceSnapshot, Fingerprint};

/// Semantic input channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Wheel,
    Accelerator,
    Brake,
    Clutch,
    ShiftUp,
    ShiftDown,
}

impl Channel {
    /// All channels, in resolution order.
    pub const ALL: [Channel; 6] = [
        Channel::Wheel,
        Channel::Accelerator,
        Channel::Brake,
        Channel::Clutch,
        Channel::ShiftUp,
        Channel::ShiftDown,
    ];

    /// Whether this channel carries a continuous value rather than an edge.
    #[must_use]
    pub fn is_analog(self) -> bool {
        !matches!(self, Channel::ShiftUp | Channel::ShiftDown)
    }
}

/// One axis/button-to-channel assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisMapping {
    /// Target semantic channel.
    #[serde(rename = "type")]
    pub channel: Channel,
    /// Invert the normalized value.
    #[serde(default)]
    pub invert: bool,
}

/// Per-device mapping entry in a v2 config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceEntry {
    /// Source index (as a string key) to channel assignment.
    #[serde(default)]
    pub axes: BTreeMap<String, AxisMapping>,
    /// Index the device occupied when the mapping was last authored.
    #[serde(rename = "_lastKnownIndex", default, skip_serializing_if = "Option::is_none")]
    pub last_known_index: Option<usize>,
    /// Capability fingerprint captured at authoring time.
    #[serde(rename = "_fingerprint", default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
}

/// Legacy index-keyed mapping config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingConfigV1 {
    /// Legacy coarse device-type assignment, preserved for round-tripping.
    #[serde(rename = "deviceAssignments", default)]
    pub device_assignments: BTreeMap<String, String>,
    /// Mappings keyed by raw device index, then by source index.
    #[serde(rename = "axisMappings", default)]
    pub axis_mappings: BTreeMap<String, BTreeMap<String, AxisMapping>>,
}

/// Stable key-keyed mapping config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingConfigV2 {
    /// Mappings keyed by stable device key.
    #[serde(rename = "axisMappings", default)]
    pub axis_mappings: BTreeMap<String, DeviceEntry>,
}

/// Versioned mapping configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum MappingConfig {
    V1(MappingConfigV1),
    V2(MappingConfigV2),
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

#[derive(Serialize)]
struct Versioned<'a, T: Serialize> {
    version: u32,
    #[serde(flatten)]
    body: &'a T,
}

impl MappingConfig {
    /// Parses a persisted mapping config, dispatching on its `version` field.
    ///
    /// # Errors
    ///
    /// Returns [`TrainerError::Mapping`] for malformed JSON or an unknown
    /// version.
    pub fn from_json(json: &str) -> Result<Self> {
        let probe: VersionProbe =
            serde_json::from_str(json).map_err(|e| TrainerError::Mapping(e.to_string()))?;
        match probe.version {
            1 => Ok(Self::V1(
                serde_json::from_str(json).map_err(|e| TrainerError::Mapping(e.to_string()))?,
            )),
            2 => Ok(Self::V2(
                serde_json::from_str(json).map_err(|e| TrainerError::Mapping(e.to_string()))?,
            )),
            other => Err(TrainerError::Mapping(format!(
                "unsupported mapping config version {other}"
            ))),
        }
    }

    /// Serializes the config with its version tag.
    ///
    /// # Errors
    ///
    /// Returns [`TrainerError::Mapping`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        let json = match self {
            Self::V1(v1) => serde_json::to_string(&Versioned { version: 1, body: v1 }),
            Self::V2(v2) => serde_json::to_string(&Versioned { version: 2, body: v2 }),
        };
        json.map_err(|e| TrainerError::Mapping(e.to_string()))
    }

    /// Returns a v2 config, migrating a v1 config against the live device
    /// list if needed. Already-v2 configs pass through untouched, so the
    /// upgrade runs at most once per config lifetime.
    #[must_use]
    pub fn into_v2(self, connected: &[DeviceSnapshot]) -> MappingConfigV2 {
        match self {
            Self::V1(v1) => v1.migrate(connected),
            Self::V2(v2) => v2,
        }
    }
}

impl MappingConfigV1 {
    /// Pure, total migration to a v2 config.
    ///
    /// Each index-keyed entry is re-keyed under the stable key of the device
    /// currently at that index; per-axis mappings are preserved and a
    /// fingerprint is captured. Entries whose index has no live device are
    /// dropped with a warning; the rest of the migration proceeds.
    #[must_use]
    pub fn migrate(&self, connected: &[DeviceSnapshot]) -> MappingConfigV2 {
        let mut v2 = MappingConfigV2::default();

        for (index_key, axes) in &self.axis_mappings {
            let index = match index_key.parse::<usize>() {
                Ok(index) => index,
                Err(_) => {
                    warn!("dropping v1 mapping entry with bad index key {:?}", index_key);
                    continue;
                }
            };

            let Some(key) = device::key_for(connected, index) else {
                warn!(
                    "dropping v1 mapping entry for index {}: no device connected there",
                    index
                );
                continue;
            };

            let used_axes: BTreeSet<usize> = axes
                .keys()
                .filter_map(|k| k.parse::<i32>().ok())
                .filter(|&s| s >= 0)
                .map(|s| s as usize)
                .collect();

            v2.axis_mappings.insert(
                key,
                DeviceEntry {
                    axes: axes.clone(),
                    last_known_index: Some(index),
                    fingerprint: Some(Fingerprint::of(&connected[index], used_axes)),
                },
            );
        }

        v2
    }
}

impl MappingConfigV2 {
    /// Assigns a channel to a device source, enforcing the config invariants:
    /// at most one mapping per channel across all devices, and at most one
    /// channel per (device, source index).
    ///
    /// `last_known_index` and the fingerprint are refreshed opportunistically
    /// here, at authoring time, never on the poll path.
    pub fn assign(
        &mut self,
        connected: &[DeviceSnapshot],
        device_index: usize,
        source: i32,
        channel: Channel,
        invert: bool,
    ) {
        let Some(key) = device::key_for(connected, device_index) else {
            warn!("cannot assign {:?}: no device at index {}", channel, device_index);
            return;
        };

        // One live mapping per channel across all devices.
        for entry in self.axis_mappings.values_mut() {
            entry.axes.retain(|_, m| m.channel != channel);
        }
        self.axis_mappings.retain(|_, entry| !entry.axes.is_empty());

        let entry = self.axis_mappings.entry(key).or_default();
        entry
            .axes
            .insert(source.to_string(), AxisMapping { channel, invert });
        entry.last_known_index = Some(device_index);

        let used_axes: BTreeSet<usize> = entry
            .axes
            .keys()
            .filter_map(|k| k.parse::<i32>().ok())
            .filter(|&s| s >= 0)
            .map(|s| s as usize)
            .collect();
        entry.fingerprint = Some(Fingerprint::of(&connected[device_index], used_axes));
    }

    /// Resolves a semantic channel to its current normalized value.
    ///
    /// The first mapping for the channel whose device resolves wins (the
    /// assignment invariant keeps at most one live anyway). Returns 0.0 when
    /// no mapping resolves; an unplugged controller is not an error.
    #[must_use]
    pub fn resolve_channel(&self, channel: Channel, connected: &[DeviceSnapshot]) -> f32 {
        for (key, entry) in &self.axis_mappings {
            for (source_key, mapping) in &entry.axes {
                if mapping.channel != channel {
                    continue;
                }
                let Ok(source) = source_key.parse::<i32>() else {
                    continue;
                };
                let Some(snapshot) = device::resolve(key, entry.fingerprint.as_ref(), connected)
                else {
                    continue;
                };
                if let Some(value) = read_source(snapshot, source, channel, mapping.invert) {
                    return value;
                }
            }
        }
        0.0
    }
}

/// Reads and normalizes one source on a resolved snapshot.
///
/// Returns `None` when the source index is out of range for the device.
fn read_source(
    snapshot: &DeviceSnapshot,
    source: i32,
    channel: Channel,
    invert: bool,
) -> Option<f32> {
    if source >= 0 {
        let raw = *snapshot.axes.get(source as usize)?;
        let value = match channel {
            Channel::Wheel => {
                let v = raw.clamp(-1.0, 1.0);
                if invert { -v } else { v }
            }
            _ => {
                let v = ((raw + 1.0) / 2.0).clamp(0.0, 1.0);
                if invert { 1.0 - v } else { v }
            }
        };
        Some(value)
    } else {
        let button_index = (-source - 1) as usize;
        let pressed = *snapshot.buttons.get(button_index)?;
        let v = if pressed { 1.0 } else { 0.0 };
        let value = match channel {
            Channel::Wheel => {
                if invert { -v } else { v }
            }
            _ => {
                if invert { 1.0 - v } else { v }
            }
        };
        Some(value)
    }
}
