//! # Target Sequence Module
//!
//! The scheduled input pattern for one training run: four independent lanes
//! of timed targets (brake, wheel, accelerator, and a shared shifter lane).
//!
//! ## Invariants
//!
//! Within a lane, target times are non-decreasing and consecutive targets do
//! not overlap (`prev.time + prev.duration <= curr.time`). Cross-lane overlap
//! is explicitly permitted: simultaneous brake + wheel targets are how
//! trail-braking is modelled.
//!
//! A target transitions `Pending -> Hit` or `Pending -> Missed` exactly once;
//! [`Target::resolve`] is guarded so a second transition is a silent no-op,
//! never an error. [`TargetSequence::reset`] bulk-restores every target to
//! `Pending` so a restarted run begins clean.

pub mod file;
pub mod generator;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrainerError};
use crate::judge::Tier;

/// One of the four independent target tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    Brake,
    Wheel,
    Accel,
    ShiftUp,
    ShiftDown,
}

impl Lane {
    /// Whether targets on this lane carry a continuous value band.
    #[must_use]
    pub fn is_continuous(self) -> bool {
        !matches!(self, Lane::ShiftUp | Lane::ShiftDown)
    }
}

/// Lifecycle state of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Pending,
    Hit,
    Missed,
}

/// A single scheduled expected-input event.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// Unique within the sequence.
    pub id: u32,
    pub lane: Lane,
    /// Seconds from run start.
    pub time: f32,
    /// Seconds the target stays displayed/active.
    pub duration: f32,
    /// Percent 0-100 for brake/accel, degrees -175..175 for wheel,
    /// unused for shift lanes.
    pub value: f32,
    pub state: TargetState,
    /// Tier assigned when the target resolved, `None` while pending.
    pub judgment: Option<Tier>,
}

impl Target {
    /// Creates a pending target.
    #[must_use]
    pub fn new(id: u32, lane: Lane, time: f32, duration: f32, value: f32) -> Self {
        Self {
            id,
            lane,
            time,
            duration,
            value,
            state: TargetState::Pending,
            judgment: None,
        }
    }

    /// Applies a judgment, transitioning out of `Pending` exactly once.
    ///
    /// Returns `true` if the transition happened. A target that is already
    /// `Hit` or `Missed` is left untouched, so repeated lane passes cannot
    /// double-count it.
    pub fn resolve(&mut self, tier: Tier) -> bool {
        if self.state != TargetState::Pending {
            return false;
        }
        self.state = if tier == Tier::Miss {
            TargetState::Missed
        } else {
            TargetState::Hit
        };
        self.judgment = Some(tier);
        true
    }

    /// Restores the target to its pre-run state.
    pub fn reset(&mut self) {
        self.state = TargetState::Pending;
        self.judgment = None;
    }
}

/// Ordered per-lane target lists plus the total run duration.
///
/// Shift-up and shift-down targets share one list; the judgment engine
/// filters by lane when it needs one shift direction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetSequence {
    pub brake: Vec<Target>,
    pub wheel: Vec<Target>,
    pub accel: Vec<Target>,
    pub shift: Vec<Target>,
    /// Seconds from run start after which the run is complete.
    pub total_duration: f32,
}

impl TargetSequence {
    /// Builds a sequence from an unordered target list and validates it.
    ///
    /// `duration` overrides the computed total when given; otherwise the
    /// total is the end of the last target.
    ///
    /// # Errors
    ///
    /// Returns [`TrainerError::Sequence`] when any lane violates ordering or
    /// overlap invariants. No partial sequence is ever returned.
    pub fn from_targets(targets: Vec<Target>, duration: Option<f32>) -> Result<Self> {
        let mut sequence = Self::default();
        let mut end: f32 = 0.0;

        for target in targets {
            end = end.max(target.time + target.duration);
            match target.lane {
                Lane::Brake => sequence.brake.push(target),
                Lane::Wheel => sequence.wheel.push(target),
                Lane::Accel => sequence.accel.push(target),
                Lane::ShiftUp | Lane::ShiftDown => sequence.shift.push(target),
            }
        }

        sequence.total_duration = duration.unwrap_or(end);
        sequence.validate()?;
        Ok(sequence)
    }

    /// Checks the per-lane ordering and non-overlap invariants.
    ///
    /// # Errors
    ///
    /// Returns [`TrainerError::Sequence`] naming the offending lane and
    /// target pair.
    pub fn validate(&self) -> Result<()> {
        validate_lane("brake", &self.brake)?;
        validate_lane("wheel", &self.wheel)?;
        validate_lane("accel", &self.accel)?;
        validate_lane("shift", &self.shift)?;
        Ok(())
    }

    /// All lanes in judgment order: brake, wheel, accel, shift.
    pub fn lanes(&self) -> [&[Target]; 4] {
        [&self.brake, &self.wheel, &self.accel, &self.shift]
    }

    /// Total number of targets across all lanes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.brake.len() + self.wheel.len() + self.accel.len() + self.shift.len()
    }

    /// Whether the sequence holds no targets at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bulk-restores every target to `Pending` for a clean restart.
    pub fn reset(&mut self) {
        for lane in [
            &mut self.brake,
            &mut self.wheel,
            &mut self.accel,
            &mut self.shift,
        ] {
            for target in lane.iter_mut() {
                target.reset();
            }
        }
    }
}

fn validate_lane(name: &str, targets: &[Target]) -> Result<()> {
    for pair in targets.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        if curr.time < prev.time {
            return Err(TrainerError::Sequence(format!(
                "{} lane targets out of order: {:.3}s after {:.3}s",
                name, curr.time, prev.time
            )));
        }
        if prev.time + prev.duration > curr.time {
            return Err(TrainerError::Sequence(format!(
                "{} lane targets overlap: target at {:.3}s (duration {:.3}s) runs into target at {:.3}s",
                name, prev.time, prev.duration, curr.time
            )));
        }
    }
    for target in targets {
        if target.duration <= 0.0 {
            return Err(TrainerError::Sequence(format!(
                "{} lane target at {:.3}s has non-positive duration",
                name, target.time
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(id: u32, lane: Lane, time: f32, duration: f32) -> Target {
        Target::new(id, lane, time, duration, 50.0)
    }

    // ==================== Target Lifecycle Tests ====================

    #[test]
    fn test_new_target_is_pending() {
        let t = target(0, Lane::Brake, 1.0, 0.5);
        assert_eq!(t.state, TargetState::Pending);
        assert_eq!(t.judgment, None);
    }

    #[test]
    fn test_resolve_hit() {
        let mut t = target(0, Lane::Brake, 1.0, 0.5);
        assert!(t.resolve(Tier::Great));
        assert_eq!(t.state, TargetState::Hit);
        assert_eq!(t.judgment, Some(Tier::Great));
    }

    #[test]
    fn test_resolve_miss() {
        let mut t = target(0, Lane::Brake, 1.0, 0.5);
        assert!(t.resolve(Tier::Miss));
        assert_eq!(t.state, TargetState::Missed);
        assert_eq!(t.judgment, Some(Tier::Miss));
    }

    #[test]
    fn test_second_resolve_is_noop() {
        let mut t = target(0, Lane::Brake, 1.0, 0.5);
        assert!(t.resolve(Tier::Perfect));
        // A later pass trying to miss the same target must not stick.
        assert!(!t.resolve(Tier::Miss));
        assert_eq!(t.state, TargetState::Hit);
        assert_eq!(t.judgment, Some(Tier::Perfect));
    }

    #[test]
    fn test_reset_restores_pending() {
        let mut t = target(0, Lane::Brake, 1.0, 0.5);
        t.resolve(Tier::Ok);
        t.reset();
        assert_eq!(t.state, TargetState::Pending);
        assert_eq!(t.judgment, None);
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_adjacent_targets_load() {
        // [{time:1,duration:1},{time:2,duration:1}] touches exactly and is fine.
        let seq = TargetSequence::from_targets(
            vec![target(0, Lane::Brake, 1.0, 1.0), target(1, Lane::Brake, 2.0, 1.0)],
            None,
        );
        assert!(seq.is_ok());
    }

    #[test]
    fn test_overlapping_targets_rejected() {
        // [{time:1,duration:2},{time:2,duration:1}]: 1+2=3 > 2.
        let seq = TargetSequence::from_targets(
            vec![target(0, Lane::Brake, 1.0, 2.0), target(1, Lane::Brake, 2.0, 1.0)],
            None,
        );
        assert!(seq.is_err());
    }

    #[test]
    fn test_out_of_order_targets_rejected() {
        let seq = TargetSequence::from_targets(
            vec![target(0, Lane::Brake, 3.0, 0.5), target(1, Lane::Brake, 1.0, 0.5)],
            None,
        );
        assert!(seq.is_err());
    }

    #[test]
    fn test_cross_lane_overlap_is_allowed() {
        // Simultaneous brake + wheel is the trail-braking case.
        let seq = TargetSequence::from_targets(
            vec![target(0, Lane::Brake, 1.0, 2.0), target(1, Lane::Wheel, 1.0, 2.0)],
            None,
        );
        assert!(seq.is_ok());
    }

    #[test]
    fn test_shift_lanes_share_a_list() {
        let seq = TargetSequence::from_targets(
            vec![
                target(0, Lane::ShiftUp, 1.0, 0.1),
                target(1, Lane::ShiftDown, 2.0, 0.1),
            ],
            None,
        )
        .unwrap();
        assert_eq!(seq.shift.len(), 2);
    }

    #[test]
    fn test_shift_lanes_overlap_rejected_within_shared_list() {
        let seq = TargetSequence::from_targets(
            vec![
                target(0, Lane::ShiftUp, 1.0, 0.5),
                target(1, Lane::ShiftDown, 1.2, 0.1),
            ],
            None,
        );
        assert!(seq.is_err());
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        let seq =
            TargetSequence::from_targets(vec![target(0, Lane::Brake, 1.0, 0.0)], None);
        assert!(seq.is_err());
    }

    #[test]
    fn test_total_duration_computed_from_last_target() {
        let seq = TargetSequence::from_targets(
            vec![target(0, Lane::Brake, 1.0, 1.0), target(1, Lane::Accel, 4.0, 0.5)],
            None,
        )
        .unwrap();
        assert!((seq.total_duration - 4.5).abs() < 1e-6);
    }

    #[test]
    fn test_total_duration_override() {
        let seq = TargetSequence::from_targets(
            vec![target(0, Lane::Brake, 1.0, 1.0)],
            Some(30.0),
        )
        .unwrap();
        assert_eq!(seq.total_duration, 30.0);
    }

    // ==================== Reset Tests ====================

    #[test]
    fn test_reset_restores_all_lanes() {
        let mut seq = TargetSequence::from_targets(
            vec![
                target(0, Lane::Brake, 1.0, 0.5),
                target(1, Lane::Wheel, 1.0, 0.5),
                target(2, Lane::ShiftUp, 2.0, 0.1),
            ],
            None,
        )
        .unwrap();

        seq.brake[0].resolve(Tier::Perfect);
        seq.wheel[0].resolve(Tier::Miss);
        seq.shift[0].resolve(Tier::Good);

        seq.reset();
        for lane in seq.lanes() {
            for t in lane {
                assert_eq!(t.state, TargetState::Pending);
                assert_eq!(t.judgment, None);
            }
        }
    }

    #[test]
    fn test_len_counts_all_lanes() {
        let seq = TargetSequence::from_targets(
            vec![
                target(0, Lane::Brake, 1.0, 0.5),
                target(1, Lane::Wheel, 1.0, 0.5),
                target(2, Lane::Accel, 2.0, 0.5),
                target(3, Lane::ShiftUp, 3.0, 0.1),
            ],
            None,
        )
        .unwrap();
        assert_eq!(seq.len(), 4);
        assert!(!seq.is_empty());
        assert!(TargetSequence::default().is_empty());
    }
}
