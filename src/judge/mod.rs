//! # Judgment Engine Module
//!
//! Compares the per-tick input vector against every pending target whose
//! timing window is active, resolves targets to a tier, and keeps the combo
//! chain and tally current.
//!
//! ## Tier thresholds
//!
//! Continuous lanes (brake, accel, wheel) judge by value distance `d` while
//! the target's hit window is open and the channel is active:
//!
//! | Tier    | Condition            |
//! |---------|----------------------|
//! | Perfect | `d <= tolerance*0.3` |
//! | Great   | `d <= tolerance*0.6` |
//! | Good    | `d <= tolerance`     |
//! | Ok      | `d <= tolerance*1.5` |
//!
//! A larger distance leaves the target pending; only the miss-grace timeout
//! ends it. Shift lanes judge by timing alone on the button's rising edge:
//! perfect <=50ms, great <=100ms, good <=150ms, ok <=200ms.
//!
//! Every resolution is one-way. The pending guard on [`Target::resolve`]
//! makes a second pass over an already-resolved target a no-op, so no target
//! is ever counted twice.

pub mod score;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::JudgmentConfig;
use crate::input::InputVector;
use crate::sequence::{Lane, Target, TargetSequence};

pub use score::{ComboState, RunSummary, Tally};

/// Full wheel lock in degrees; wheel input -1.0..1.0 maps onto this range.
pub const WHEEL_RANGE_DEG: f32 = 175.0;

/// Judgment quality, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Perfect,
    Great,
    Good,
    Ok,
    Miss,
}

impl Tier {
    /// Score weight for this tier.
    #[must_use]
    pub fn weight(self) -> f32 {
        match self {
            Tier::Perfect => 100.0,
            Tier::Great => 90.0,
            Tier::Good => 75.0,
            Tier::Ok => 50.0,
            Tier::Miss => 0.0,
        }
    }

    /// Whether this tier extends the combo chain.
    #[must_use]
    pub fn extends_combo(self) -> bool {
        matches!(self, Tier::Perfect | Tier::Great)
    }
}

/// One resolved target, emitted to sinks (audio, UI) in lane order.
///
/// Consumers must not rely on intra-tick ordering; the tally is the
/// authoritative aggregate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JudgmentEvent {
    pub target_id: u32,
    pub lane: Lane,
    pub tier: Tier,
    /// `target.time - elapsed` at resolution, seconds. Positive means early.
    pub delta_t: f32,
}

/// Timing windows and tolerances, captured from [`JudgmentConfig`] at
/// engine construction.
#[derive(Debug, Clone, Copy)]
pub struct JudgmentSettings {
    pub tolerance: f32,
    pub wheel_tolerance_scale: f32,
    pub hit_window_s: f32,
    pub miss_grace_s: f32,
    pub shift_window_s: f32,
    pub activity_threshold: f32,
}

impl From<&JudgmentConfig> for JudgmentSettings {
    fn from(config: &JudgmentConfig) -> Self {
        Self {
            tolerance: config.tolerance,
            wheel_tolerance_scale: config.wheel_tolerance_scale,
            hit_window_s: config.hit_window_s,
            miss_grace_s: config.miss_grace_s,
            shift_window_s: config.shift_window_s,
            activity_threshold: config.activity_threshold,
        }
    }
}

/// The per-run judgment state machine.
#[derive(Debug)]
pub struct JudgmentEngine {
    settings: JudgmentSettings,
    combo: ComboState,
    tally: Tally,
    prev_shift_up: bool,
    prev_shift_down: bool,
}

impl JudgmentEngine {
    /// Creates an engine with fresh combo/tally state.
    #[must_use]
    pub fn new(settings: JudgmentSettings) -> Self {
        Self {
            settings,
            combo: ComboState::default(),
            tally: Tally::default(),
            prev_shift_up: false,
            prev_shift_down: false,
        }
    }

    #[must_use]
    pub fn combo(&self) -> ComboState {
        self.combo
    }

    #[must_use]
    pub fn tally(&self) -> Tally {
        self.tally
    }

    /// Clears combo, tally, and shift edge state for a fresh run.
    ///
    /// Target state lives on the sequence and is reset separately via
    /// [`TargetSequence::reset`].
    pub fn reset(&mut self) {
        self.combo.reset();
        self.tally = Tally::default();
        self.prev_shift_up = false;
        self.prev_shift_down = false;
    }

    /// End-of-run results derived from the accumulated tally.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            accuracy: self.tally.accuracy(),
            score: self.tally.score(),
            tally: self.tally,
            combo_max: self.combo.max,
        }
    }

    /// Runs one judgment pass over every pending target.
    ///
    /// Events are emitted in lane order (brake, wheel, accel, shift). All
    /// mutation of target state, combo, and tally happens synchronously
    /// inside this call.
    pub fn evaluate(
        &mut self,
        sequence: &mut TargetSequence,
        input: &InputVector,
        elapsed: f32,
    ) -> Vec<JudgmentEvent> {
        let mut events = Vec::new();

        let mut brake = std::mem::take(&mut sequence.brake);
        self.judge_continuous(&mut brake, input.brake * 100.0, input.brake, elapsed, &mut events);
        sequence.brake = brake;

        let mut wheel = std::mem::take(&mut sequence.wheel);
        self.judge_continuous(
            &mut wheel,
            input.wheel * WHEEL_RANGE_DEG,
            input.wheel.abs(),
            elapsed,
            &mut events,
        );
        sequence.wheel = wheel;

        let mut accel = std::mem::take(&mut sequence.accel);
        self.judge_continuous(
            &mut accel,
            input.accelerator * 100.0,
            input.accelerator,
            elapsed,
            &mut events,
        );
        sequence.accel = accel;

        let mut shift = std::mem::take(&mut sequence.shift);
        self.judge_shift(&mut shift, input, elapsed, &mut events);
        sequence.shift = shift;

        self.prev_shift_up = input.shift_up;
        self.prev_shift_down = input.shift_down;

        events
    }

    /// Hit and miss tests for one continuous lane.
    ///
    /// `comparable` is the input in the target's units (percent or degrees);
    /// `activity` is the raw channel magnitude gating the hit test.
    fn judge_continuous(
        &mut self,
        targets: &mut [Target],
        comparable: f32,
        activity: f32,
        elapsed: f32,
        events: &mut Vec<JudgmentEvent>,
    ) {
        let tolerance = match targets.first().map(|t| t.lane) {
            Some(Lane::Wheel) => self.settings.tolerance * self.settings.wheel_tolerance_scale,
            _ => self.settings.tolerance,
        };

        for target in targets.iter_mut() {
            if target.judgment.is_some() {
                continue;
            }
            let delta_t = target.time - elapsed;

            // Expired without a judgment.
            if delta_t < -self.settings.miss_grace_s {
                self.resolve(target, Tier::Miss, delta_t, events);
                continue;
            }

            // Hit test only inside the window and only while the channel is
            // actually being worked; a resting pedal never counts as a hit.
            if delta_t.abs() > self.settings.hit_window_s
                || activity <= self.settings.activity_threshold
            {
                continue;
            }

            let d = (comparable - target.value).abs();
            let tier = if d <= tolerance * 0.3 {
                Tier::Perfect
            } else if d <= tolerance * 0.6 {
                Tier::Great
            } else if d <= tolerance {
                Tier::Good
            } else if d <= tolerance * 1.5 {
                Tier::Ok
            } else {
                // Too far off; leave pending until the grace period expires.
                continue;
            };
            self.resolve(target, tier, delta_t, events);
        }
    }

    /// Timing-only judgment for the shared shift lane.
    fn judge_shift(
        &mut self,
        targets: &mut [Target],
        input: &InputVector,
        elapsed: f32,
        events: &mut Vec<JudgmentEvent>,
    ) {
        // Miss pass first so an expired target cannot claim a late edge.
        for target in targets.iter_mut() {
            if target.judgment.is_none()
                && target.time - elapsed < -self.settings.shift_window_s
            {
                let delta_t = target.time - elapsed;
                self.resolve(target, Tier::Miss, delta_t, events);
            }
        }

        let up_edge = input.shift_up && !self.prev_shift_up;
        let down_edge = input.shift_down && !self.prev_shift_down;

        if up_edge {
            self.judge_shift_edge(targets, Lane::ShiftUp, elapsed, events);
        }
        if down_edge {
            self.judge_shift_edge(targets, Lane::ShiftDown, elapsed, events);
        }
    }

    /// Resolves the closest pending target of one shift direction, if any is
    /// inside the window.
    fn judge_shift_edge(
        &mut self,
        targets: &mut [Target],
        lane: Lane,
        elapsed: f32,
        events: &mut Vec<JudgmentEvent>,
    ) {
        let closest = targets
            .iter_mut()
            .filter(|t| t.lane == lane && t.judgment.is_none())
            .min_by(|a, b| {
                let da = (a.time - elapsed).abs();
                let db = (b.time - elapsed).abs();
                da.total_cmp(&db)
            });

        let Some(target) = closest else {
            debug!(?lane, "shift edge with no pending target");
            return;
        };

        let delta_t = target.time - elapsed;
        if delta_t.abs() > self.settings.shift_window_s {
            return;
        }

        let abs = delta_t.abs();
        let tier = if abs <= 0.05 {
            Tier::Perfect
        } else if abs <= 0.10 {
            Tier::Great
        } else if abs <= 0.15 {
            Tier::Good
        } else if abs <= 0.20 {
            Tier::Ok
        } else {
            return;
        };
        self.resolve(target, tier, delta_t, events);
    }

    /// Applies one judgment: target state, tally, combo, event.
    fn resolve(
        &mut self,
        target: &mut Target,
        tier: Tier,
        delta_t: f32,
        events: &mut Vec<JudgmentEvent>,
    ) {
        if !target.resolve(tier) {
            return;
        }
        self.tally.record(tier);
        self.combo.apply(tier);
        events.push(JudgmentEvent {
            target_id: target.id,
            lane: target.lane,
            tier,
            delta_t,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> JudgmentEngine {
        JudgmentEngine::new(JudgmentSettings::from(&JudgmentConfig::default()))
    }

    fn brake_sequence(time: f32, percent: f32) -> TargetSequence {
        TargetSequence::from_targets(
            vec![Target::new(0, Lane::Brake, time, 0.5, percent)],
            Some(10.0),
        )
        .unwrap()
    }

    fn braking(percent: f32) -> InputVector {
        InputVector {
            brake: percent / 100.0,
            ..InputVector::default()
        }
    }

    // ==================== Continuous Hit Tests ====================

    #[test]
    fn test_brake_perfect() {
        // tolerance 5: d = 1 <= 1.5.
        let mut seq = brake_sequence(2.0, 60.0);
        let events = engine().evaluate(&mut seq, &braking(61.0), 2.0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].tier, Tier::Perfect);
        assert_eq!(events[0].lane, Lane::Brake);
    }

    #[test]
    fn test_brake_great() {
        // d = 2.5 <= 3.0.
        let mut seq = brake_sequence(2.0, 60.0);
        let events = engine().evaluate(&mut seq, &braking(62.5), 2.0);
        assert_eq!(events[0].tier, Tier::Great);
    }

    #[test]
    fn test_brake_good() {
        // d = 5 <= 5.
        let mut seq = brake_sequence(2.0, 60.0);
        let events = engine().evaluate(&mut seq, &braking(65.0), 2.0);
        assert_eq!(events[0].tier, Tier::Good);
    }

    #[test]
    fn test_brake_ok() {
        // d = 7 <= 7.5.
        let mut seq = brake_sequence(2.0, 60.0);
        let events = engine().evaluate(&mut seq, &braking(67.0), 2.0);
        assert_eq!(events[0].tier, Tier::Ok);
    }

    #[test]
    fn test_brake_too_far_stays_pending_then_misses() {
        // d = 10 > 7.5: no judgment at the scheduled instant.
        let mut seq = brake_sequence(2.0, 60.0);
        let mut engine = engine();
        let events = engine.evaluate(&mut seq, &braking(70.0), 2.0);
        assert!(events.is_empty());

        // Past the grace period the target misses regardless of input.
        let events = engine.evaluate(&mut seq, &braking(70.0), 2.25);
        assert_eq!(events[0].tier, Tier::Miss);
        assert_eq!(engine.tally().miss, 1);
    }

    #[test]
    fn test_resting_pedal_is_not_judged() {
        // Input below the activity threshold: a released pedal near a 0%
        // target must not register as an intentional hit.
        let mut seq = brake_sequence(2.0, 3.0);
        let events = engine().evaluate(&mut seq, &braking(2.0), 2.0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_outside_hit_window_not_judged() {
        let mut seq = brake_sequence(2.0, 60.0);
        let events = engine().evaluate(&mut seq, &braking(60.0), 1.5);
        assert!(events.is_empty());
    }

    #[test]
    fn test_early_hit_within_window() {
        let mut seq = brake_sequence(2.0, 60.0);
        let events = engine().evaluate(&mut seq, &braking(60.0), 1.9);
        assert_eq!(events[0].tier, Tier::Perfect);
        assert!(events[0].delta_t > 0.0);
    }

    #[test]
    fn test_wheel_tier_uses_scaled_tolerance() {
        // Wheel tolerance = 5 * 2 = 10 degrees. Target 90 deg, input
        // 0.52 * 175 = 91 deg: d = 1 <= 3.0 -> perfect.
        let mut seq = TargetSequence::from_targets(
            vec![Target::new(0, Lane::Wheel, 2.0, 0.5, 91.0)],
            Some(10.0),
        )
        .unwrap();
        let input = InputVector {
            wheel: 0.52,
            ..InputVector::default()
        };
        let events = engine().evaluate(&mut seq, &input, 2.0);
        assert_eq!(events[0].tier, Tier::Perfect);

        // d = 9 <= 10 is good on the wheel but would miss a pedal lane.
        let mut seq = TargetSequence::from_targets(
            vec![Target::new(0, Lane::Wheel, 2.0, 0.5, 100.0)],
            Some(10.0),
        )
        .unwrap();
        let events = engine().evaluate(&mut seq, &input, 2.0);
        assert_eq!(events[0].tier, Tier::Good);
    }

    #[test]
    fn test_negative_wheel_angle() {
        let mut seq = TargetSequence::from_targets(
            vec![Target::new(0, Lane::Wheel, 2.0, 0.5, -87.5)],
            Some(10.0),
        )
        .unwrap();
        let input = InputVector {
            wheel: -0.5, // -87.5 degrees
            ..InputVector::default()
        };
        let events = engine().evaluate(&mut seq, &input, 2.0);
        assert_eq!(events[0].tier, Tier::Perfect);
    }

    // ==================== Single-Resolution Tests ====================

    #[test]
    fn test_target_judged_exactly_once_across_ticks() {
        let mut seq = brake_sequence(2.0, 60.0);
        let mut engine = engine();

        // Tick repeatedly through and past the window.
        let mut elapsed = 1.8;
        while elapsed < 3.0 {
            engine.evaluate(&mut seq, &braking(60.0), elapsed);
            elapsed += 1.0 / 60.0;
        }
        assert_eq!(engine.tally().total(), 1);
        assert_eq!(engine.tally().perfect, 1);
    }

    #[test]
    fn test_miss_recorded_exactly_once() {
        let mut seq = brake_sequence(2.0, 60.0);
        let mut engine = engine();
        for i in 0..30 {
            engine.evaluate(&mut seq, &InputVector::default(), 2.3 + i as f32 * 0.016);
        }
        assert_eq!(engine.tally().total(), 1);
        assert_eq!(engine.tally().miss, 1);
    }

    // ==================== Shift Tests ====================

    fn shift_sequence(lane: Lane, time: f32) -> TargetSequence {
        TargetSequence::from_targets(
            vec![Target::new(0, lane, time, 0.1, 0.0)],
            Some(10.0),
        )
        .unwrap()
    }

    fn shifting_up() -> InputVector {
        InputVector {
            shift_up: true,
            ..InputVector::default()
        }
    }

    #[test]
    fn test_shift_tiers_by_timing() {
        let cases = [
            (0.04, Tier::Perfect),
            (0.09, Tier::Great),
            (0.14, Tier::Good),
            (0.19, Tier::Ok),
        ];
        for (lateness, expected) in cases {
            let mut seq = shift_sequence(Lane::ShiftUp, 2.0);
            let events = engine().evaluate(&mut seq, &shifting_up(), 2.0 + lateness);
            assert_eq!(events.len(), 1, "lateness {}", lateness);
            assert_eq!(events[0].tier, expected, "lateness {}", lateness);
        }
    }

    #[test]
    fn test_shift_edge_outside_window_ignored() {
        // 0.22s late: inside the 0.25s window but beyond the ok threshold.
        let mut seq = shift_sequence(Lane::ShiftUp, 2.0);
        let events = engine().evaluate(&mut seq, &shifting_up(), 2.22);
        assert!(events.is_empty());
    }

    #[test]
    fn test_held_shift_button_is_one_edge() {
        let mut seq = TargetSequence::from_targets(
            vec![
                Target::new(0, Lane::ShiftUp, 2.0, 0.1, 0.0),
                Target::new(1, Lane::ShiftUp, 2.3, 0.1, 0.0),
            ],
            Some(10.0),
        )
        .unwrap();
        let mut engine = engine();

        let events = engine.evaluate(&mut seq, &shifting_up(), 2.0);
        assert_eq!(events.len(), 1);

        // Still held at the second target's time: no new rising edge.
        let events = engine.evaluate(&mut seq, &shifting_up(), 2.3);
        assert!(events.is_empty());

        // Release and press again.
        engine.evaluate(&mut seq, &InputVector::default(), 2.35);
        let events = engine.evaluate(&mut seq, &shifting_up(), 2.4);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].target_id, 1);
    }

    #[test]
    fn test_shift_edge_picks_closest_target() {
        let mut seq = TargetSequence::from_targets(
            vec![
                Target::new(0, Lane::ShiftUp, 2.0, 0.1, 0.0),
                Target::new(1, Lane::ShiftUp, 2.4, 0.1, 0.0),
            ],
            Some(10.0),
        )
        .unwrap();
        let events = engine().evaluate(&mut seq, &shifting_up(), 2.35);
        assert_eq!(events[0].target_id, 1);
    }

    #[test]
    fn test_shift_direction_matters() {
        // An upshift edge must not resolve a downshift target.
        let mut seq = shift_sequence(Lane::ShiftDown, 2.0);
        let events = engine().evaluate(&mut seq, &shifting_up(), 2.0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_shift_miss_after_window() {
        let mut seq = shift_sequence(Lane::ShiftUp, 2.0);
        let mut engine = engine();
        let events = engine.evaluate(&mut seq, &InputVector::default(), 2.3);
        assert_eq!(events[0].tier, Tier::Miss);
        assert_eq!(engine.tally().miss, 1);
    }

    // ==================== Combo & Ordering Tests ====================

    #[test]
    fn test_lane_order_of_events() {
        let mut seq = TargetSequence::from_targets(
            vec![
                Target::new(0, Lane::Accel, 2.0, 0.5, 50.0),
                Target::new(1, Lane::Brake, 2.0, 0.5, 50.0),
            ],
            Some(10.0),
        )
        .unwrap();
        let input = InputVector {
            brake: 0.5,
            accelerator: 0.5,
            ..InputVector::default()
        };
        let events = engine().evaluate(&mut seq, &input, 2.0);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].lane, Lane::Brake);
        assert_eq!(events[1].lane, Lane::Accel);
    }

    #[test]
    fn test_combo_tracks_judgments() {
        let mut seq = TargetSequence::from_targets(
            vec![
                Target::new(0, Lane::Brake, 2.0, 0.5, 60.0),
                Target::new(1, Lane::Brake, 4.0, 0.5, 60.0),
            ],
            Some(10.0),
        )
        .unwrap();
        let mut engine = engine();

        engine.evaluate(&mut seq, &braking(60.0), 2.0);
        assert_eq!(engine.combo().current, 1);

        // Second target missed entirely.
        engine.evaluate(&mut seq, &InputVector::default(), 4.5);
        assert_eq!(engine.combo().current, 0);
        assert_eq!(engine.combo().max, 1);
    }

    #[test]
    fn test_reset_clears_run_state() {
        let mut seq = brake_sequence(2.0, 60.0);
        let mut engine = engine();
        engine.evaluate(&mut seq, &braking(60.0), 2.0);
        assert_eq!(engine.tally().total(), 1);

        engine.reset();
        assert_eq!(engine.tally(), Tally::default());
        assert_eq!(engine.combo(), ComboState::default());
    }

    // ==================== End-to-End Tests ====================

    #[test]
    fn test_four_perfect_brakes_score_100() {
        let mut seq = TargetSequence::from_targets(
            (0..4)
                .map(|i| Target::new(i, Lane::Brake, 2.0 + i as f32 * 2.0, 0.5, 60.0))
                .collect(),
            Some(10.0),
        )
        .unwrap();
        let mut engine = engine();

        let mut elapsed = 0.0;
        while elapsed < 10.0 {
            let near_target = seq
                .brake
                .iter()
                .any(|t| (t.time - elapsed).abs() <= 0.1 && t.judgment.is_none());
            let input = if near_target {
                braking(60.0)
            } else {
                InputVector::default()
            };
            engine.evaluate(&mut seq, &input, elapsed);
            elapsed += 1.0 / 60.0;
        }

        let summary = engine.summary();
        assert_eq!(summary.tally.perfect, 4);
        assert_eq!(summary.tally.total(), 4);
        assert_eq!(summary.accuracy, 100.0);
        assert_eq!(summary.score, 100.0);
        assert_eq!(summary.combo_max, 4);
    }
}
