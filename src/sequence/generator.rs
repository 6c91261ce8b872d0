//! # Sequence Generator Module
//!
//! Produces a randomized [`TargetSequence`] for one training run.
//!
//! The generator walks a time cursor from a fixed 2-second lead-in to the
//! requested duration, emitting either a simultaneous trail-brake pattern or
//! a full five-phase cornering pattern at each step. Difficulty parameters
//! (`min/max_duration_s`, `min/max_spacing_s`) control target length and the
//! idle gap between patterns; smaller values mean a faster, harder run.
//!
//! Randomness comes from a caller-supplied [`Rng`], so seeded runs are fully
//! reproducible.

use rand::Rng;

use crate::config::DifficultyConfig;
use crate::sequence::{Lane, Target, TargetSequence};

/// Quiet time before the first target so the driver can settle.
const LEAD_IN_S: f32 = 2.0;

/// Gap between consecutive targets within one lane.
const LANE_GAP_S: f32 = 0.05;

/// Probability of the simultaneous brake+wheel pattern over the full
/// cornering pattern.
const SIMULTANEOUS_CHANCE: f64 = 0.25;

/// Display duration for shift targets; their judgment window is purely
/// time-based, so this only affects presentation.
const SHIFT_DURATION_S: f32 = 0.1;

/// Braking phase percentages, hardest first.
const BRAKE_RAMP: [f32; 3] = [100.0, 80.0, 60.0];

/// Wheel angle as a fraction of the drawn peak: entry, apex, exit.
const WHEEL_RAMP: [f32; 6] = [0.3, 0.65, 1.0, 0.8, 0.5, 0.2];

/// Corner-exit throttle percentages.
const ACCEL_RAMP: [f32; 5] = [30.0, 50.0, 70.0, 90.0, 100.0];

/// Generates a randomized sequence covering `duration_s` seconds.
///
/// The returned sequence always satisfies the per-lane ordering and
/// non-overlap invariants; its `total_duration` is at least `duration_s` and
/// extends past it if the final pattern runs long.
pub fn generate<R: Rng>(
    duration_s: f32,
    difficulty: &DifficultyConfig,
    rng: &mut R,
) -> TargetSequence {
    let mut builder = Builder {
        difficulty,
        next_id: 0,
        sequence: TargetSequence::default(),
    };

    let mut cursor = LEAD_IN_S;
    while cursor < duration_s {
        let pattern_end = if rng.gen_bool(SIMULTANEOUS_CHANCE) {
            builder.simultaneous_pattern(cursor, rng)
        } else {
            builder.cornering_pattern(cursor, rng)
        };

        let spacing = difficulty.min_spacing_s
            + rng.gen::<f32>() * (difficulty.max_spacing_s - difficulty.min_spacing_s);
        cursor = pattern_end + spacing;
    }

    let mut sequence = builder.sequence;
    sequence.total_duration = sequence
        .lanes()
        .iter()
        .flat_map(|lane| lane.iter())
        .map(|t| t.time + t.duration)
        .fold(duration_s, f32::max);
    sequence
}

struct Builder<'a> {
    difficulty: &'a DifficultyConfig,
    next_id: u32,
    sequence: TargetSequence,
}

impl Builder<'_> {
    /// Draws a target duration, scaled by a phase-specific multiplier.
    fn draw_duration<R: Rng>(&self, rng: &mut R, multiplier: f32) -> f32 {
        let base = rng.gen_range(self.difficulty.min_duration_s..=self.difficulty.max_duration_s);
        base * multiplier
    }

    /// Appends a target and returns its end time.
    fn push(&mut self, lane: Lane, time: f32, duration: f32, value: f32) -> f32 {
        let target = Target::new(self.next_id, lane, time, duration, value);
        self.next_id += 1;
        match lane {
            Lane::Brake => self.sequence.brake.push(target),
            Lane::Wheel => self.sequence.wheel.push(target),
            Lane::Accel => self.sequence.accel.push(target),
            Lane::ShiftUp | Lane::ShiftDown => self.sequence.shift.push(target),
        }
        time + duration
    }

    /// One brake and one wheel target at the same instant: combined
    /// trail-brake-and-turn input.
    fn simultaneous_pattern<R: Rng>(&mut self, start: f32, rng: &mut R) -> f32 {
        let brake_pct = rng.gen_range(40.0..=95.0);
        let angle = rng.gen_range(40.0..=140.0_f32);
        let angle = if rng.gen_bool(0.5) { angle } else { -angle };

        let brake_duration = self.draw_duration(rng, 1.0);
        let wheel_duration = self.draw_duration(rng, 1.0);

        let brake_end = self.push(Lane::Brake, start, brake_duration, brake_pct);
        let wheel_end = self.push(Lane::Wheel, start, wheel_duration, angle);
        brake_end.max(wheel_end)
    }

    /// Five-phase corner: brake ramp-down, wheel sweep overlapping the brake
    /// tail, throttle ramp-up, and an optional shift-up or two on exit.
    fn cornering_pattern<R: Rng>(&mut self, start: f32, rng: &mut R) -> f32 {
        // Phase 1: three decreasing brake targets into the corner.
        let mut brake_cursor = start;
        let mut second_brake_start = start;
        for (i, pct) in BRAKE_RAMP.iter().enumerate() {
            if i == 1 {
                second_brake_start = brake_cursor;
            }
            let end = self.push(Lane::Brake, brake_cursor, self.draw_duration(rng, 0.8), *pct);
            brake_cursor = end + LANE_GAP_S;
        }
        let brake_end = brake_cursor - LANE_GAP_S;

        // Phase 2: wheel sweep entry -> apex -> exit. Half the time it
        // overlaps the brake tail (trail braking), otherwise it starts after
        // the last brake target.
        let peak = rng.gen_range(40.0..=140.0_f32);
        let peak = if rng.gen_bool(0.5) { peak } else { -peak };
        let mut wheel_cursor = if rng.gen_bool(0.5) {
            second_brake_start
        } else {
            brake_end + LANE_GAP_S
        };
        for fraction in WHEEL_RAMP {
            let end = self.push(
                Lane::Wheel,
                wheel_cursor,
                self.draw_duration(rng, 0.6),
                peak * fraction,
            );
            wheel_cursor = end + LANE_GAP_S;
        }
        let wheel_end = wheel_cursor - LANE_GAP_S;

        // Phase 3: throttle ramp out of the corner.
        let mut accel_cursor = wheel_end.max(brake_end) + LANE_GAP_S;
        for pct in ACCEL_RAMP {
            let end = self.push(Lane::Accel, accel_cursor, self.draw_duration(rng, 0.7), pct);
            accel_cursor = end + LANE_GAP_S;
        }
        let accel_end = accel_cursor - LANE_GAP_S;

        // Phase 4: optional upshifts once the car is accelerating.
        let mut end = accel_end;
        if rng.gen_bool(0.5) {
            let shifts = rng.gen_range(1..=2);
            let mut shift_cursor = accel_end + 0.3;
            for _ in 0..shifts {
                end = self.push(Lane::ShiftUp, shift_cursor, SHIFT_DURATION_S, 0.0);
                shift_cursor = end + 0.4;
            }
        }
        end
    }
}
