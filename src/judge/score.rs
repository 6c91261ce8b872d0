//! # Result Aggregation Module
//!
//! Accumulates per-tier judgment counts and the combo chain across a run,
//! and derives the end-of-run accuracy and score.
//!
//! Accumulation is pure arithmetic: nothing here inspects targets or timing,
//! it only counts what the judgment engine resolved.

use crate::judge::Tier;

/// Per-tier judgment counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub perfect: u32,
    pub great: u32,
    pub good: u32,
    pub ok: u32,
    pub miss: u32,
}

impl Tally {
    /// Records one resolved judgment.
    pub fn record(&mut self, tier: Tier) {
        match tier {
            Tier::Perfect => self.perfect += 1,
            Tier::Great => self.great += 1,
            Tier::Good => self.good += 1,
            Tier::Ok => self.ok += 1,
            Tier::Miss => self.miss += 1,
        }
    }

    /// Count for one tier.
    #[must_use]
    pub fn count(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Perfect => self.perfect,
            Tier::Great => self.great,
            Tier::Good => self.good,
            Tier::Ok => self.ok,
            Tier::Miss => self.miss,
        }
    }

    /// Total resolved targets, misses included.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.perfect + self.great + self.good + self.ok + self.miss
    }

    /// Resolved targets that were hit (every tier except miss).
    #[must_use]
    pub fn hits(&self) -> u32 {
        self.perfect + self.great + self.good + self.ok
    }

    /// Hit fraction in percent, 0-100. An empty tally reads 0.
    #[must_use]
    pub fn accuracy(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.hits() as f32 / total as f32 * 100.0
    }

    /// Weighted score in 0-100: the average of per-tier weights.
    #[must_use]
    pub fn score(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let weighted = self.perfect as f32 * Tier::Perfect.weight()
            + self.great as f32 * Tier::Great.weight()
            + self.good as f32 * Tier::Good.weight()
            + self.ok as f32 * Tier::Ok.weight();
        weighted / total as f32
    }
}

/// Current and best combo chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComboState {
    pub current: u32,
    pub max: u32,
}

impl ComboState {
    /// Applies one judgment: perfect/great extend the chain, everything else
    /// breaks it. Good and ok break the combo without being failures.
    pub fn apply(&mut self, tier: Tier) {
        if tier.extends_combo() {
            self.current += 1;
            self.max = self.max.max(self.current);
        } else {
            self.current = 0;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// End-of-run results handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub accuracy: f32,
    pub score: f32,
    pub tally: Tally,
    pub combo_max: u32,
}
