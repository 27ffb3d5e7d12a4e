//! Running submission accumulator.
//!
//! Tracks `{count, min, max, sum}` for one aggregated value of one round.
//! Becomes immutable once finalized; the round service clones it to trial
//! a submission before committing, so a failed tolerance check never
//! regresses accepted state.

use serde::{Deserialize, Serialize};
use shared_types::{BPS_SCALE, U256};

/// Accumulated numeric submissions for a single round value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericSubmissions {
    /// Distinct accepted submissions.
    pub count: u32,
    /// Smallest accepted value.
    pub min: U256,
    /// Largest accepted value.
    pub max: U256,
    /// Sum of accepted values.
    pub sum: U256,
    /// Set when the round emitted its result.
    pub finalized: bool,
}

impl NumericSubmissions {
    /// Empty accumulator.
    pub fn new() -> Self {
        Self {
            count: 0,
            min: U256::MAX,
            max: U256::zero(),
            sum: U256::zero(),
            finalized: false,
        }
    }

    /// Record one accepted value.
    pub fn record(&mut self, value: U256) {
        self.count += 1;
        self.sum = self.sum.saturating_add(value);
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    /// Floor average of accepted values; zero when empty.
    pub fn average(&self) -> U256 {
        if self.count == 0 {
            return U256::zero();
        }
        self.sum / U256::from(self.count)
    }

    /// Permitted deviation around the average: `average × tolerance / 10000`.
    pub fn allowed_deviation(&self, tolerance_bps: u64) -> U256 {
        self.average() * U256::from(tolerance_bps) / U256::from(BPS_SCALE)
    }

    /// Largest distance from either extreme to the average.
    pub fn max_deviation(&self) -> U256 {
        let average = self.average();
        let above = self.max.saturating_sub(average);
        let below = average.saturating_sub(self.min);
        above.max(below)
    }

    /// Both extremes sit within the tolerance band around the average.
    ///
    /// `tolerance_bps = 0` requires every accepted value to be identical.
    pub fn within_tolerance(&self, tolerance_bps: u64) -> bool {
        self.max_deviation() <= self.allowed_deviation(tolerance_bps)
    }

    /// Seal the accumulator.
    pub fn finalize(&mut self) {
        self.finalized = true;
    }
}

impl Default for NumericSubmissions {
    fn default() -> Self {
        Self::new()
    }
}
