use enum_iterator::{all, Sequence};
use std::cmp::max;

use crate::{CostTuning, Duration, EditWindow, Interval, ScalingFunction};

/// Cost of an edit operation whose preconditions do not hold. Sums stay
/// infinite, so `min` over the operations never selects it.
pub const FORBIDDEN: f64 = f64::INFINITY;

pub type CostMatrix = Vec<Vec<f64>>;

/// The five ways a cell of the cost matrix can be reached.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Sequence, Hash)]
pub enum EditOperation {
    Replacement,
    /// A pattern token with no stream counterpart.
    InsertionWithoutExpansion,
    /// Two pattern tokens against one stream token.
    InsertionWithExpansion,
    /// A stream token with no pattern counterpart.
    DeletionWithoutCompression,
    /// Two stream tokens against one pattern token.
    DeletionWithCompression,
}

/// Combines melodic-interval cost and duration-ratio cost. Indices `i` and
/// `j` are 1-based positions into the stream and pattern tokens.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DistanceMetrics {
    tuning: CostTuning,
    scale: ScalingFunction,
}

impl DistanceMetrics {
    pub fn new(tuning: CostTuning, scale: ScalingFunction) -> Self {
        DistanceMetrics {tuning, scale}
    }

    pub fn tuning(&self) -> &CostTuning {&self.tuning}

    pub fn interval_cost(&self, a: Interval, b: Interval) -> f64 {
        match (a, b) {
            (Interval::Rest, Interval::Rest) => 0.0,
            (Interval::Rest, other) | (other, Interval::Rest) => self.tuning.rest_penalty_factor * other.magnitude(),
            (Interval::Sounding(a), Interval::Sounding(b)) => {
                let penalty = if (a < 0) == (b < 0) {1.0} else {self.tuning.inversion_penalty_factor};
                let difference = (a as f64 - b as f64).abs() - self.tuning.replacement_tolerance;
                penalty * difference.max(0.0)
            }
        }
    }

    /// `(1 + interval cost) * duration ratio - 1`: zero for a true match,
    /// the bare ratio excess when only the rhythm differs, and the interval
    /// cost itself when only the pitch differs.
    pub fn combined_cost(&self, interval_cost: f64, a: Duration, b: Duration) -> f64 {
        if a == b {
            interval_cost
        } else {
            (1.0 + interval_cost) * a.ratio_to(b) - 1.0
        }
    }

    /// A token matched against nothing. Notes held longer than a beat cost
    /// more, weighted the way a rhythm mismatch against one beat would be.
    /// Shorter notes cost no more than their interval.
    pub fn unmatched_cost(&self, step: Interval, duration: Duration) -> f64 {
        let held = max(duration, Duration::one());
        self.scale.apply(self.combined_cost(step.magnitude(), held, Duration::one())) + self.tuning.insertion_penalty
    }

    pub fn cost(&self, operation: EditOperation, memo: &CostMatrix, window: &EditWindow, i: usize, j: usize) -> f64 {
        match operation {
            EditOperation::Replacement => self.replacement(memo, window, i, j),
            EditOperation::InsertionWithoutExpansion => self.insertion_without_expansion(memo, window, i, j),
            EditOperation::InsertionWithExpansion => self.insertion_with_expansion(memo, window, i, j),
            EditOperation::DeletionWithoutCompression => self.deletion_without_compression(memo, window, i, j),
            EditOperation::DeletionWithCompression => self.deletion_with_compression(memo, window, i, j),
        }
    }

    /// Minimum over every edit operation.
    pub fn best_cost(&self, memo: &CostMatrix, window: &EditWindow, i: usize, j: usize) -> f64 {
        all::<EditOperation>()
            .map(|op| self.cost(op, memo, window, i, j))
            .fold(FORBIDDEN, f64::min)
    }

    pub fn replacement(&self, memo: &CostMatrix, window: &EditWindow, i: usize, j: usize) -> f64 {
        if i < 1 || j < 1 {
            return FORBIDDEN;
        }
        let interval_cost = self.interval_cost(window.stream_intervals[i - 1], window.pattern_intervals[j - 1]);
        let cost = self.combined_cost(interval_cost, window.stream_durations[i - 1], window.pattern_durations[j - 1]);
        memo[i - 1][j - 1] + self.scale.apply(cost)
    }

    pub fn insertion_without_expansion(&self, memo: &CostMatrix, window: &EditWindow, i: usize, j: usize) -> f64 {
        if j < 1 {
            return FORBIDDEN;
        }
        match window.pattern_intervals[j - 1] {
            Interval::Rest => FORBIDDEN,
            step => memo[i][j - 1] + self.unmatched_cost(step, window.pattern_durations[j - 1]),
        }
    }

    /// Row 0 of the matrix: the pattern is inserted against an empty stream,
    /// and rests there cost nothing instead of being forbidden.
    pub fn boundary_insertion(&self, memo: &CostMatrix, window: &EditWindow, j: usize) -> f64 {
        match window.pattern_intervals[j - 1] {
            Interval::Rest => memo[0][j - 1],
            _ => self.insertion_without_expansion(memo, window, 0, j),
        }
    }

    pub fn insertion_with_expansion(&self, memo: &CostMatrix, window: &EditWindow, i: usize, j: usize) -> f64 {
        if i < 1 || j < 2 {
            return FORBIDDEN;
        }
        let (first, second) = (window.pattern_intervals[j - 2], window.pattern_intervals[j - 1]);
        let stream = window.stream_intervals[i - 1];
        if first.is_rest() || second.is_rest() || stream.is_rest() {
            return FORBIDDEN;
        }
        let interval_cost = self.interval_cost(first.combined(second), stream);
        let merged = window.pattern_durations[j - 2] + window.pattern_durations[j - 1];
        let cost = self.combined_cost(interval_cost, merged, window.stream_durations[i - 1]);
        memo[i - 1][j - 2] + self.scale.apply(cost)
    }

    pub fn deletion_without_compression(&self, memo: &CostMatrix, window: &EditWindow, i: usize, j: usize) -> f64 {
        if i < 1 {
            return FORBIDDEN;
        }
        match window.stream_intervals[i - 1] {
            Interval::Rest => FORBIDDEN,
            step => memo[i - 1][j] + self.unmatched_cost(step, window.stream_durations[i - 1]),
        }
    }

    pub fn deletion_with_compression(&self, memo: &CostMatrix, window: &EditWindow, i: usize, j: usize) -> f64 {
        if i < 2 || j < 1 {
            return FORBIDDEN;
        }
        let (first, second) = (window.stream_intervals[i - 2], window.stream_intervals[i - 1]);
        let pattern = window.pattern_intervals[j - 1];
        if first.is_rest() || second.is_rest() || pattern.is_rest() {
            return FORBIDDEN;
        }
        let interval_cost = self.interval_cost(first.combined(second), pattern);
        let merged = window.stream_durations[i - 2] + window.stream_durations[i - 1];
        let cost = self.combined_cost(interval_cost, merged, window.pattern_durations[j - 1]);
        memo[i - 2][j - 1] + self.scale.apply(cost)
    }
}
