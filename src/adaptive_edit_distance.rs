use ordered_float::OrderedFloat;
use tracing::trace;

use crate::distance_metrics::{CostMatrix, FORBIDDEN};
use crate::{DistanceMetrics, EditWindow};

/// How far an alignment reaches into the stream window, and its cost
/// normalized by the number of stream notes involved.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Limit {
    pub consumed: usize,
    pub cost: f64,
}

/// Cost matrix aligning a stream window (rows) against a pattern (columns).
/// Stream tokens ahead of the match are free to skip; pattern tokens are not.
#[derive(Clone, Debug)]
pub struct AdaptiveEditDistance {
    memo: CostMatrix,
}

impl AdaptiveEditDistance {
    pub fn new(window: &EditWindow, metrics: &DistanceMetrics) -> Self {
        let rows = window.stream_len() + 1;
        let cols = window.pattern_len() + 1;
        let mut memo = vec![vec![0.0; cols]; rows];
        for j in 1..cols {
            memo[0][j] = metrics.boundary_insertion(&memo, window, j);
        }
        for i in 1..rows {
            for j in 1..cols {
                memo[i][j] = metrics.best_cost(&memo, window, i, j);
            }
        }
        trace!("Cost matrix {}x{}: {:?}", rows, cols, memo);
        AdaptiveEditDistance {memo}
    }

    pub fn memo(&self) -> &CostMatrix {&self.memo}

    pub fn total_cost(&self) -> f64 {
        let last = &self.memo[self.memo.len() - 1];
        last[last.len() - 1]
    }

    /// Starts from the cheapest cell of the last column, preferring the
    /// longest stream prefix on ties, then climbs back while a strictly
    /// cheaper neighbor exists. With `pattern_complete` the climb stops
    /// instead of giving up pattern tokens. An empty pattern matches nothing.
    pub fn get_limits(&self, pattern_complete: bool) -> Limit {
        let mut j = self.memo[0].len() - 1;
        if j == 0 {
            return Limit {consumed: 0, cost: FORBIDDEN};
        }
        let mut i = (0..self.memo.len())
            .rev()
            .min_by_key(|i| OrderedFloat(self.memo[*i][j]))
            .unwrap_or(0);
        while i > 0 && j > 0 {
            let current = self.memo[i][j];
            if self.memo[i - 1][j] < current {
                i -= 1;
            } else if self.memo[i][j - 1] < current {
                if pattern_complete {
                    break;
                }
                j -= 1;
            } else {
                break;
            }
        }
        Limit {consumed: i, cost: self.memo[i][j] / (i + 1) as f64}
    }
}
