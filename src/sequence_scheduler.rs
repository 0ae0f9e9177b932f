use float_cmp::{ApproxEq, F64Margin};
use ordered_float::OrderedFloat;
use tracing::debug;

use crate::{CandidateMatch, SourceNoteId};

const MEMO_MARGIN: F64Margin = F64Margin {epsilon: 0.001, ulps: 4};

/// Something occupying an inclusive span of source notes at a cost.
pub trait Schedulable {
    fn span(&self) -> (SourceNoteId, SourceNoteId);
    /// Lower is better.
    fn weight(&self) -> f64;

    fn precedes(&self, other: &Self) -> bool {
        self.span().1 < other.span().0
    }
}

impl Schedulable for CandidateMatch {
    /// Source-note ids when the notes carry them, stream indices otherwise.
    fn span(&self) -> (SourceNoteId, SourceNoteId) {
        self.sequence.id_span().unwrap_or((self.start, self.end.saturating_sub(1)))
    }

    fn weight(&self) -> f64 {self.cost}
}

/// Weighted interval scheduling: picks the non-overlapping subset with the
/// largest total gain, where an item's gain is the largest weight present
/// minus its own weight.
pub struct SequenceScheduler;

impl SequenceScheduler {
    pub fn get_schedule<T: Schedulable>(mut items: Vec<T>) -> Vec<T> {
        if items.is_empty() {
            return items;
        }
        items.sort_by_key(|item| item.span().1);
        let max_weight = items.iter().map(|item| OrderedFloat(item.weight())).max().map_or(0.0, |w| w.into_inner());
        let gains: Vec<f64> = items.iter().map(|item| max_weight - item.weight()).collect();

        let mut memo = gains.clone();
        for j in 0..items.len() {
            for i in 0..j {
                if items[i].precedes(&items[j]) {
                    memo[j] = memo[j].max(memo[i] + gains[j]);
                }
            }
        }

        let Some(mut current) = (0..items.len()).max_by_key(|j| OrderedFloat(memo[*j])) else {
            return vec![];
        };
        let mut chosen = vec![current];
        loop {
            let target = memo[current] - gains[current];
            let predecessor = (0..current)
                .rev()
                .find(|i| items[*i].precedes(&items[current]) && memo[*i].approx_eq(target, MEMO_MARGIN));
            match predecessor {
                Some(i) => {
                    chosen.push(i);
                    current = i;
                }
                None => break,
            }
        }
        debug!("Scheduled {} of {} items, total gain {:.4}", chosen.len(), items.len(), memo[chosen[0]]);

        let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
        chosen.iter().rev().filter_map(|i| slots[*i].take()).collect()
    }
}
