use std::cmp::max;
use tracing::{debug, warn};

use crate::{AnalyzerConfig, DistanceMetrics, NoteSequence, Transformation, TransformationMatcher};

/// A stretch of the stream that resembles the pattern under one
/// transformation. `start..end` are note indices into the stream.
#[derive(Clone, Debug, PartialEq)]
pub struct CandidateMatch {
    pub sequence: NoteSequence,
    pub transformation: Transformation,
    pub cost: f64,
    pub start: usize,
    pub end: usize,
}

/// Outcome of one push-forward / pull-back step.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchStep {
    pub candidate: Option<CandidateMatch>,
    pub next_offset: usize,
}

/// Scans one voice for every occurrence of a pattern.
pub struct StreamMatcher<'a> {
    stream: &'a NoteSequence,
    pattern: &'a NoteSequence,
    metrics: DistanceMetrics,
    sensitivity: f64,
    min_match: usize,
    padding_factor: usize,
}

impl<'a> StreamMatcher<'a> {
    pub fn new(stream: &'a NoteSequence, pattern: &'a NoteSequence, config: &AnalyzerConfig) -> Self {
        StreamMatcher {
            stream,
            pattern,
            metrics: DistanceMetrics::new(config.tuning, config.scaling),
            sensitivity: config.sensitivity,
            min_match: config.min_match,
            padding_factor: config.padding_factor,
        }
    }

    pub fn matcher(&self, transformation: Transformation) -> TransformationMatcher<'a> {
        TransformationMatcher::new(self.stream, self.pattern, transformation, self.metrics, self.padding_factor)
    }

    /// Pushes forward from the first sounding note at or after `offset`
    /// until the reversed window says a match starts here, then measures it.
    /// `None` once too little stream remains.
    pub fn match_next(&self, matcher: &TransformationMatcher, offset: usize) -> Option<MatchStep> {
        let mut offset = self.stream.first_sounding_index(offset)?;
        if offset + self.min_match > self.stream.len() {
            return None;
        }
        loop {
            let step = matcher.forward_step(offset);
            if step == 0 {
                break;
            }
            offset = self.stream.first_sounding_index(offset + step)?;
        }

        let limit = matcher.measure(offset);
        if limit.consumed == 0 {
            return Some(MatchStep {candidate: None, next_offset: offset + max(self.pattern.len(), 1)});
        }
        let end = offset + limit.consumed + 1;
        if limit.cost > self.sensitivity || limit.consumed + 1 < self.min_match {
            return Some(MatchStep {candidate: None, next_offset: end});
        }
        debug!("{} match at {}..{} cost {:.4}", matcher.transformation(), offset, end, limit.cost);
        let candidate = CandidateMatch {
            sequence: self.stream.fragment(offset, end),
            transformation: matcher.transformation(),
            cost: limit.cost,
            start: offset,
            end,
        };
        Some(MatchStep {candidate: Some(candidate), next_offset: end})
    }

    /// Every accepted candidate for every transformation, ordered by start.
    /// Candidates from different transformations may overlap.
    pub fn match_all(&self, transformations: &[Transformation]) -> Vec<CandidateMatch> {
        let mut candidates = vec![];
        if self.pattern.len() < 2 {
            warn!("Pattern of {} notes has no intervals to match", self.pattern.len());
            return candidates;
        }
        for transformation in transformations {
            let matcher = self.matcher(*transformation);
            let mut offset = 0;
            while let Some(step) = self.match_next(&matcher, offset) {
                candidates.extend(step.candidate);
                offset = step.next_offset;
            }
        }
        candidates.sort_by_key(|c| c.start);
        candidates
    }
}

#[cfg(test)]
mod tests {
    use crate::edit_window::tests::sequence_from_steps;
    use crate::{AnalyzerConfig, Duration, Note, NoteSequence, StreamMatcher, Transformation};

    fn config(sensitivity: f64, min_match: usize) -> AnalyzerConfig {
        AnalyzerConfig {sensitivity, min_match, ..AnalyzerConfig::default()}
    }

    #[test]
    fn test_self_match() {
        let melody = sequence_from_steps(&[2, 2, 1, 2, -2, -1, 5, -7, 5, 2, -2, -2, -1, 1]);
        let matches = StreamMatcher::new(&melody, &melody, &config(0.3, 4)).match_all(&[Transformation::Default]);
        assert_eq!(matches.len(), 1);
        assert_eq!((matches[0].start, matches[0].end), (0, 15));
        assert_eq!(matches[0].cost, 0.0);
        assert_eq!(matches[0].sequence, melody);
    }

    #[test]
    fn test_partial_match_drops_tail() {
        let stream = sequence_from_steps(&[2, 3, 1, 2, 9]);
        let pattern = sequence_from_steps(&[2, 3, 1, 2, -2]);
        let matches = StreamMatcher::new(&stream, &pattern, &config(0.3, 2)).match_all(&[Transformation::Default]);
        assert_eq!(matches.len(), 1);
        assert_eq!((matches[0].start, matches[0].end), (0, 5));
        assert!(matches[0].end < stream.len());

        let strict = StreamMatcher::new(&stream, &pattern, &config(0.25, 2)).match_all(&[Transformation::Default]);
        assert!(strict.is_empty());
    }

    #[test]
    fn test_pushes_forward_to_late_match() {
        let stream = sequence_from_steps(&[7, -7, 7, 2, 3, 1, 2, -2]);
        let pattern = sequence_from_steps(&[2, 3, 1, 2, -2]);
        let matches = StreamMatcher::new(&stream, &pattern, &config(0.3, 4)).match_all(&[Transformation::Default]);
        assert_eq!(matches.len(), 1);
        assert_eq!((matches[0].start, matches[0].end), (3, 9));
        assert_eq!(matches[0].sequence[0].pitch(), Some(67));
    }

    fn spans(stream: &NoteSequence, pattern: &NoteSequence) -> Vec<(usize, usize)> {
        StreamMatcher::new(stream, pattern, &config(0.3, 4))
            .match_all(&[Transformation::Default])
            .iter()
            .map(|c| (c.start, c.end))
            .collect()
    }

    const SHORT: [i16; 5] = [2, 3, 1, 2, -2];
    const LONG: [i16; 10] = [2, 3, 1, 2, -2, -1, 5, -7, 5, 2];

    #[test]
    fn test_inserted_note_is_tolerated() {
        let short = sequence_from_steps(&SHORT);
        assert_eq!(spans(&sequence_from_steps(&[2, 3, 1, 5, 2, -2]), &short), vec![(0, 7)]);
        assert_eq!(spans(&sequence_from_steps(&[9, 9, 9, 2, 3, 1, 5, 2, -2, 9]), &short), vec![(3, 10)]);
        assert_eq!(spans(&sequence_from_steps(&[3, -1, 3, 1, 2, -2]), &short), vec![(0, 7)]);
        let long = sequence_from_steps(&LONG);
        assert_eq!(spans(&sequence_from_steps(&[2, 3, 1, -1, 3, -2, -1, 5, -7, 5, 2]), &long), vec![(0, 12)]);
    }

    #[test]
    fn test_deleted_note_is_tolerated() {
        let short = sequence_from_steps(&SHORT);
        assert_eq!(spans(&sequence_from_steps(&[2, 4, 2, -2, -1]), &short), vec![(0, 5)]);
        assert_eq!(spans(&sequence_from_steps(&[5, 1, 2, -2, -1]), &short), vec![(0, 5)]);
        let long = sequence_from_steps(&LONG);
        assert_eq!(spans(&sequence_from_steps(&[2, 3, 3, -2, -1, 5, -7, 5, 2, -4]), &long), vec![(0, 10)]);
    }

    #[test]
    fn test_substitution_at_start() {
        let short = sequence_from_steps(&SHORT);
        assert_eq!(spans(&sequence_from_steps(&[1, 3, 1, 2, -2]), &short), vec![(0, 6)]);
        // A leading step this far off reads as a note before the entry.
        assert_eq!(spans(&sequence_from_steps(&[7, 3, 1, 2, -2]), &short), vec![(1, 6)]);
        let long = sequence_from_steps(&LONG);
        assert_eq!(spans(&sequence_from_steps(&[1, 3, 1, 2, -2, -1, 5, -7, 5, 2]), &long), vec![(0, 11)]);
        assert_eq!(spans(&sequence_from_steps(&[4, 3, 1, 2, -2, -1, 5, -7, 5, 2]), &long), vec![(0, 11)]);
    }

    #[test]
    fn test_rests_on_both_sides() {
        let steps = [2, 2, 1, 2, -2, -1, 5, -7, 5, 2, -2, -2, -1, 1];
        let mut stream = NoteSequence::from_notes(vec![Note::rest(Duration::whole(2))]);
        stream.extend(&sequence_from_steps(&steps));
        stream.add(Note::rest(Duration::whole(2)));
        stream.extend(&sequence_from_steps(&[2, 1, 2, -7]));
        assert_eq!(spans(&stream, &sequence_from_steps(&steps)), vec![(1, 16)]);

        let mut stream = sequence_from_steps(&[-9, 4]);
        stream.add(Note::rest(Duration::whole(2)));
        stream.extend(&sequence_from_steps(&SHORT));
        stream.add(Note::rest(Duration::whole(2)));
        stream.extend(&sequence_from_steps(&[7, -12]));
        assert_eq!(spans(&stream, &sequence_from_steps(&SHORT)), vec![(4, 10)]);
    }

    #[test]
    fn test_two_entries_in_one_stream() {
        let steps = [2, 2, 1, 2, -2, -1, 5, -7, 5, 2, -2, -2, -1, 1];
        let twice: Vec<i16> = steps.iter().chain([7].iter()).chain(steps.iter()).copied().collect();
        assert_eq!(spans(&sequence_from_steps(&twice), &sequence_from_steps(&steps)), vec![(0, 15), (15, 30)]);
    }

    #[test]
    fn test_transformed_match_is_labelled() {
        let stream = sequence_from_steps(&[-2, -3, -1, -2, 2]);
        let pattern = sequence_from_steps(&[2, 3, 1, 2, -2]);
        let matcher = StreamMatcher::new(&stream, &pattern, &config(0.3, 4));
        assert!(matcher.match_all(&[Transformation::Default]).is_empty());
        let matches = matcher.match_all(&[Transformation::Default, Transformation::Inversion]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].transformation, Transformation::Inversion);
    }

    #[test]
    fn test_leading_rest_is_skipped() {
        let mut stream = NoteSequence::from_notes(vec![Note::rest(Duration::whole(3))]);
        stream.extend(&sequence_from_steps(&[2, 3, 1, 2, -2]));
        let pattern = sequence_from_steps(&[2, 3, 1, 2, -2]);
        let matches = StreamMatcher::new(&stream, &pattern, &config(0.3, 4)).match_all(&[Transformation::Default]);
        assert_eq!(matches.len(), 1);
        assert_eq!((matches[0].start, matches[0].end), (1, 7));
    }

    #[test]
    fn test_degenerate_inputs() {
        let single = NoteSequence::from_notes(vec![Note::sounding(60, Duration::one())]);
        let melody = sequence_from_steps(&[2, 3, 1, 2]);
        let defaults = AnalyzerConfig::default();
        assert!(StreamMatcher::new(&melody, &single, &defaults).match_all(&[Transformation::Default]).is_empty());
        assert!(StreamMatcher::new(&NoteSequence::new(), &melody, &defaults).match_all(&[Transformation::Default]).is_empty());
        assert!(StreamMatcher::new(&single, &melody, &defaults).match_all(&[Transformation::Default]).is_empty());
    }
}
