use std::cmp::min;

use crate::{Duration, Interval, NoteSequence, Transformation};

/// The four token arrays one distance computation runs over. Stream and
/// pattern share an orientation, and each side keeps its intervals and
/// durations aligned index by index.
#[derive(Clone, Debug, PartialEq)]
pub struct EditWindow {
    pub stream_intervals: Vec<Interval>,
    pub stream_durations: Vec<Duration>,
    pub pattern_intervals: Vec<Interval>,
    pub pattern_durations: Vec<Duration>,
}

impl EditWindow {
    pub fn new(
        stream_intervals: Vec<Interval>,
        stream_durations: Vec<Duration>,
        pattern_intervals: Vec<Interval>,
        pattern_durations: Vec<Duration>,
    ) -> Self {
        assert_eq!(stream_intervals.len(), stream_durations.len());
        assert_eq!(pattern_intervals.len(), pattern_durations.len());
        EditWindow {stream_intervals, stream_durations, pattern_intervals, pattern_durations}
    }

    /// Window of at most `padding_factor` times the pattern's token count,
    /// starting at note `stream_start` and clipped to the end of the stream.
    pub fn build(stream: &NoteSequence, pattern: &NoteSequence, stream_start: usize, padding_factor: usize, reverse: bool) -> Self {
        let (pattern_intervals, pattern_durations) = pattern.tokens();
        let available = stream.len().saturating_sub(stream_start + 1);
        let count = min(padding_factor * pattern_intervals.len(), available);
        let (stream_intervals, stream_durations) = if count == 0 {
            (vec![], vec![])
        } else {
            let stream_end = stream_start + count;
            (stream.intervals_between(stream_start, stream_end), stream.durations_between(stream_start, stream_end))
        };
        let window = EditWindow::new(stream_intervals, stream_durations, pattern_intervals, pattern_durations);
        if reverse {window.reversed()} else {window}
    }

    pub fn reversed(mut self) -> Self {
        self.stream_intervals.reverse();
        self.stream_durations.reverse();
        self.pattern_intervals.reverse();
        self.pattern_durations.reverse();
        self
    }

    /// Replaces the pattern arrays wholesale. Every transformation commutes
    /// with reversing the window, so this is valid in either orientation.
    pub fn transform_pattern(&mut self, transformation: Transformation) {
        self.pattern_intervals = transformation.transform_intervals(&self.pattern_intervals);
        self.pattern_durations = transformation.transform_durations(&self.pattern_durations);
    }

    pub fn stream_len(&self) -> usize {
        self.stream_intervals.len()
    }

    pub fn pattern_len(&self) -> usize {
        self.pattern_intervals.len()
    }
}
