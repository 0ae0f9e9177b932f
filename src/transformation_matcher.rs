use tracing::debug;

use crate::{AdaptiveEditDistance, DistanceMetrics, EditWindow, Limit, NoteSequence, Transformation};

/// Forward windows span one pattern length. Anything longer lets notes
/// past a match pose as its ending and push the start too far.
const PUSH_PADDING: usize = 1;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Direction {
    /// Reversed window: how late could a match begin?
    Forward,
    /// Natural order with the whole pattern required: how much stream does
    /// a match starting here consume?
    Backward,
}

/// Aligns one transformation of the pattern against bounded windows of a
/// stream.
#[derive(Clone, Debug)]
pub struct TransformationMatcher<'a> {
    stream: &'a NoteSequence,
    pattern: &'a NoteSequence,
    transformation: Transformation,
    metrics: DistanceMetrics,
    padding_factor: usize,
}

impl<'a> TransformationMatcher<'a> {
    pub fn new(stream: &'a NoteSequence, pattern: &'a NoteSequence, transformation: Transformation, metrics: DistanceMetrics, padding_factor: usize) -> Self {
        TransformationMatcher {stream, pattern, transformation, metrics, padding_factor}
    }

    pub fn transformation(&self) -> Transformation {self.transformation}

    pub fn window(&self, start: usize, direction: Direction) -> EditWindow {
        let mut window = match direction {
            Direction::Forward => EditWindow::build(self.stream, self.pattern, start, PUSH_PADDING, true),
            Direction::Backward => EditWindow::build(self.stream, self.pattern, start, self.padding_factor, false),
        };
        window.transform_pattern(self.transformation);
        window
    }

    pub fn get_limit(&self, start: usize, direction: Direction) -> (usize, Limit) {
        let window = self.window(start, direction);
        let limit = AdaptiveEditDistance::new(&window, &self.metrics).get_limits(direction == Direction::Backward);
        debug!("{} {:?} at {}: window {}, consumed {}, cost {:.4}",
            self.transformation, direction, start, window.stream_len(), limit.consumed, limit.cost);
        (window.stream_len(), limit)
    }

    /// Stream tokens to skip before a match could start. Zero means start here.
    pub fn forward_step(&self, start: usize) -> usize {
        let (window_len, limit) = self.get_limit(start, Direction::Forward);
        window_len - limit.consumed
    }

    pub fn measure(&self, start: usize) -> Limit {
        self.get_limit(start, Direction::Backward).1
    }
}
