use enum_iterator::Sequence;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::{AnalysisError, Duration, Interval};

/// A systematic reshaping of the subject. Reversals move interval and
/// duration tokens together; inversions never turn a rest into a step.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Sequence, Hash, Ord, PartialOrd)]
pub enum Transformation {
    Default,
    Reversal,
    Inversion,
    ReversalInversion,
    Augmentation,
    Diminution,
}

impl Transformation {
    pub fn name(&self) -> &'static str {
        match self {
            Transformation::Default => "DEFAULT",
            Transformation::Reversal => "REVERSAL",
            Transformation::Inversion => "INVERSION",
            Transformation::ReversalInversion => "REVERSAL_INVERSION",
            Transformation::Augmentation => "AUGMENTATION",
            Transformation::Diminution => "DIMINUTION",
        }
    }

    pub fn reverses(&self) -> bool {
        matches!(self, Transformation::Reversal | Transformation::ReversalInversion)
    }

    pub fn inverts(&self) -> bool {
        matches!(self, Transformation::Inversion | Transformation::ReversalInversion)
    }

    pub fn transform_intervals(&self, intervals: &[Interval]) -> Vec<Interval> {
        let mut result: Vec<Interval> = if self.inverts() {
            intervals.iter().map(|i| i.negated()).collect()
        } else {
            intervals.to_vec()
        };
        if self.reverses() {
            result.reverse();
        }
        result
    }

    pub fn transform_durations(&self, durations: &[Duration]) -> Vec<Duration> {
        let mut result: Vec<Duration> = match self {
            Transformation::Augmentation => durations.iter().map(|d| *d * 2).collect(),
            Transformation::Diminution => durations.iter().map(|d| *d / 2).collect(),
            _ => durations.to_vec(),
        };
        if self.reverses() {
            result.reverse();
        }
        result
    }
}

impl Display for Transformation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Transformation {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        enum_iterator::all::<Transformation>()
            .find(|t| t.name() == normalized)
            .ok_or_else(|| AnalysisError::Parse(format!("No transformation named {s}")))
    }
}

#[cfg(test)]
mod tests {
    use crate::{Duration, Interval, Transformation};
    use enum_iterator::all;

    fn intervals(values: &[Option<i16>]) -> Vec<Interval> {
        values.iter().copied().map(Interval::from).collect()
    }

    #[test]
    fn test_interval_transformations() {
        let original = intervals(&[Some(2), None, Some(-3), Some(0)]);
        assert_eq!(Transformation::Default.transform_intervals(&original), original);
        assert_eq!(Transformation::Reversal.transform_intervals(&original), intervals(&[Some(0), Some(-3), None, Some(2)]));
        assert_eq!(Transformation::Inversion.transform_intervals(&original), intervals(&[Some(-2), None, Some(3), Some(0)]));
        assert_eq!(Transformation::ReversalInversion.transform_intervals(&original), intervals(&[Some(0), Some(3), None, Some(-2)]));
        assert_eq!(Transformation::Augmentation.transform_intervals(&original), original);
    }

    #[test]
    fn test_duration_transformations() {
        let original = vec![Duration::one(), Duration::new(1, 2), Duration::new(3, 4)];
        assert_eq!(Transformation::Augmentation.transform_durations(&original), vec![Duration::whole(2), Duration::one(), Duration::new(3, 2)]);
        assert_eq!(Transformation::Diminution.transform_durations(&original), vec![Duration::new(1, 2), Duration::new(1, 4), Duration::new(3, 8)]);
        assert_eq!(Transformation::Reversal.transform_durations(&original), vec![Duration::new(3, 4), Duration::new(1, 2), Duration::one()]);
        assert_eq!(Transformation::Inversion.transform_durations(&original), original);
    }

    #[test]
    fn test_names_round_trip() {
        for t in all::<Transformation>() {
            assert_eq!(t.to_string().parse::<Transformation>().unwrap(), t);
        }
        assert_eq!("reversal-inversion".parse::<Transformation>().unwrap(), Transformation::ReversalInversion);
        assert!("retrograde".parse::<Transformation>().is_err());
    }
}
