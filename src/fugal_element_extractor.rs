use std::collections::BTreeMap;
use tracing::debug;

use crate::{AnalysisError, NoteSequence, Result, SkipSequence, VoiceId};

/// Finds the subject: the stretch the entry voice plays alone before any
/// other voice joins.
pub struct FugalElementExtractor {
    skip_sequence: SkipSequence,
}

impl FugalElementExtractor {
    pub fn new(voices: &BTreeMap<VoiceId, NoteSequence>) -> Self {
        FugalElementExtractor {skip_sequence: SkipSequence::new(voices)}
    }

    pub fn skip_sequence(&self) -> &SkipSequence {&self.skip_sequence}

    /// The entry voice and the moment of its first note. Two voices
    /// sounding at the very start is not a fugue exposition.
    pub fn leading_voice(&self) -> Result<(VoiceId, usize)> {
        let skips = &self.skip_sequence;
        let opening: Vec<VoiceId> = skips
            .voices()
            .keys()
            .copied()
            .filter(|voice| skips.get_note(0, *voice).map_or(false, |note| !note.is_rest()))
            .collect();
        match opening.len() {
            0 => skips
                .voices()
                .keys()
                .filter_map(|voice| skips.first_note(*voice).map(|moment| (moment, *voice)))
                .min()
                .map(|(moment, voice)| (voice, moment))
                .ok_or(AnalysisError::EmptyComposition),
            1 => Ok((opening[0], 0)),
            _ => Err(AnalysisError::InvalidFugueForm(format!(
                "voices {opening:?} all enter at the start; expected a single leading subject"
            ))),
        }
    }

    pub fn extract_subject(&self) -> Result<NoteSequence> {
        let (lead, mut moment) = self.leading_voice()?;
        let skips = &self.skip_sequence;
        let mut subject = NoteSequence::new();
        while let Some(note) = skips.get_note(moment, lead) {
            if !skips.is_solo(moment, lead) {
                break;
            }
            subject.add(note.clone());
            match skips.next_moment(moment, lead) {
                Some(next) => moment = next,
                None => break,
            }
        }
        subject.trim_trailing_rests();
        debug!("Voice {} leads with {} subject notes", lead, subject.len());
        Ok(subject)
    }
}

#[cfg(test)]
mod tests {
    use crate::{AnalysisError, Composition, FugalElementExtractor};

    fn extractor(score: &str) -> FugalElementExtractor {
        let composition: Composition = score.parse().unwrap();
        FugalElementExtractor::new(&composition.voices)
    }

    fn pitches(extractor: &FugalElementExtractor) -> Vec<i16> {
        extractor.extract_subject().unwrap().iter().filter_map(|n| n.pitch()).collect()
    }

    #[test]
    fn test_single_entry_voice() {
        let e = extractor("r:6 48:2\nr:4 67:1 69:1\n60:1 62:1 64:1 65:1 67:2\n");
        assert_eq!(e.leading_voice().unwrap(), (2, 0));
        assert_eq!(pitches(&e), vec![60, 62, 64, 65]);
    }

    #[test]
    fn test_two_voices_at_start_is_invalid() {
        let e = extractor("60:1 62:1\n48:2\n");
        assert!(matches!(e.leading_voice(), Err(AnalysisError::InvalidFugueForm(_))));
        assert!(matches!(e.extract_subject(), Err(AnalysisError::InvalidFugueForm(_))));
    }

    #[test]
    fn test_late_start() {
        let e = extractor("r:2 60:1\nr:1 67:1 62:1\n");
        assert_eq!(e.leading_voice().unwrap(), (1, 1));
        assert_eq!(pitches(&e), vec![67]);
    }

    #[test]
    fn test_late_start_tie_goes_to_lower_voice() {
        let e = extractor("r:1 60:1 62:1\nr:1 67:1 65:1\n");
        assert_eq!(e.leading_voice().unwrap(), (0, 1));
        assert!(e.extract_subject().unwrap().is_empty());
    }

    #[test]
    fn test_trailing_rests_dropped() {
        let e = extractor("60:1 64:1 r:1 67:1\nr:3 55:1\n");
        let subject = e.extract_subject().unwrap();
        assert_eq!(subject.len(), 2);
        assert!(!subject[1].is_rest());
    }

    #[test]
    fn test_empty_composition() {
        let e = extractor("r:2\nr:1\n");
        assert!(matches!(e.extract_subject(), Err(AnalysisError::EmptyComposition)));
    }
}
