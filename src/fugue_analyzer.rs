use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::{AnalyzerConfig, CandidateMatch, Composition, FugalElementExtractor, NoteSequence, Result, SequenceScheduler, StreamMatcher, Transformation, VoiceId};

pub type ScheduledMatches = BTreeMap<VoiceId, Vec<(NoteSequence, Transformation)>>;

#[derive(Clone, Debug)]
pub struct Analysis {
    pub subject: NoteSequence,
    pub matches: ScheduledMatches,
}

/// Extracts the subject of a fugue and finds its entries in every voice.
pub struct FugueAnalyzer {
    composition: Composition,
    config: AnalyzerConfig,
    extractor: FugalElementExtractor,
}

impl FugueAnalyzer {
    pub fn new(mut composition: Composition, config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        composition.optimize();
        let extractor = FugalElementExtractor::new(&composition.voices);
        Ok(FugueAnalyzer {composition, config, extractor})
    }

    pub fn composition(&self) -> &Composition {&self.composition}

    pub fn config(&self) -> &AnalyzerConfig {&self.config}

    pub fn extract_subject(&self) -> Result<NoteSequence> {
        self.extractor.extract_subject()
    }

    /// Unscheduled candidates per voice, possibly overlapping.
    pub fn find_candidates(&self, subject: &NoteSequence, transformations: &[Transformation]) -> BTreeMap<VoiceId, Vec<CandidateMatch>> {
        self.composition
            .voices
            .iter()
            .map(|(voice, stream)| (*voice, StreamMatcher::new(stream, subject, &self.config).match_all(transformations)))
            .collect()
    }

    /// Non-overlapping matches per voice in stream order.
    pub fn match_subject(&self, subject: &NoteSequence, transformations: &[Transformation]) -> ScheduledMatches {
        if subject.len() < 2 {
            warn!("Subject has {} notes; nothing to match", subject.len());
        }
        self.find_candidates(subject, transformations)
            .into_iter()
            .map(|(voice, candidates)| {
                let found = candidates.len();
                let scheduled: Vec<(NoteSequence, Transformation)> = SequenceScheduler::get_schedule(candidates)
                    .into_iter()
                    .map(|c| (c.sequence, c.transformation))
                    .collect();
                info!("Voice {}: {} candidates, {} scheduled", voice, found, scheduled.len());
                (voice, scheduled)
            })
            .collect()
    }

    pub fn analyze(&self, transformations: &[Transformation]) -> Result<Analysis> {
        let subject = self.extract_subject()?;
        info!("Subject: {}", subject.view_notes());
        let matches = self.match_subject(&subject, transformations);
        Ok(Analysis {subject, matches})
    }
}
