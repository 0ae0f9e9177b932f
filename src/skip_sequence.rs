use std::collections::BTreeMap;
use vecmap::VecMap;

use crate::{Duration, Note, NoteSequence, VoiceId};

/// A voice's note starting at some moment, and the moment it ends.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SkipNode {
    pub note_index: usize,
    pub next_moment: usize,
}

/// Lines up every voice on one shared timeline. Moment `m` is the `m`-th
/// distinct onset (or final release) across all voices, and each voice links
/// its notes forward from moment to moment, so voices with unrelated
/// rhythms can be walked together by time instead of by note index.
pub struct SkipSequence {
    voices: BTreeMap<VoiceId, NoteSequence>,
    timestamps: Vec<Duration>,
    head: Vec<VecMap<VoiceId, SkipNode>>,
}

impl SkipSequence {
    pub fn new(voices: &BTreeMap<VoiceId, NoteSequence>) -> Self {
        let mut voices = voices.clone();
        for voice in voices.values_mut() {
            voice.optimize();
        }

        let mut timestamps = vec![Duration::zero()];
        for voice in voices.values() {
            let mut time = Duration::zero();
            for note in voice.iter() {
                time += note.duration();
                timestamps.push(time);
            }
        }
        timestamps.sort();
        timestamps.dedup();

        let moment_of = |time: &Duration| timestamps.binary_search(time).unwrap_or_else(|i| i);
        let mut head: Vec<VecMap<VoiceId, SkipNode>> = (0..timestamps.len()).map(|_| VecMap::new()).collect();
        for (voice_id, voice) in voices.iter() {
            let mut time = Duration::zero();
            for (note_index, note) in voice.iter().enumerate() {
                let moment = moment_of(&time);
                time += note.duration();
                head[moment].insert(*voice_id, SkipNode {note_index, next_moment: moment_of(&time)});
            }
        }
        SkipSequence {voices, timestamps, head}
    }

    pub fn len(&self) -> usize {
        self.head.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_empty()
    }

    pub fn voices(&self) -> &BTreeMap<VoiceId, NoteSequence> {&self.voices}

    pub fn time(&self, moment: usize) -> Option<Duration> {
        self.timestamps.get(moment).copied()
    }

    pub fn entry(&self, moment: usize, voice: VoiceId) -> Option<&SkipNode> {
        self.head.get(moment)?.get(&voice)
    }

    /// The note `voice` starts at `moment`, if any.
    pub fn get_note(&self, moment: usize, voice: VoiceId) -> Option<&Note> {
        let node = self.entry(moment, voice)?;
        Some(&self.voices.get(&voice)?[node.note_index])
    }

    pub fn next_moment(&self, moment: usize, voice: VoiceId) -> Option<usize> {
        self.entry(moment, voice).map(|node| node.next_moment)
    }

    /// The note `voice` is holding at `moment`, whenever it started.
    pub fn active_note(&self, moment: usize, voice: VoiceId) -> Option<&Note> {
        let (start, node) = (0..=moment).rev().find_map(|m| self.entry(m, voice).map(|node| (m, node)))?;
        if node.next_moment > moment {
            self.get_note(start, voice)
        } else {
            None
        }
    }

    /// No voice other than `lead` is sounding at `moment`. Resting voices and
    /// voices that have ended do not count.
    pub fn is_solo(&self, moment: usize, lead: VoiceId) -> bool {
        self.voices
            .keys()
            .filter(|voice| **voice != lead)
            .all(|voice| self.active_note(moment, *voice).map_or(true, |note| note.is_rest()))
    }

    /// First later moment where `voice` starts a sounding note.
    pub fn next_note(&self, moment: usize, voice: VoiceId) -> Option<usize> {
        self.next_where(moment, voice, |note| !note.is_rest())
    }

    /// First later moment where `voice` starts a rest.
    pub fn next_rest(&self, moment: usize, voice: VoiceId) -> Option<usize> {
        self.next_where(moment, voice, |note| note.is_rest())
    }

    /// Moment of the first sounding note of `voice`.
    pub fn first_note(&self, voice: VoiceId) -> Option<usize> {
        match self.get_note(0, voice) {
            Some(note) if !note.is_rest() => Some(0),
            _ => self.next_note(0, voice),
        }
    }

    fn next_where<F: Fn(&Note) -> bool>(&self, moment: usize, voice: VoiceId, wanted: F) -> Option<usize> {
        let mut current = moment;
        loop {
            let next = self.next_moment(current, voice)?;
            if wanted(self.get_note(next, voice)?) {
                return Some(next);
            }
            current = next;
        }
    }
}
