use num::rational::Rational64;
use num::{One, Zero};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::ops::{Add, AddAssign, Div, Mul};
use std::str::FromStr;

use crate::{AnalysisError, Result};

pub type Pitch = i16;
pub type VoiceId = usize;
pub type SourceNoteId = usize;

const NOTES_PER_OCTAVE: Pitch = 12;
const NOTE_NAMES: [&str; NOTES_PER_OCTAVE as usize] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
const REST_TOKEN: &str = "r";
const MAX_PITCH: Pitch = 127;

/// Exact note length in score units (a quarter note is 1).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Duration(Rational64);

impl Duration {
    pub fn new(numer: i64, denom: i64) -> Self {
        Duration(Rational64::new(numer, denom))
    }

    pub fn whole(beats: i64) -> Self {
        Duration(Rational64::from_integer(beats))
    }

    pub fn zero() -> Self {
        Duration(Rational64::zero())
    }

    pub fn one() -> Self {
        Duration(Rational64::one())
    }

    /// Larger over smaller, so the result is always at least 1. Identical
    /// durations give exactly 1.
    pub fn ratio_to(&self, other: Duration) -> f64 {
        if self.0 == other.0 {
            return 1.0;
        }
        let (hi, lo) = if self.0 > other.0 { (self.0, other.0) } else { (other.0, self.0) };
        if lo.is_zero() {
            return f64::INFINITY;
        }
        rational_to_f64(hi / lo)
    }
}

fn rational_to_f64(r: Rational64) -> f64 {
    *r.numer() as f64 / *r.denom() as f64
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Self) -> Self::Output {
        Duration(self.0 + rhs.0)
    }
}

impl AddAssign for Duration {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Mul<i64> for Duration {
    type Output = Duration;

    fn mul(self, rhs: i64) -> Self::Output {
        Duration(self.0 * rhs)
    }
}

impl Div<i64> for Duration {
    type Output = Duration;

    fn div(self, rhs: i64) -> Self::Output {
        Duration(self.0 / rhs)
    }
}

impl Display for Duration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.0.is_integer() {
            write!(f, "{}", self.0.numer())
        } else {
            write!(f, "{}/{}", self.0.numer(), self.0.denom())
        }
    }
}

impl FromStr for Duration {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        let value = Rational64::from_str(s.trim())
            .map_err(|_| AnalysisError::Parse(format!("bad duration '{s}'")))?;
        if value <= Rational64::zero() {
            return Err(AnalysisError::Parse(format!("duration '{s}' must be positive")));
        }
        Ok(Duration(value))
    }
}

/// Signed semitone step between two consecutive notes. A rest on either side
/// breaks the melodic line, so the step becomes `Rest`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Interval {
    Rest,
    Sounding(i16),
}

impl Interval {
    pub fn between(left: &Note, right: &Note) -> Self {
        match (left.pitch, right.pitch) {
            (Some(a), Some(b)) => Interval::Sounding(b.saturating_sub(a)),
            _ => Interval::Rest,
        }
    }

    pub fn is_rest(&self) -> bool {
        *self == Interval::Rest
    }

    pub fn value(&self) -> Option<i16> {
        match self {
            Interval::Rest => None,
            Interval::Sounding(v) => Some(*v),
        }
    }

    /// Zero for a rest.
    pub fn magnitude(&self) -> f64 {
        self.value().map_or(0.0, |v| v.abs() as f64)
    }

    pub fn negated(&self) -> Self {
        match self {
            Interval::Rest => Interval::Rest,
            Interval::Sounding(v) => Interval::Sounding(-v),
        }
    }

    pub fn combined(&self, other: Interval) -> Self {
        match (self, other) {
            (Interval::Sounding(a), Interval::Sounding(b)) => Interval::Sounding(a.saturating_add(b)),
            _ => Interval::Rest,
        }
    }
}

impl From<Option<i16>> for Interval {
    fn from(value: Option<i16>) -> Self {
        value.map_or(Interval::Rest, Interval::Sounding)
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Interval::Rest => write!(f, "_"),
            Interval::Sounding(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Note {
    pitch: Option<Pitch>,
    duration: Duration,
    ids: Vec<SourceNoteId>,
}

impl Note {
    pub fn sounding(pitch: Pitch, duration: Duration) -> Self {
        Note {pitch: Some(pitch), duration, ids: vec![]}
    }

    pub fn rest(duration: Duration) -> Self {
        Note {pitch: None, duration, ids: vec![]}
    }

    pub fn tagged(pitch: Option<Pitch>, duration: Duration, ids: Vec<SourceNoteId>) -> Self {
        Note {pitch, duration, ids}
    }

    pub fn pitch(&self) -> Option<Pitch> {self.pitch}

    pub fn duration(&self) -> Duration {self.duration}

    pub fn ids(&self) -> &[SourceNoteId] {&self.ids}

    pub fn is_rest(&self) -> bool {
        self.pitch.is_none()
    }

    pub fn is_tagged(&self) -> bool {
        !self.ids.is_empty()
    }

    pub fn extend_duration(&mut self, other: &Note) {
        assert_eq!(self.pitch, other.pitch);
        self.duration += other.duration;
        self.ids.extend_from_slice(&other.ids);
    }

    fn name(&self) -> String {
        match self.pitch {
            None => "Rest".to_string(),
            Some(p) => format!("{}{}", NOTE_NAMES[p.rem_euclid(NOTES_PER_OCTAVE) as usize], p.div_euclid(NOTES_PER_OCTAVE) - 1),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NoteSequence {
    notes: Vec<Note>,
}

impl NoteSequence {
    pub fn new() -> Self {
        NoteSequence { notes: vec![] }
    }

    pub fn from_notes(notes: Vec<Note>) -> Self {
        NoteSequence { notes }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }

    pub fn add(&mut self, n: Note) {
        self.notes.push(n);
    }

    pub fn extend(&mut self, other: &NoteSequence) {
        self.notes.extend(other.notes.iter().cloned());
    }

    /// Copy of notes `start..end`.
    pub fn fragment(&self, start: usize, end: usize) -> NoteSequence {
        NoteSequence {notes: self.notes[start..end].to_vec()}
    }

    pub fn intervals(&self) -> Vec<Interval> {
        self.notes.windows(2).map(|w| Interval::between(&w[0], &w[1])).collect()
    }

    pub fn durations(&self) -> Vec<Duration> {
        self.notes.iter().map(|n| n.duration).collect()
    }

    /// Intervals leaving notes `low..high`, i.e. the steps inside the
    /// inclusive note range `[low, high]`.
    pub fn intervals_between(&self, low: usize, high: usize) -> Vec<Interval> {
        assert!(high < self.notes.len());
        (low..high).map(|i| Interval::between(&self.notes[i], &self.notes[i + 1])).collect()
    }

    /// Durations of notes `low..high`, paired index by index with
    /// `intervals_between(low, high)`.
    pub fn durations_between(&self, low: usize, high: usize) -> Vec<Duration> {
        assert!(high <= self.notes.len());
        self.notes[low..high].iter().map(|n| n.duration).collect()
    }

    /// Interval and duration tokens of the whole sequence.
    pub fn tokens(&self) -> (Vec<Interval>, Vec<Duration>) {
        if self.notes.len() < 2 {
            (vec![], vec![])
        } else {
            let last = self.notes.len() - 1;
            (self.intervals_between(0, last), self.durations_between(0, last))
        }
    }

    pub fn next_note_index(&self, from: usize) -> Option<usize> {
        (from + 1..self.notes.len()).find(|i| !self.notes[*i].is_rest())
    }

    pub fn next_rest_index(&self, from: usize) -> Option<usize> {
        (from + 1..self.notes.len()).find(|i| self.notes[*i].is_rest())
    }

    pub fn first_sounding_index(&self, from: usize) -> Option<usize> {
        (from..self.notes.len()).find(|i| !self.notes[*i].is_rest())
    }

    pub fn total_duration(&self) -> Duration {
        self.notes.iter().fold(Duration::zero(), |total, n| total + n.duration)
    }

    /// First id of the first note and last id of the last note.
    pub fn id_span(&self) -> Option<(SourceNoteId, SourceNoteId)> {
        let first = self.notes.first()?.ids.first()?;
        let last = self.notes.last()?.ids.last()?;
        Some((*first, *last))
    }

    /// Merges runs of consecutive rests. Tagged and untagged rests are never
    /// merged into each other.
    pub fn optimize(&mut self) -> &mut Self {
        let mut result: Vec<Note> = Vec::with_capacity(self.notes.len());
        for note in self.notes.drain(..) {
            match result.last_mut() {
                Some(prev) if prev.is_rest() && note.is_rest() && prev.is_tagged() == note.is_tagged() => {
                    prev.extend_duration(&note);
                }
                _ => result.push(note),
            }
        }
        self.notes = result;
        self
    }

    pub fn trim_trailing_rests(&mut self) {
        while self.notes.last().map_or(false, |n| n.is_rest()) {
            self.notes.pop();
        }
    }

    pub fn view_notes(&self) -> String {
        self.notes
            .iter()
            .map(|n| format!("{}[{}]", n.name(), n.duration))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::ops::Index<usize> for NoteSequence {
    type Output = Note;

    fn index(&self, index: usize) -> &Self::Output {
        &self.notes[index]
    }
}

pub struct IdGenerator {
    next: SourceNoteId,
}

impl IdGenerator {
    pub fn new() -> Self {
        IdGenerator {next: 0}
    }

    pub fn next_id(&mut self) -> SourceNoteId {
        let id = self.next;
        self.next += 1;
        id
    }
}

#[derive(Clone, Debug, Default)]
pub struct Composition {
    pub voices: BTreeMap<VoiceId, NoteSequence>,
}

impl Composition {
    pub fn new(voices: BTreeMap<VoiceId, NoteSequence>) -> Self {
        Composition {voices}
    }

    pub fn optimize(&mut self) {
        for voice in self.voices.values_mut() {
            voice.optimize();
        }
    }

    fn parse_note(token: &str, ids: &mut IdGenerator) -> Result<Note> {
        let (pitch, duration) = token
            .split_once(':')
            .ok_or_else(|| AnalysisError::Parse(format!("expected pitch:duration, found '{token}'")))?;
        let duration = duration.parse::<Duration>()?;
        let pitch = if pitch.eq_ignore_ascii_case(REST_TOKEN) {
            None
        } else {
            let value = pitch.parse::<Pitch>().map_err(|_| AnalysisError::Parse(format!("bad pitch '{pitch}'")))?;
            if !(0..=MAX_PITCH).contains(&value) {
                return Err(AnalysisError::Parse(format!("pitch {value} outside 0..={MAX_PITCH}")));
            }
            Some(value)
        };
        Ok(Note::tagged(pitch, duration, vec![ids.next_id()]))
    }
}

/// One voice per non-empty line, `#` starts a comment. Each token is
/// `pitch:duration` (MIDI pitch) or `r:duration`.
impl FromStr for Composition {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        let mut ids = IdGenerator::new();
        let mut voices = BTreeMap::new();
        for line in s.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let notes = line
                .split_whitespace()
                .map(|token| Self::parse_note(token, &mut ids))
                .collect::<Result<Vec<_>>>()?;
            voices.insert(voices.len(), NoteSequence::from_notes(notes));
        }
        Ok(Composition {voices})
    }
}
