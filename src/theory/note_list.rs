use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::catalog::PatternKind;
use super::error::TheoryError;
use super::interval::Interval;
use super::note::{Note, Spelling};

/// An immutable, sorted, duplicate-free set of notes. The first note is the
/// root. Every operation returns a new list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NoteList {
    notes: Vec<Note>,
}

fn sort_key(note: &Note) -> (i32, i32) {
    (note.value(), note.letter().index())
}

impl NoteList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from any notes; order does not matter and enharmonic
    /// duplicates after the first are dropped.
    pub fn from_notes(notes: impl IntoIterator<Item = Note>) -> Self {
        let mut list = Self::new();
        for note in notes {
            list.insert(note);
        }
        list
    }

    fn insert(&mut self, note: Note) {
        if self.notes.iter().any(|n| n.is_enharmonic(&note)) {
            return;
        }
        let key = sort_key(&note);
        let pos = self.notes.partition_point(|n| sort_key(n) <= key);
        self.notes.insert(pos, note);
    }

    /// Root plus the root shifted by each interval. Extra notes are spelled
    /// with flats when the root is flat, sharps otherwise.
    pub fn from_intervals(root: &Note, intervals: &[i32]) -> Self {
        let spelling = Spelling::of(root);
        let mut list = Self::from_notes([*root]);
        for &semitones in intervals.iter().filter(|&&i| i != 0) {
            list.insert(root.offset(semitones, spelling));
        }
        list
    }

    pub fn from_pattern(kind: PatternKind, root: &Note, name: &str) -> Result<Self, TheoryError> {
        let pattern = kind.lookup(name)?;
        Ok(Self::from_intervals(root, pattern.intervals))
    }

    pub fn from_scale(root: &Note, name: &str) -> Result<Self, TheoryError> {
        Self::from_pattern(PatternKind::Scale, root, name)
    }

    pub fn from_chord(root: &Note, name: &str) -> Result<Self, TheoryError> {
        Self::from_pattern(PatternKind::Chord, root, name)
    }

    /// Parses a root followed by a pattern name, e.g. `"B3 minor pentatonic"`.
    pub fn parse_pattern(kind: PatternKind, text: &str) -> Result<Self, TheoryError> {
        let text = text.trim();
        let (root, name) = text
            .split_once(char::is_whitespace)
            .ok_or_else(|| TheoryError::parse(text, "expected '<root> <pattern name>'"))?;
        let root: Note = root.parse()?;
        Self::from_pattern(kind, &root, name)
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Note> {
        self.notes.iter()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn root(&self) -> Option<&Note> {
        self.notes.first()
    }

    pub fn contains(&self, note: &Note, by_enharmonic: bool) -> bool {
        self.notes.iter().any(|n| same(n, note, by_enharmonic))
    }

    /// Semitones from the root to every note, starting with the root's 0.
    pub fn intervals(&self) -> Vec<i32> {
        match self.root() {
            Some(root) => self.notes.iter().map(|n| n.semitones_from(root)).collect(),
            None => Vec::new(),
        }
    }

    /// Pitch-class set of the intervals as a 12-bit mask.
    pub fn mask(&self) -> u16 {
        self.intervals()
            .into_iter()
            .fold(0u16, |mask, i| mask | 1 << i.rem_euclid(12))
    }

    pub fn add(&self, note: Note) -> NoteList {
        let mut list = self.clone();
        list.insert(note);
        list
    }

    pub fn remove(&self, note: &Note, by_enharmonic: bool) -> NoteList {
        NoteList {
            notes: self
                .notes
                .iter()
                .filter(|n| !same(n, note, by_enharmonic))
                .copied()
                .collect(),
        }
    }

    pub fn toggle(&self, note: Note, by_enharmonic: bool) -> NoteList {
        if self.contains(&note, by_enharmonic) {
            self.remove(&note, by_enharmonic)
        } else {
            self.add(note)
        }
    }

    /// Lists are kept in ascending order, so this is a copy; kept as an
    /// explicit step for callers that mirror the press-then-sort gesture.
    pub fn sort(&self) -> NoteList {
        Self::from_notes(self.notes.iter().copied())
    }

    pub fn transpose(&self, interval: &Interval) -> NoteList {
        Self::from_notes(self.notes.iter().map(|n| n.transpose(interval)))
    }

    pub fn transpose_semitones(&self, semitones: i32) -> NoteList {
        Self::from_notes(self.notes.iter().map(|n| n.transpose_semitones(semitones)))
    }

    /// Same interval structure rebuilt on a new root.
    pub fn transpose_to(&self, new_root: &Note) -> NoteList {
        if self.is_empty() {
            return Self::from_notes([*new_root]);
        }
        Self::from_intervals(new_root, &self.intervals())
    }

    pub fn simplify(&self) -> NoteList {
        Self::from_notes(self.notes.iter().map(Note::simplify))
    }

    pub fn is_enharmonic(&self, other: &NoteList) -> bool {
        self.len() == other.len()
            && self
                .notes
                .iter()
                .zip(other.notes.iter())
                .all(|(a, b)| a.is_enharmonic(b))
    }
}

fn same(a: &Note, b: &Note, by_enharmonic: bool) -> bool {
    if by_enharmonic {
        a.is_enharmonic(b)
    } else {
        a == b
    }
}

impl fmt::Display for NoteList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, note) in self.notes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", note)?;
        }
        Ok(())
    }
}

impl FromStr for NoteList {
    type Err = TheoryError;

    /// Whitespace- or comma-separated notes, e.g. `"C4 E4 G4"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let notes = s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .map(str::parse::<Note>)
            .collect::<Result<Vec<Note>, _>>()?;
        Ok(Self::from_notes(notes))
    }
}

impl<'a> IntoIterator for &'a NoteList {
    type Item = &'a Note;
    type IntoIter = std::slice::Iter<'a, Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.notes.iter()
    }
}
