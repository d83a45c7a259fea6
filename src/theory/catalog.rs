//! The fixed scale and chord catalogs.
//!
//! Each pattern is an ascending list of semitone offsets from an implicit
//! root. Matching works on the pitch-class set of those offsets, stored as a
//! 12-bit mask (bit i set means i semitones above the root, modulo octave).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::TheoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Scale,
    Chord,
}

impl PatternKind {
    pub const ALL: [PatternKind; 2] = [PatternKind::Scale, PatternKind::Chord];

    pub fn catalog(self) -> &'static [PatternDef] {
        match self {
            PatternKind::Scale => SCALES,
            PatternKind::Chord => CHORDS,
        }
    }

    pub fn lookup(self, name: &str) -> Result<&'static PatternDef, TheoryError> {
        let wanted = name.trim();
        self.catalog()
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| TheoryError::UnknownPattern {
                kind: self,
                name: wanted.to_string(),
            })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PatternKind::Scale => "scale",
            PatternKind::Chord => "chord",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            PatternKind::Scale => "scales",
            PatternKind::Chord => "chords",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatternKind {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scale" | "scales" => Ok(PatternKind::Scale),
            "chord" | "chords" => Ok(PatternKind::Chord),
            _ => Err(TheoryError::parse(s, "expected 'scale' or 'chord'")),
        }
    }
}

#[derive(Debug)]
pub struct PatternDef {
    pub name: &'static str,
    pub intervals: &'static [i32],
    mask: u16,
}

impl PatternDef {
    const fn new(name: &'static str, intervals: &'static [i32]) -> Self {
        let mut mask = 0u16;
        let mut i = 0;
        while i < intervals.len() {
            mask |= 1 << intervals[i].rem_euclid(12);
            i += 1;
        }
        Self {
            name,
            intervals,
            mask,
        }
    }

    /// Pitch-class set relative to the root.
    pub fn mask(&self) -> u16 {
        self.mask
    }

    /// Number of distinct pitch classes.
    pub fn size(&self) -> u32 {
        self.mask.count_ones()
    }
}

pub static SCALES: &[PatternDef] = &[
    PatternDef::new("major", &[0, 2, 4, 5, 7, 9, 11]),
    PatternDef::new("minor", &[0, 2, 3, 5, 7, 8, 10]),
    PatternDef::new("harmonic minor", &[0, 2, 3, 5, 7, 8, 11]),
    PatternDef::new("melodic minor", &[0, 2, 3, 5, 7, 9, 11]),
    PatternDef::new("dorian", &[0, 2, 3, 5, 7, 9, 10]),
    PatternDef::new("phrygian", &[0, 1, 3, 5, 7, 8, 10]),
    PatternDef::new("lydian", &[0, 2, 4, 6, 7, 9, 11]),
    PatternDef::new("mixolydian", &[0, 2, 4, 5, 7, 9, 10]),
    PatternDef::new("locrian", &[0, 1, 3, 5, 6, 8, 10]),
    PatternDef::new("major pentatonic", &[0, 2, 4, 7, 9]),
    PatternDef::new("minor pentatonic", &[0, 3, 5, 7, 10]),
    PatternDef::new("blues", &[0, 3, 5, 6, 7, 10]),
    PatternDef::new("whole tone", &[0, 2, 4, 6, 8, 10]),
    PatternDef::new("diminished", &[0, 2, 3, 5, 6, 8, 9, 11]),
    PatternDef::new("chromatic", &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]),
];

pub static CHORDS: &[PatternDef] = &[
    PatternDef::new("major", &[0, 4, 7]),
    PatternDef::new("minor", &[0, 3, 7]),
    PatternDef::new("augmented", &[0, 4, 8]),
    PatternDef::new("diminished", &[0, 3, 6]),
    PatternDef::new("sus2", &[0, 2, 7]),
    PatternDef::new("sus4", &[0, 5, 7]),
    PatternDef::new("power", &[0, 7]),
    PatternDef::new("major 6th", &[0, 4, 7, 9]),
    PatternDef::new("minor 6th", &[0, 3, 7, 9]),
    PatternDef::new("dominant 7th", &[0, 4, 7, 10]),
    PatternDef::new("major 7th", &[0, 4, 7, 11]),
    PatternDef::new("minor 7th", &[0, 3, 7, 10]),
    PatternDef::new("minor major 7th", &[0, 3, 7, 11]),
    PatternDef::new("diminished 7th", &[0, 3, 6, 9]),
    PatternDef::new("half-diminished 7th", &[0, 3, 6, 10]),
    PatternDef::new("augmented 7th", &[0, 4, 8, 10]),
    PatternDef::new("add9", &[0, 4, 7, 14]),
    PatternDef::new("dominant 9th", &[0, 4, 7, 10, 14]),
    PatternDef::new("major 9th", &[0, 4, 7, 11, 14]),
    PatternDef::new("minor 9th", &[0, 3, 7, 10, 14]),
];

pub fn catalog(kind: PatternKind) -> &'static [PatternDef] {
    kind.catalog()
}
