//! Scoring a note list against the scale and chord catalogs.
//!
//! All queries compare pitch-class sets relative to the list's root. A
//! pattern that is incompatible with the query is left out of the result, so
//! presence in a [`Matches`] means "compatible" and a score of 1.0 means an
//! exact match. An empty list matches nothing.

use serde::Serialize;

use super::catalog::{PatternDef, PatternKind};
use super::note_list::NoteList;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternScore {
    pub name: &'static str,
    pub score: f64,
}

impl PatternScore {
    pub fn is_exact(&self) -> bool {
        self.score >= 1.0
    }
}

/// Scores per catalog, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Matches {
    scales: Vec<PatternScore>,
    chords: Vec<PatternScore>,
}

impl Matches {
    pub fn scales(&self) -> &[PatternScore] {
        &self.scales
    }

    pub fn chords(&self) -> &[PatternScore] {
        &self.chords
    }

    pub fn of_kind(&self, kind: PatternKind) -> &[PatternScore] {
        match kind {
            PatternKind::Scale => &self.scales,
            PatternKind::Chord => &self.chords,
        }
    }

    pub fn score(&self, kind: PatternKind, name: &str) -> Option<f64> {
        self.of_kind(kind)
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.score)
    }

    pub fn contains(&self, kind: PatternKind, name: &str) -> bool {
        self.score(kind, name).is_some()
    }

    pub fn names(&self, kind: PatternKind) -> Vec<&'static str> {
        self.of_kind(kind).iter().map(|p| p.name).collect()
    }

    pub fn exact(&self) -> ExactMatches {
        let pick = |scores: &[PatternScore]| {
            scores
                .iter()
                .filter(|p| p.is_exact())
                .map(|p| p.name)
                .collect()
        };
        ExactMatches {
            scales: pick(&self.scales),
            chords: pick(&self.chords),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty() && self.chords.is_empty()
    }
}

/// Names of the patterns that match exactly, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExactMatches {
    scales: Vec<&'static str>,
    chords: Vec<&'static str>,
}

impl ExactMatches {
    pub fn scales(&self) -> &[&'static str] {
        &self.scales
    }

    pub fn chords(&self) -> &[&'static str] {
        &self.chords
    }

    pub fn of_kind(&self, kind: PatternKind) -> &[&'static str] {
        match kind {
            PatternKind::Scale => &self.scales,
            PatternKind::Chord => &self.chords,
        }
    }

    pub fn contains(&self, kind: PatternKind, name: &str) -> bool {
        self.of_kind(kind).iter().any(|n| *n == name)
    }
}

fn score_catalog(
    kind: PatternKind,
    mask: u16,
    rule: impl Fn(&PatternDef, u16) -> Option<f64>,
) -> Vec<PatternScore> {
    kind.catalog()
        .iter()
        .filter_map(|p| rule(p, mask).map(|score| PatternScore { name: p.name, score }))
        .collect()
}

fn score_all(list: &NoteList, rule: impl Fn(&PatternDef, u16) -> Option<f64>) -> Matches {
    if list.is_empty() {
        return Matches::default();
    }
    let mask = list.mask();
    Matches {
        scales: score_catalog(PatternKind::Scale, mask, &rule),
        chords: score_catalog(PatternKind::Chord, mask, &rule),
    }
}

/// The list could still grow into the pattern: its set is a subset of the
/// pattern's. Score is the covered fraction of the pattern.
fn superset_rule(pattern: &PatternDef, mask: u16) -> Option<f64> {
    (mask & !pattern.mask() == 0).then(|| mask.count_ones() as f64 / pattern.size() as f64)
}

/// The pattern is found inside the list, extra notes allowed. Score is the
/// fraction of the list the pattern explains.
fn subset_rule(pattern: &PatternDef, mask: u16) -> Option<f64> {
    (pattern.mask() & !mask == 0).then(|| pattern.size() as f64 / mask.count_ones() as f64)
}

impl NoteList {
    /// Patterns this selection is part of, with the fraction of each pattern
    /// already pressed.
    pub fn supersets(&self) -> Matches {
        score_all(self, superset_rule)
    }

    /// Patterns with exactly this pitch-class set.
    pub fn exact(&self) -> ExactMatches {
        if self.is_empty() {
            return ExactMatches::default();
        }
        let mask = self.mask();
        let pick = |kind: PatternKind| {
            kind.catalog()
                .iter()
                .filter(|p| p.mask() == mask)
                .map(|p| p.name)
                .collect()
        };
        ExactMatches {
            scales: pick(PatternKind::Scale),
            chords: pick(PatternKind::Chord),
        }
    }

    /// Patterns contained in a transient (hovered) selection. A score of 1.0
    /// marks the exact matches used for highlighting.
    pub fn search(&self) -> Matches {
        score_all(self, subset_rule)
    }
}
