//! Keyboard state behind the REPL.
//!
//! A key is either pressed or highlighted. Pressed keys are the selection the
//! pattern lists are matched against; highlighted keys preview what a gesture
//! would produce without committing it.

use anyhow::{bail, Result};
use serde::Serialize;

use crate::model::settings::Settings;
use crate::theory::{Interval, Matches, Note, NoteList, PatternKind};

/// One entry of a scale or chord list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternRow {
    pub name: &'static str,
    /// Fraction of the pattern already pressed, when anything is pressed.
    pub score: Option<f64>,
    pub pressed: bool,
    pub highlighted: bool,
}

#[derive(Debug, Clone)]
pub struct Session {
    settings: Settings,
    pressed: NoteList,
    highlighted: NoteList,
    search: String,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            pressed: NoteList::new(),
            highlighted: NoteList::new(),
            search: String::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn pressed(&self) -> &NoteList {
        &self.pressed
    }

    pub fn highlighted(&self) -> &NoteList {
        &self.highlighted
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Toggles a key. Returns true when the key ends up pressed.
    pub fn press(&mut self, note: Note) -> bool {
        self.pressed = self.pressed.toggle(note, true).sort();
        self.pressed.contains(&note, true)
    }

    pub fn hover(&mut self, note: Note) {
        self.highlighted = self.pressed.add(note).sort();
    }

    pub fn clear_highlight(&mut self) {
        self.highlighted = NoteList::new();
    }

    /// Fills in a missing octave and checks it against the root selector.
    pub fn resolve_root(&self, root: &Note) -> Result<Note> {
        let octave = match root.octave() {
            Some(o) => o,
            None => self
                .pressed
                .root()
                .and_then(Note::octave)
                .unwrap_or_else(|| self.settings.default_octave()),
        };
        let octaves = &self.settings.root_octaves;
        if !octaves.is_empty() && !octaves.contains(&octave) {
            bail!(
                "root octave {} is not offered (choose from {})",
                octave,
                octaves.iter().map(|o| o.to_string()).collect::<Vec<_>>().join(", ")
            );
        }
        Ok(root.with_octave(octave))
    }

    fn rooted_at(&self, root: &Note) -> NoteList {
        self.pressed.transpose_to(root)
    }

    /// Moves the selection onto a new root, or presses the root alone.
    pub fn choose_root(&mut self, root: &Note) -> Result<&NoteList> {
        let root = self.resolve_root(root)?;
        self.pressed = self.rooted_at(&root);
        Ok(&self.pressed)
    }

    pub fn hover_root(&mut self, root: &Note) -> Result<&NoteList> {
        let root = self.resolve_root(root)?;
        self.highlighted = self.rooted_at(&root);
        Ok(&self.highlighted)
    }

    fn pattern_root(&self) -> Note {
        self.pressed
            .root()
            .copied()
            .unwrap_or(self.settings.default_root)
    }

    /// Presses every key of a pattern on the current root. Choosing the
    /// pattern that is already pressed releases everything instead.
    pub fn choose_pattern(&mut self, kind: PatternKind, name: &str) -> Result<&NoteList> {
        let pattern = kind.lookup(name)?;
        if self.pressed.exact().contains(kind, pattern.name) {
            self.clear_pressed();
        } else {
            self.pressed = NoteList::from_intervals(&self.pattern_root(), pattern.intervals);
        }
        Ok(&self.pressed)
    }

    /// Presses a pattern on an explicit root, replacing the selection.
    pub fn press_pattern(&mut self, kind: PatternKind, root: &Note, name: &str) -> Result<&NoteList> {
        let root = self.resolve_root(root)?;
        self.pressed = NoteList::from_pattern(kind, &root, name)?;
        Ok(&self.pressed)
    }

    pub fn preview_pattern(&mut self, kind: PatternKind, name: &str) -> Result<&NoteList> {
        self.highlighted = NoteList::from_pattern(kind, &self.pattern_root(), name)?;
        Ok(&self.highlighted)
    }

    pub fn transpose(&mut self, interval: &Interval) -> &NoteList {
        self.clear_highlight();
        self.pressed = self.pressed.transpose(interval).simplify();
        &self.pressed
    }

    /// Shifts the selection a semitone up or down.
    pub fn shift(&mut self, up: bool) -> &NoteList {
        let step = if up {
            Interval::MINOR_SECOND
        } else {
            Interval::MINOR_SECOND.reversed()
        };
        self.transpose(&step)
    }

    pub fn simplify(&mut self) -> &NoteList {
        self.pressed = self.pressed.simplify();
        &self.pressed
    }

    fn clear_pressed(&mut self) {
        self.pressed = NoteList::new();
        self.search.clear();
    }

    pub fn clear(&mut self) {
        self.clear_pressed();
        self.clear_highlight();
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search = text.into();
    }

    pub fn matches(&self) -> Matches {
        self.pressed.supersets()
    }

    /// The rows shown for one catalog: patterns the pressed keys can still
    /// become, narrowed by the search text and capped at the list limit.
    pub fn listed(&self, kind: PatternKind) -> Vec<PatternRow> {
        let supersets = self.pressed.supersets();
        let pressed_exact = self.pressed.exact();
        let highlighted_exact = self.highlighted.search().exact();
        let needle = self.search.to_lowercase();
        let filter = self.settings.filter_patterns && !self.pressed.is_empty();
        let limit = match self.settings.list_limit {
            0 => usize::MAX,
            n => n,
        };

        kind.catalog()
            .iter()
            .filter(|p| !filter || supersets.contains(kind, p.name))
            .filter(|p| needle.is_empty() || p.name.contains(needle.as_str()))
            .take(limit)
            .map(|p| PatternRow {
                name: p.name,
                score: supersets.score(kind, p.name),
                pressed: pressed_exact.contains(kind, p.name),
                highlighted: highlighted_exact.contains(kind, p.name),
            })
            .collect()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(s: &str) -> Note {
        s.parse().expect("note")
    }

    fn list(s: &str) -> NoteList {
        s.parse().expect("note list")
    }

    #[test]
    fn pressing_twice_releases() {
        let mut s = Session::default();
        assert!(s.press(n("E4")));
        assert!(s.press(n("C4")));
        assert_eq!(s.pressed(), &list("C4 E4"));
        assert!(!s.press(n("Fb4")));
        assert_eq!(s.pressed(), &list("C4"));
    }

    #[test]
    fn hover_previews_on_top_of_pressed() {
        let mut s = Session::default();
        s.press(n("C4"));
        s.hover(n("G4"));
        assert_eq!(s.highlighted(), &list("C4 G4"));
        assert_eq!(s.pressed(), &list("C4"));
        s.clear_highlight();
        assert!(s.highlighted().is_empty());
    }

    #[test]
    fn root_change_keeps_shape() {
        let mut s = Session::default();
        s.choose_root(&n("D")).unwrap();
        assert_eq!(s.pressed(), &list("D4"));
        s.choose_pattern(PatternKind::Chord, "minor").unwrap();
        assert_eq!(s.pressed(), &list("D4 F4 A4"));
        s.choose_root(&n("E3")).unwrap();
        assert_eq!(s.pressed(), &list("E3 G3 B3"));
        assert!(s.choose_root(&n("E7")).is_err());
        assert_eq!(s.pressed(), &list("E3 G3 B3"));
    }

    #[test]
    fn choosing_the_pressed_pattern_clears() {
        let mut s = Session::default();
        s.set_search("maj");
        s.choose_pattern(PatternKind::Chord, "Major").unwrap();
        assert_eq!(s.pressed(), &list("C4 E4 G4"));
        s.choose_pattern(PatternKind::Chord, "major").unwrap();
        assert!(s.pressed().is_empty());
        assert_eq!(s.search(), "");
        assert!(s.choose_pattern(PatternKind::Scale, "nope").is_err());
    }

    #[test]
    fn pattern_on_explicit_root() {
        let mut s = Session::default();
        s.press(n("G4"));
        s.press_pattern(PatternKind::Scale, &n("B3"), "minor pentatonic").unwrap();
        assert_eq!(s.pressed(), &list("B3 D4 E4 F#4 A4"));
        assert!(s.press_pattern(PatternKind::Scale, &n("B1"), "major").is_err());
    }

    #[test]
    fn arrows_shift_by_semitone_and_simplify() {
        let mut s = Session::default();
        s.choose_pattern(PatternKind::Chord, "major").unwrap();
        s.hover(n("B4"));
        s.shift(true);
        assert!(s.highlighted().is_empty());
        assert!(s.pressed().is_enharmonic(&list("Db4 F4 Ab4")));
        s.shift(false);
        s.shift(false);
        assert!(s.pressed().is_enharmonic(&list("B3 D#4 F#4")));
        assert!(s.pressed().iter().all(|n| n.accidentals().abs() <= 1));
    }

    #[test]
    fn listing_filters_and_flags() {
        let mut s = Session::default();
        assert_eq!(s.listed(PatternKind::Chord).len(), 12);

        s.press(n("C4"));
        s.press(n("E4"));
        s.press(n("G4"));
        let rows = s.listed(PatternKind::Chord);
        assert!(rows.iter().all(|r| r.name != "minor"));
        let major = rows.iter().find(|r| r.name == "major").unwrap();
        assert!(major.pressed);
        assert_eq!(major.score, Some(1.0));

        s.hover(n("B4"));
        let rows = s.listed(PatternKind::Chord);
        assert!(rows.iter().any(|r| r.name == "major 7th" && r.highlighted && !r.pressed));

        s.set_search("7th");
        assert!(s.listed(PatternKind::Chord).iter().all(|r| r.name.contains("7th")));
    }

    #[test]
    fn unfiltered_listing_shows_everything() {
        let settings = Settings {
            filter_patterns: false,
            list_limit: 0,
            ..Settings::default()
        };
        let mut s = Session::new(settings);
        s.press(n("C4"));
        s.press(n("Eb4"));
        s.press(n("E4"));
        assert_eq!(s.listed(PatternKind::Scale).len(), PatternKind::Scale.catalog().len());
    }
}
