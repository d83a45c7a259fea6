//! Output styling for the piano-finder REPL.
//!
//! Everything renders to plain strings. Color is applied with crossterm only
//! when the caller asks for it, so tests and piped output stay clean.

use crossterm::style::Stylize;

use crate::session::PatternRow;
use crate::theory::{NoteList, PatternKind};

pub const EMOJI_KEYS: &str = "🎹";
pub const EMOJI_NOTE: &str = "♪";
pub const EMOJI_PLAY: &str = "▶";
pub const EMOJI_STOP: &str = "⏹";
pub const EMOJI_MUTE: &str = "🔇";
pub const EMOJI_UNMUTE: &str = "🔊";
pub const EMOJI_CHECK: &str = "✓";
pub const EMOJI_SEARCH: &str = "🔍";
pub const EMOJI_WAVE: &str = "👋";

pub const KEY_PRESSED: char = '●';
pub const KEY_HIGHLIGHTED: char = '○';
pub const KEY_IDLE: char = '·';

const KEY_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

pub fn format_prompt(root: Option<String>, muted: bool) -> String {
    let root = root.unwrap_or_else(|| "-".into());
    if muted {
        format!("{} {} {} › ", EMOJI_KEYS, root, EMOJI_MUTE)
    } else {
        format!("{} {} › ", EMOJI_KEYS, root)
    }
}

pub fn success(msg: &str) -> String {
    format!("  {} {}", EMOJI_CHECK, msg)
}

pub fn goodbye() -> String {
    format!("{} bye", EMOJI_WAVE)
}

pub fn muted(on: bool) -> String {
    if on {
        format!("  {} muted", EMOJI_MUTE)
    } else {
        format!("  {} unmuted", EMOJI_UNMUTE)
    }
}

pub fn playing(what: &str, notes: &NoteList) -> String {
    format!("  {} {} {}", EMOJI_PLAY, what, notes)
}

pub fn stopped() -> String {
    format!("  {} stopped", EMOJI_STOP)
}

pub fn searching(text: &str) -> String {
    if text.is_empty() {
        format!("  {} search cleared", EMOJI_SEARCH)
    } else {
        format!("  {} search \"{}\"", EMOJI_SEARCH, text)
    }
}

/// `pressed: C4 E4 G4`, or a dash when empty.
pub fn note_line(label: &str, notes: &NoteList) -> String {
    if notes.is_empty() {
        format!("  {} {}: -", EMOJI_NOTE, label)
    } else {
        format!("  {} {}: {}", EMOJI_NOTE, label, notes)
    }
}

/// Octaves to draw: the configured ones widened to fit every sounding note.
fn keyboard_octaves(pressed: &NoteList, highlighted: &NoteList, octaves: &[i32]) -> Vec<i32> {
    let sounding = pressed
        .iter()
        .chain(highlighted.iter())
        .filter_map(|n| n.pitch().map(|p| p.div_euclid(12) - 1));
    let all: Vec<i32> = octaves.iter().copied().chain(sounding).collect();
    match (all.iter().min(), all.iter().max()) {
        (Some(lo), Some(hi)) => (*lo..=*hi).collect(),
        _ => Vec::new(),
    }
}

/// One row per octave, one column per key.
pub fn keyboard(pressed: &NoteList, highlighted: &NoteList, octaves: &[i32], color: bool) -> String {
    let has = |list: &NoteList, pitch: i32| list.iter().any(|n| n.pitch() == Some(pitch));
    let mut out = String::from("     ");
    for name in KEY_NAMES {
        out.push_str(&format!("{:<3}", name));
    }
    let mut out = vec![out.trim_end().to_string()];
    for octave in keyboard_octaves(pressed, highlighted, octaves) {
        let mut row = format!("  {:>2} ", octave);
        for pc in 0..12 {
            let pitch = (octave + 1) * 12 + pc;
            let cell = if has(pressed, pitch) {
                paint(KEY_PRESSED, color, true)
            } else if has(highlighted, pitch) {
                paint(KEY_HIGHLIGHTED, color, false)
            } else {
                KEY_IDLE.to_string()
            };
            row.push_str(&cell);
            row.push_str("  ");
        }
        out.push(row.trim_end().to_string());
    }
    out.join("\n")
}

fn paint(mark: char, color: bool, pressed: bool) -> String {
    match (color, pressed) {
        (false, _) => mark.to_string(),
        (true, true) => mark.to_string().green().bold().to_string(),
        (true, false) => mark.to_string().yellow().to_string(),
    }
}

/// A catalog list with pressed/highlighted markers and coverage.
pub fn pattern_rows(kind: PatternKind, rows: &[PatternRow], color: bool) -> String {
    let mut out = vec![format!("  {} ({})", kind.plural(), rows.len())];
    if rows.is_empty() {
        out.push("    (no matches)".into());
    }
    for row in rows {
        let mark = if row.pressed {
            paint(KEY_PRESSED, color, true)
        } else if row.highlighted {
            paint(KEY_HIGHLIGHTED, color, false)
        } else {
            " ".to_string()
        };
        let line = match row.score {
            Some(score) => format!("    {} {:<22} {:>3.0}%", mark, row.name, score * 100.0),
            None => format!("    {} {}", mark, row.name),
        };
        out.push(line.trim_end().to_string());
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(s: &str) -> NoteList {
        s.parse().expect("note list")
    }

    #[test]
    fn prompt_shows_root_and_mute() {
        assert!(format_prompt(Some("C4".into()), false).contains("C4"));
        assert!(format_prompt(None, true).contains(EMOJI_MUTE));
    }

    #[test]
    fn keyboard_marks_pressed_and_highlighted() {
        let kb = keyboard(&list("C4 E4"), &list("C4 E4 G4"), &[4], false);
        let lines: Vec<&str> = kb.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].trim_start().starts_with("C  C# D"));
        let cells: Vec<&str> = lines[1].split_whitespace().collect();
        assert_eq!(cells[0], "4");
        assert_eq!(cells[1], "●");
        assert_eq!(cells[5], "●");
        assert_eq!(cells[8], "○");
        assert_eq!(cells[2], "·");
    }

    #[test]
    fn keyboard_grows_to_fit_notes() {
        let kb = keyboard(&list("A2"), &NoteList::new(), &[4], false);
        assert_eq!(kb.lines().count(), 4);
    }

    #[test]
    fn rows_show_coverage() {
        let rows = vec![PatternRow {
            name: "major 7th",
            score: Some(0.75),
            pressed: false,
            highlighted: true,
        }];
        let text = pattern_rows(PatternKind::Chord, &rows, false);
        assert!(text.contains("chords (1)"));
        assert!(text.contains("○ major 7th"));
        assert!(text.contains("75%"));
    }
}
