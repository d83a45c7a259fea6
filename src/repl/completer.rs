//! Tab completion for the piano-finder REPL.

use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow;

use crate::theory::PatternKind;

/// REPL helper providing command and pattern-name completion.
pub struct PianoHelper;

impl PianoHelper {
    pub fn new() -> Self {
        Self
    }
}

/// Commands available in the REPL.
const COMMANDS: &[&str] = &[
    "press", "hover", "unhover", "root", "hover-root", "scale", "chord",
    "preview", "up", "down", "transpose", "simplify", "clear", "search",
    "show", "scales", "chords", "match", "catalog", "play", "arp",
    "harmony", "mute", "stop",
];

/// Meta commands (prefixed with :).
const META_COMMANDS: &[&str] = &[":help", ":q", ":quit", ":exit"];

fn pairs<'a>(candidates: impl Iterator<Item = &'a str>, prefix: &str) -> Vec<Pair> {
    candidates
        .filter(|c| c.starts_with(prefix))
        .map(|c| Pair {
            display: c.to_string(),
            replacement: c.to_string(),
        })
        .collect()
}

/// Drops leading whitespace, moving `offset` past it.
fn skip_spaces(s: &str, offset: usize) -> (&str, usize) {
    let trimmed = s.trim_start();
    (trimmed, offset + s.len() - trimmed.len())
}

/// Which catalog the cursor is naming a pattern from, and where the name
/// starts. Handles `scale <name>`, `chord <name>` and `preview scale <name>`.
fn pattern_completion_start(line: &str) -> Option<(PatternKind, usize)> {
    let (line, lead) = skip_spaces(line, 0);
    let (cmd, rest) = line.split_once(char::is_whitespace)?;
    let (rest, offset) = skip_spaces(rest, lead + cmd.len() + 1);
    let (kind, rest, offset) = match cmd {
        "scale" | "chord" => (cmd.parse().ok()?, rest, offset),
        "preview" => {
            let (kind, name) = rest.split_once(char::is_whitespace)?;
            let (name, offset) = skip_spaces(name, offset + kind.len() + 1);
            (kind.parse().ok()?, name, offset)
        }
        _ => return None,
    };
    // A leading root ("scale B3 mi") is skipped when it parses as a note.
    match rest.split_once(char::is_whitespace) {
        Some((root, after)) if root.parse::<crate::theory::Note>().is_ok() => {
            Some((kind, skip_spaces(after, offset + root.len() + 1).1))
        }
        _ => Some((kind, offset)),
    }
}

impl Completer for PianoHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line_to_pos = &line[..pos];

        if line_to_pos.starts_with(':') {
            return Ok((0, pairs(META_COMMANDS.iter().copied(), line_to_pos)));
        }

        if let Some((kind, start)) = pattern_completion_start(line_to_pos) {
            let prefix = &line_to_pos[start..];
            let names = kind.catalog().iter().map(|p| p.name);
            return Ok((start, pairs(names, prefix)));
        }

        let words: Vec<&str> = line_to_pos.split_whitespace().collect();
        if words.is_empty() || (words.len() == 1 && !line_to_pos.ends_with(' ')) {
            let prefix = words.first().copied().unwrap_or("");
            return Ok((0, pairs(COMMANDS.iter().copied(), prefix)));
        }

        Ok((pos, Vec::new()))
    }
}

impl Hinter for PianoHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<Self::Hint> {
        None
    }
}

impl Highlighter for PianoHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[90m{}\x1b[0m", hint))
    }
}

impl Validator for PianoHelper {}

impl Helper for PianoHelper {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_pattern_name_start() {
        assert_eq!(pattern_completion_start("scale mi"), Some((PatternKind::Scale, 6)));
        assert_eq!(pattern_completion_start("chord B3 ma"), Some((PatternKind::Chord, 9)));
        assert_eq!(
            pattern_completion_start("preview chord dom"),
            Some((PatternKind::Chord, 14))
        );
        assert_eq!(pattern_completion_start("press C4"), None);
        assert_eq!(pattern_completion_start("scale"), None);
    }

    #[test]
    fn pattern_start_skips_repeated_spaces() {
        assert_eq!(pattern_completion_start("scale  mi"), Some((PatternKind::Scale, 7)));
        assert_eq!(
            pattern_completion_start("chord  B3  ma"),
            Some((PatternKind::Chord, 11))
        );
        assert_eq!(
            pattern_completion_start("preview   chord  dom"),
            Some((PatternKind::Chord, 17))
        );
        assert_eq!(pattern_completion_start(" scale mi"), Some((PatternKind::Scale, 7)));
    }

    #[test]
    fn pattern_names_filter_by_prefix() {
        let names = PatternKind::Scale.catalog().iter().map(|p| p.name);
        let found: Vec<String> = pairs(names, "minor").into_iter().map(|p| p.replacement).collect();
        assert_eq!(found, vec!["minor", "minor pentatonic"]);
    }

    #[test]
    fn commands_complete_from_prefix() {
        let found: Vec<String> = pairs(COMMANDS.iter().copied(), "ch")
            .into_iter()
            .map(|p| p.replacement)
            .collect();
        assert_eq!(found, vec!["chord", "chords"]);
    }
}
