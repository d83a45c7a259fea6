use piano_finder::theory::{Interval, Note, NoteList, PatternKind};

fn list(s: &str) -> NoteList {
    s.parse().expect("note list")
}

fn note(s: &str) -> Note {
    s.parse().expect("note")
}

const SAMPLES: &[&str] = &["C4 E4 G4", "Bb2 D3 F3 Ab3", "F#5", "C E G", "Db4 Gb4 B4 E5"];

#[test]
fn sorting_is_idempotent() {
    for s in SAMPLES {
        let l = list(s);
        assert_eq!(l.sort().sort(), l.sort());
    }
}

#[test]
fn add_then_remove_restores() {
    for s in SAMPLES {
        let l = list(s);
        let extra = note("A#1");
        assert!(!l.contains(&extra, true));
        assert!(l.add(extra).remove(&extra, true).is_enharmonic(&l));
    }
}

#[test]
fn toggle_twice_restores() {
    for s in SAMPLES {
        let l = list(s);
        let key = note("A#1");
        assert_eq!(l.toggle(key, true).toggle(key, true), l);
        if let Some(first) = l.root().copied() {
            assert_eq!(l.toggle(first, true).toggle(first, true), l);
        }
    }
}

#[test]
fn transpose_there_and_back() {
    for interval in ["m2", "M3", "P5", "-P4", "M9"] {
        let i: Interval = interval.parse().unwrap();
        for s in SAMPLES {
            let l = list(s);
            assert_eq!(l.transpose(&i).transpose(&i.reversed()), l, "{} by {}", s, interval);
        }
    }
}

#[test]
fn major_scale_is_major_not_minor() {
    let major = NoteList::from_pattern(PatternKind::Scale, &note("C4"), "major").unwrap();
    let exact = major.exact();
    assert!(exact.contains(PatternKind::Scale, "major"));
    assert!(!exact.contains(PatternKind::Scale, "minor"));
}

#[test]
fn every_catalog_pattern_matches_itself() {
    for kind in PatternKind::ALL {
        for p in kind.catalog() {
            let l = NoteList::from_pattern(kind, &note("Eb3"), p.name).unwrap();
            assert_eq!(l.supersets().score(kind, p.name), Some(1.0), "{} {}", kind, p.name);
            assert!(l.exact().contains(kind, p.name));
        }
    }
}

#[test]
fn triad_scores() {
    let m = list("C4 E4 G4").supersets();
    assert_eq!(m.score(PatternKind::Chord, "major"), Some(1.0));
    assert_eq!(m.score(PatternKind::Chord, "major 7th"), Some(0.75));
}

#[test]
fn empty_list_has_no_full_match() {
    let m = NoteList::new().supersets();
    assert!(PatternKind::ALL
        .iter()
        .all(|k| m.of_kind(*k).iter().all(|p| p.score < 1.0)));
}

#[test]
fn dorian_spelling() {
    let dorian = NoteList::from_scale(&note("C4"), "dorian").unwrap();
    assert_eq!(dorian.to_string(), "C4 D4 D#4 F4 G4 A4 A#4");
}

#[test]
fn simplify_is_idempotent() {
    let l = list("Cb4 E#4 Fbb4 G##4");
    let once = l.simplify();
    assert_eq!(once.simplify(), once);
    assert!(once.is_enharmonic(&l));
    assert!(once.iter().all(|n| n.accidentals().abs() <= 1));
}
