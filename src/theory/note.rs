use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::error::TheoryError;
use super::interval::Interval;

/// Lowest and highest octave accepted when parsing (MIDI 0..=131).
pub const MIN_OCTAVE: i32 = -1;
pub const MAX_OCTAVE: i32 = 9;

const MAX_ACCIDENTALS: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

pub const LETTERS: [Letter; 7] = [
    Letter::C,
    Letter::D,
    Letter::E,
    Letter::F,
    Letter::G,
    Letter::A,
    Letter::B,
];

impl Letter {
    /// Position in the C-based diatonic sequence (C = 0, B = 6).
    pub fn index(self) -> i32 {
        self as i32
    }

    pub fn from_index(index: i32) -> Letter {
        LETTERS[index.rem_euclid(7) as usize]
    }

    /// Semitones above C of the natural (unaltered) letter.
    pub fn natural_semitone(self) -> i32 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }

    pub fn from_char(c: char) -> Option<Letter> {
        match c.to_ascii_uppercase() {
            'C' => Some(Letter::C),
            'D' => Some(Letter::D),
            'E' => Some(Letter::E),
            'F' => Some(Letter::F),
            'G' => Some(Letter::G),
            'A' => Some(Letter::A),
            'B' => Some(Letter::B),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Letter::C => 'C',
            Letter::D => 'D',
            Letter::E => 'E',
            Letter::F => 'F',
            Letter::G => 'G',
            Letter::A => 'A',
            Letter::B => 'B',
        }
    }
}

/// Which accidental to use when a pitch has to be spelled from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spelling {
    Sharps,
    Flats,
}

const SHARP_NAMES: [(Letter, i8); 12] = [
    (Letter::C, 0),
    (Letter::C, 1),
    (Letter::D, 0),
    (Letter::D, 1),
    (Letter::E, 0),
    (Letter::F, 0),
    (Letter::F, 1),
    (Letter::G, 0),
    (Letter::G, 1),
    (Letter::A, 0),
    (Letter::A, 1),
    (Letter::B, 0),
];

const FLAT_NAMES: [(Letter, i8); 12] = [
    (Letter::C, 0),
    (Letter::D, -1),
    (Letter::D, 0),
    (Letter::E, -1),
    (Letter::E, 0),
    (Letter::F, 0),
    (Letter::G, -1),
    (Letter::G, 0),
    (Letter::A, -1),
    (Letter::A, 0),
    (Letter::B, -1),
    (Letter::B, 0),
];

impl Spelling {
    /// Flats for a note spelled with flats, sharps otherwise.
    pub fn of(note: &Note) -> Spelling {
        if note.accidentals < 0 {
            Spelling::Flats
        } else {
            Spelling::Sharps
        }
    }

    fn name(self, pitch_class: i32) -> (Letter, i8) {
        let idx = pitch_class.rem_euclid(12) as usize;
        match self {
            Spelling::Sharps => SHARP_NAMES[idx],
            Spelling::Flats => FLAT_NAMES[idx],
        }
    }
}

/// A pitch (with octave) or pitch class (without), in scientific pitch
/// notation. C4 is MIDI note 60.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    letter: Letter,
    accidentals: i8,
    octave: Option<i32>,
}

impl Note {
    pub fn new(letter: Letter, accidentals: i8, octave: Option<i32>) -> Self {
        Self {
            letter,
            accidentals,
            octave,
        }
    }

    pub fn pitched(letter: Letter, accidentals: i8, octave: i32) -> Self {
        Self::new(letter, accidentals, Some(octave))
    }

    /// Spell a MIDI pitch number.
    pub fn from_pitch(pitch: i32, spelling: Spelling) -> Self {
        let (letter, accidentals) = spelling.name(pitch);
        // Spelling tables never cross the octave boundary (no B# or Cb).
        Self::pitched(letter, accidentals, pitch.div_euclid(12) - 1)
    }

    pub fn from_pitch_class(pitch_class: i32, spelling: Spelling) -> Self {
        let (letter, accidentals) = spelling.name(pitch_class);
        Self::new(letter, accidentals, None)
    }

    pub fn letter(&self) -> Letter {
        self.letter
    }

    /// Signed accidental count: positive for sharps, negative for flats.
    pub fn accidentals(&self) -> i8 {
        self.accidentals
    }

    pub fn octave(&self) -> Option<i32> {
        self.octave
    }

    pub fn with_octave(&self, octave: i32) -> Note {
        Note::pitched(self.letter, self.accidentals, octave)
    }

    pub fn without_octave(&self) -> Note {
        Note::new(self.letter, self.accidentals, None)
    }

    pub fn pitch_class(&self) -> i32 {
        (self.letter.natural_semitone() + self.accidentals as i32).rem_euclid(12)
    }

    /// MIDI pitch number, when the note has an octave.
    pub fn pitch(&self) -> Option<i32> {
        self.octave
            .map(|o| (o + 1) * 12 + self.letter.natural_semitone() + self.accidentals as i32)
    }

    /// Ordering value: the pitch when known, the pitch class otherwise.
    pub fn value(&self) -> i32 {
        self.pitch().unwrap_or_else(|| self.pitch_class())
    }

    /// Same sounding key. Pitch classes are compared when either note lacks
    /// an octave.
    pub fn is_enharmonic(&self, other: &Note) -> bool {
        match (self.pitch(), other.pitch()) {
            (Some(a), Some(b)) => a == b,
            _ => self.pitch_class() == other.pitch_class(),
        }
    }

    /// Semitones from `root` up to this note. Without octaves the result is
    /// the ascending distance in 0..12.
    pub fn semitones_from(&self, root: &Note) -> i32 {
        match (self.pitch(), root.pitch()) {
            (Some(a), Some(b)) => a - b,
            _ => (self.pitch_class() - root.pitch_class()).rem_euclid(12),
        }
    }

    /// Shift by a semitone count, keeping the sharp/flat direction of this
    /// note's spelling.
    pub fn transpose_semitones(&self, semitones: i32) -> Note {
        self.offset(semitones, Spelling::of(self))
    }

    pub(crate) fn offset(&self, semitones: i32, spelling: Spelling) -> Note {
        match self.pitch() {
            Some(p) => Note::from_pitch(p + semitones, spelling),
            None => Note::from_pitch_class(self.pitch_class() + semitones, spelling),
        }
    }

    /// Shift by a named interval. The letter moves by the interval number so
    /// the spelling follows the interval (C4 up a minor second is Db4).
    pub fn transpose(&self, interval: &Interval) -> Note {
        let total = self.letter.index() + interval.letter_steps();
        let letter = Letter::from_index(total);
        match self.octave {
            Some(octave) => {
                let octave = octave + total.div_euclid(7);
                let target = self.value() + interval.semitones();
                let natural = (octave + 1) * 12 + letter.natural_semitone();
                match bounded_accidentals(target - natural) {
                    Some(acc) => Note::pitched(letter, acc, octave),
                    None => Note::from_pitch(target, spelling_toward(target - natural)),
                }
            }
            None => {
                let target = self.pitch_class() + interval.semitones();
                // nearest spelling of the target pitch class on the new letter
                let accidentals = (target - letter.natural_semitone() + 6).rem_euclid(12) - 6;
                match bounded_accidentals(accidentals) {
                    Some(acc) => Note::new(letter, acc, None),
                    None => Note::from_pitch_class(target, spelling_toward(accidentals)),
                }
            }
        }
    }

    /// The named interval from this note to `other`. `None` when the two
    /// spellings are further apart than augmented or diminished allows.
    pub fn interval_to(&self, other: &Note) -> Option<Interval> {
        let semitones = other.semitones_from(self);
        let steps = match (self.octave, other.octave) {
            (Some(a), Some(b)) => {
                (b * 7 + other.letter.index()) - (a * 7 + self.letter.index())
            }
            _ => (other.letter.index() - self.letter.index()).rem_euclid(7),
        };
        if steps < 0 || (steps == 0 && semitones < 0) {
            Interval::from_steps(-steps, -semitones).map(|i| i.reversed())
        } else {
            Interval::from_steps(steps, semitones)
        }
    }

    /// Re-spell with at most one accidental, preferring a natural letter and
    /// keeping the accidental's direction. Pitch never changes.
    pub fn simplify(&self) -> Note {
        let plain = match (self.letter, self.accidentals) {
            (_, 0) => true,
            (Letter::E | Letter::B, 1) => false,
            (Letter::C | Letter::F, -1) => false,
            (_, acc) => acc.abs() == 1,
        };
        if plain {
            *self
        } else {
            self.offset(0, Spelling::of(self))
        }
    }
}

/// Accidentals that still print as a parseable note.
fn bounded_accidentals(accidentals: i32) -> Option<i8> {
    i8::try_from(accidentals)
        .ok()
        .filter(|a| (*a as i32).abs() <= MAX_ACCIDENTALS)
}

fn spelling_toward(accidentals: i32) -> Spelling {
    if accidentals < 0 {
        Spelling::Flats
    } else {
        Spelling::Sharps
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter.as_char())?;
        let symbol = if self.accidentals > 0 { "#" } else { "b" };
        for _ in 0..self.accidentals.unsigned_abs() {
            f.write_str(symbol)?;
        }
        if let Some(octave) = self.octave {
            write!(f, "{}", octave)?;
        }
        Ok(())
    }
}

impl FromStr for Note {
    type Err = TheoryError;

    /// Parses `<letter><accidentals>[octave]`, e.g. `C`, `F#3`, `Bb4`,
    /// `Ebb5`, `Cx2`, `G♯4`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let mut chars = text.chars().peekable();
        let first = chars
            .next()
            .ok_or_else(|| TheoryError::parse(s, "empty note"))?;
        let letter = Letter::from_char(first)
            .ok_or_else(|| TheoryError::parse(s, format!("unknown letter '{}'", first)))?;

        let mut accidentals = 0i32;
        while let Some(&c) = chars.peek() {
            let step = match c {
                '#' | '♯' => 1,
                'b' | '♭' => -1,
                'x' | '𝄪' => 2,
                '𝄫' => -2,
                _ => break,
            };
            accidentals += step;
            chars.next();
        }
        if accidentals.abs() > MAX_ACCIDENTALS {
            return Err(TheoryError::parse(s, "too many accidentals"));
        }

        let rest: String = chars.collect();
        let octave = if rest.is_empty() {
            None
        } else {
            let octave: i32 = rest
                .parse()
                .map_err(|_| TheoryError::parse(s, format!("invalid octave '{}'", rest)))?;
            if !(MIN_OCTAVE..=MAX_OCTAVE).contains(&octave) {
                return Err(TheoryError::parse(
                    s,
                    format!("octave must be in {}..{}", MIN_OCTAVE, MAX_OCTAVE),
                ));
            }
            Some(octave)
        };

        Ok(Note::new(letter, accidentals as i8, octave))
    }
}

impl Serialize for Note {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Note {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(s: &str) -> Note {
        s.parse().expect("note")
    }

    #[test]
    fn parses_letters_accidentals_and_octaves() {
        assert_eq!(n("C4"), Note::pitched(Letter::C, 0, 4));
        assert_eq!(n("F#3"), Note::pitched(Letter::F, 1, 3));
        assert_eq!(n("bb2"), Note::pitched(Letter::B, -1, 2));
        assert_eq!(n("Ebb"), Note::new(Letter::E, -2, None));
        assert_eq!(n("Cx5"), Note::pitched(Letter::C, 2, 5));
        assert_eq!(n("G♯4"), Note::pitched(Letter::G, 1, 4));
        assert_eq!(n("A-1").octave(), Some(-1));
    }

    #[test]
    fn rejects_malformed_notes() {
        for bad in ["", "H4", "C###x4", "C4.5", "Cq", "C12"] {
            match bad.parse::<Note>() {
                Err(TheoryError::ParseError { input, .. }) => assert_eq!(input, bad),
                other => panic!("expected parse error for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn pitch_follows_scientific_notation() {
        assert_eq!(n("C4").pitch(), Some(60));
        assert_eq!(n("A4").pitch(), Some(69));
        assert_eq!(n("B#3").pitch(), Some(60));
        assert_eq!(n("Cb4").pitch(), Some(59));
        assert_eq!(n("Db").pitch(), None);
        assert_eq!(n("Db").pitch_class(), 1);
    }

    #[test]
    fn enharmonic_equality_ignores_spelling() {
        assert!(n("C#4").is_enharmonic(&n("Db4")));
        assert!(n("B#3").is_enharmonic(&n("C4")));
        assert!(!n("C4").is_enharmonic(&n("C5")));
        assert!(n("C").is_enharmonic(&n("C5")));
    }

    #[test]
    fn display_round_trips() {
        for s in ["C4", "F#3", "Bb2", "Ebb", "C##5", "A-1"] {
            assert_eq!(n(s).to_string(), s);
        }
        assert_eq!(n("Cx5").to_string(), "C##5");
    }

    #[test]
    fn transpose_by_interval_keeps_spelling() {
        let m2: Interval = "m2".parse().unwrap();
        let down: Interval = "-m2".parse().unwrap();
        assert_eq!(n("C4").transpose(&m2), n("Db4"));
        assert_eq!(n("B3").transpose(&m2), n("C4"));
        assert_eq!(n("C4").transpose(&down), n("B3"));
        assert_eq!(n("Cb4").transpose(&"M3".parse().unwrap()), n("Eb4"));
        assert_eq!(n("G").transpose(&"P5".parse().unwrap()), n("D"));
        assert_eq!(n("E4").transpose(&"M9".parse().unwrap()), n("F#5"));
    }

    #[test]
    fn repeated_augmented_steps_stay_pitch_exact() {
        let a1: Interval = "A1".parse().unwrap();
        let d2: Interval = "-A1".parse().unwrap();
        let mut up = n("C4");
        let mut down = n("C4");
        for _ in 0..5 {
            up = up.transpose(&a1);
            down = down.transpose(&d2);
        }
        assert_eq!(up.pitch(), Some(65));
        assert_eq!(up.to_string().parse::<Note>().unwrap(), up);
        assert_eq!(down.pitch(), Some(55));
        assert_eq!(down.to_string().parse::<Note>().unwrap(), down);

        let mut far = n("C4");
        for _ in 0..128 {
            far = far.transpose(&a1);
        }
        assert_eq!(far.pitch(), Some(188));
        assert!(far.accidentals().abs() <= 4);

        let mut class = n("C");
        for _ in 0..7 {
            class = class.transpose(&a1);
        }
        assert_eq!(class.pitch_class(), 7);
        assert!(class.to_string().parse::<Note>().is_ok());
    }

    #[test]
    fn transpose_semitones_respects_direction() {
        assert_eq!(n("C#4").transpose_semitones(2), n("D#4"));
        assert_eq!(n("Db4").transpose_semitones(2), n("Eb4"));
        assert_eq!(n("B4").transpose_semitones(1), n("C5"));
        assert_eq!(n("A").transpose_semitones(5), n("D"));
    }

    #[test]
    fn interval_between_notes() {
        assert_eq!(n("C4").interval_to(&n("E4")).unwrap().to_string(), "M3");
        assert_eq!(n("C4").interval_to(&n("Eb4")).unwrap().to_string(), "m3");
        assert_eq!(n("E4").interval_to(&n("C4")).unwrap().to_string(), "-M3");
        assert_eq!(n("C4").interval_to(&n("D5")).unwrap().to_string(), "M9");
        assert_eq!(n("F").interval_to(&n("B")).unwrap().to_string(), "A4");
        assert!(n("C4").interval_to(&n("E###4")).is_none());
    }

    #[test]
    fn simplify_is_idempotent_and_pitch_preserving() {
        let cases = [
            ("E#4", "F4"),
            ("B#3", "C4"),
            ("Cb4", "B3"),
            ("Fb", "E"),
            ("Ebb4", "D4"),
            ("C##4", "D4"),
            ("Gbb", "F"),
            ("F#4", "F#4"),
            ("Bb4", "Bb4"),
        ];
        for (raw, expected) in cases {
            let simple = n(raw).simplify();
            assert_eq!(simple, n(expected), "simplify {}", raw);
            assert_eq!(simple.simplify(), simple);
            assert!(simple.is_enharmonic(&n(raw)));
        }
    }

    #[test]
    fn serializes_as_text() {
        let yaml = serde_yaml::to_string(&n("Bb3")).unwrap();
        assert_eq!(yaml.trim(), "Bb3");
        let back: Note = serde_yaml::from_str("F#2").unwrap();
        assert_eq!(back, n("F#2"));
        assert!(serde_yaml::from_str::<Note>("Q2").is_err());
    }
}
