use std::fmt;
use std::str::FromStr;

use super::error::TheoryError;

/// Semitones of the major/perfect simple intervals, indexed by number - 1.
const SIMPLE_SEMITONES: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quality {
    Perfect,
    Major,
    Minor,
    Augmented,
    Diminished,
}

impl Quality {
    fn symbol(self) -> char {
        match self {
            Quality::Perfect => 'P',
            Quality::Major => 'M',
            Quality::Minor => 'm',
            Quality::Augmented => 'A',
            Quality::Diminished => 'd',
        }
    }
}

/// A named interval such as `m2`, `P5` or `-M3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    quality: Quality,
    number: u8,
    descending: bool,
}

fn is_perfect_type(number: u8) -> bool {
    matches!((number - 1) % 7, 0 | 3 | 4)
}

impl Interval {
    pub const MINOR_SECOND: Interval = Interval {
        quality: Quality::Minor,
        number: 2,
        descending: false,
    };

    pub fn new(quality: Quality, number: u8) -> Result<Self, TheoryError> {
        let valid = number >= 1
            && match quality {
                Quality::Perfect => is_perfect_type(number),
                Quality::Major | Quality::Minor => !is_perfect_type(number),
                Quality::Augmented => true,
                Quality::Diminished => number > 1,
            };
        if !valid {
            return Err(TheoryError::parse(
                &format!("{}{}", quality.symbol(), number),
                "no such interval",
            ));
        }
        Ok(Self {
            quality,
            number,
            descending: false,
        })
    }

    /// Same interval in the opposite direction.
    pub fn reversed(self) -> Self {
        Self {
            descending: !self.descending,
            ..self
        }
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }

    /// Signed semitone distance.
    pub fn semitones(&self) -> i32 {
        let simple = ((self.number - 1) % 7) as usize;
        let octaves = ((self.number - 1) / 7) as i32;
        let base = SIMPLE_SEMITONES[simple] + 12 * octaves;
        let adjust = match (is_perfect_type(self.number), self.quality) {
            (_, Quality::Augmented) => 1,
            (true, Quality::Diminished) => -1,
            (false, Quality::Diminished) => -2,
            (false, Quality::Minor) => -1,
            _ => 0,
        };
        let up = base + adjust;
        if self.descending {
            -up
        } else {
            up
        }
    }

    /// Signed number of letter names the interval spans.
    pub fn letter_steps(&self) -> i32 {
        let steps = self.number as i32 - 1;
        if self.descending {
            -steps
        } else {
            steps
        }
    }

    /// Ascending interval spanning `steps` letters (0 = unison) and
    /// `semitones` semitones.
    pub(crate) fn from_steps(steps: i32, semitones: i32) -> Option<Interval> {
        let number = u8::try_from(steps + 1).ok().filter(|n| *n > 0)?;
        let simple = (steps % 7) as usize;
        let base = SIMPLE_SEMITONES[simple] + 12 * (steps / 7);
        let quality = match (is_perfect_type(number), semitones - base) {
            (true, 0) => Quality::Perfect,
            (_, 1) => Quality::Augmented,
            (true, -1) | (false, -2) => Quality::Diminished,
            (false, 0) => Quality::Major,
            (false, -1) => Quality::Minor,
            _ => return None,
        };
        Interval::new(quality, number).ok()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            f.write_str("-")?;
        }
        write!(f, "{}{}", self.quality.symbol(), self.number)
    }
}

impl FromStr for Interval {
    type Err = TheoryError;

    /// Parses `[-]<quality><number>` with quality one of `P M m A d`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let (descending, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let mut chars = body.chars();
        let quality = match chars.next() {
            Some('P') => Quality::Perfect,
            Some('M') => Quality::Major,
            Some('m') => Quality::Minor,
            Some('A') => Quality::Augmented,
            Some('d') => Quality::Diminished,
            Some(c) => return Err(TheoryError::parse(s, format!("unknown quality '{}'", c))),
            None => return Err(TheoryError::parse(s, "empty interval")),
        };
        let number: u8 = chars
            .as_str()
            .parse()
            .map_err(|_| TheoryError::parse(s, "expected an interval number"))?;
        let interval = Interval::new(quality, number)
            .map_err(|_| TheoryError::parse(s, "no such interval"))?;
        Ok(if descending { interval.reversed() } else { interval })
    }
}
