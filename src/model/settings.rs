use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::theory::{Letter, Note};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root used when a pattern is chosen with nothing pressed.
    pub default_root: Note,
    /// Octaves offered by the root selector.
    pub root_octaves: Vec<i32>,
    /// Maximum rows per pattern list; 0 lists everything.
    pub list_limit: usize,
    /// Narrow the pattern lists to what the pressed keys can still become.
    pub filter_patterns: bool,
    pub samples_dir: String,
    pub note_secs: f32,
    pub harmony_secs: f32,
    pub arpeggio_ms: u64,
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_root: Note::pitched(Letter::C, 0, 4),
            root_octaves: vec![3, 4, 5],
            list_limit: 12,
            filter_patterns: true,
            samples_dir: "samples/piano".into(),
            note_secs: 1.5,
            harmony_secs: 2.0,
            arpeggio_ms: 400,
            muted: false,
        }
    }
}

impl Settings {
    /// Out-of-range or non-finite lengths fall back to the defaults.
    pub fn note_duration(&self) -> Duration {
        Duration::try_from_secs_f32(self.note_secs).unwrap_or(Duration::from_millis(1500))
    }

    pub fn harmony_duration(&self) -> Duration {
        Duration::try_from_secs_f32(self.harmony_secs).unwrap_or(Duration::from_secs(2))
    }

    pub fn arpeggio_interval(&self) -> Duration {
        Duration::from_millis(self.arpeggio_ms)
    }

    /// Octave of the default root, used when a root is given without one.
    pub fn default_octave(&self) -> i32 {
        self.default_root.octave().unwrap_or(4)
    }
}
