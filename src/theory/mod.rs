//! Notes, intervals, and matching note selections against named scales and
//! chords.

pub mod catalog;
pub mod error;
pub mod interval;
pub mod matching;
pub mod note;
pub mod note_list;

pub use catalog::{catalog, PatternDef, PatternKind, CHORDS, SCALES};
pub use error::TheoryError;
pub use interval::{Interval, Quality};
pub use matching::{ExactMatches, Matches, PatternScore};
pub use note::{Letter, Note, Spelling};
pub use note_list::NoteList;
