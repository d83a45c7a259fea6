//! # Error Types
//!
//! Errors raised by the music theory layer. None of them are fatal: callers
//! are expected to drop the gesture that produced them and keep their state.
//!
//! ## Usage
//! ```rust
//! use piano_finder::theory::{Note, TheoryError};
//!
//! match "H4".parse::<Note>() {
//!     Ok(note) => println!("pressed {}", note),
//!     Err(TheoryError::ParseError { input, message }) => {
//!         eprintln!("ignoring '{}': {}", input, message);
//!     }
//!     Err(e) => eprintln!("error: {}", e),
//! }
//! ```

use thiserror::Error;

use super::catalog::PatternKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TheoryError {
    /// A note or interval string could not be parsed.
    ///
    /// # Example
    /// ```
    /// # use piano_finder::theory::TheoryError;
    /// let err = TheoryError::ParseError {
    ///     input: "H4".to_string(),
    ///     message: "unknown letter 'H'".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "cannot parse 'H4': unknown letter 'H'");
    /// ```
    #[error("cannot parse '{input}': {message}")]
    ParseError { input: String, message: String },

    /// A pattern name that is not in the scale or chord catalog.
    ///
    /// # Example
    /// ```
    /// # use piano_finder::theory::{PatternKind, TheoryError};
    /// let err = TheoryError::UnknownPattern {
    ///     kind: PatternKind::Chord,
    ///     name: "mystery".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "unknown chord 'mystery'");
    /// ```
    #[error("unknown {kind} '{name}'")]
    UnknownPattern { kind: PatternKind, name: String },
}

impl TheoryError {
    pub(crate) fn parse(input: &str, message: impl Into<String>) -> Self {
        TheoryError::ParseError {
            input: input.to_string(),
            message: message.into(),
        }
    }
}
