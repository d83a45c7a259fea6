//! Find the scales and chords that fit the keys you press.
//!
//! The [`theory`] module is usable on its own; the rest wires it to a
//! command-line piano with sampled playback.

pub mod audio;
pub mod console;
pub mod model;
pub mod repl;
pub mod session;
pub mod storage;
pub mod theory;
