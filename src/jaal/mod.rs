//! JAAL recordings: envelope decoding and section access.
//!
//! Kept apart from explaining and rendering. It owns:
//! - the recorder envelope and its decode chain
//! - HTML entity unescaping used by that chain
//! - the loaded document and its section accessors

pub mod envelope;
pub mod recording;
pub mod unescape;

pub use envelope::{DecodeTrace, Envelope};
pub use recording::{Recording, load_recording};
