pub mod config;
pub mod model_slot;
pub mod transcriber;

pub use transcriber::{Transcriber, WhisperTranscriber};
