//! YAML transcripts of intercepted calls and how each was resolved.

pub mod format;
pub mod recorder;

pub use format::{Outcome, Transcript, TranscriptEntry};
pub use recorder::{SharedTranscript, TranscriptRecorder};
