//! Records resolved calls into a transcript file.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::format::{Outcome, Transcript, TranscriptEntry};
use crate::intercept::DecisionKind;
use crate::shell::ExitStatus;

/// A recorder shared between the engine thread and the session host.
pub type SharedTranscript = Arc<Mutex<TranscriptRecorder>>;

/// Records calls and rewrites the YAML transcript after every change, so an
/// interrupted run still leaves everything resolved so far on disk.
#[derive(Debug)]
pub struct TranscriptRecorder {
    path: PathBuf,
    transcript: Transcript,
    next_seq: u64,
}

impl TranscriptRecorder {
    /// Create a recorder and write the empty transcript to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn create(path: impl Into<PathBuf>, name: impl Into<String>) -> Result<Self, std::io::Error> {
        let recorder = Self {
            path: path.into(),
            transcript: Transcript {
                name: name.into(),
                started_at: Utc::now(),
                finished_at: None,
                entries: Vec::new(),
                outcome: None,
            },
            next_seq: 0,
        };
        recorder.write()?;
        Ok(recorder)
    }

    /// Wraps the recorder for sharing.
    #[must_use]
    pub fn shared(self) -> SharedTranscript {
        Arc::new(Mutex::new(self))
    }

    /// Record a resolved call. The `seq` field is assigned automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be rewritten.
    pub fn record(&mut self, args: &[String], decision: DecisionKind, exit_code: ExitStatus) -> Result<(), std::io::Error> {
        self.transcript.entries.push(TranscriptEntry { seq: self.next_seq, args: args.to_vec(), decision, exit_code });
        self.next_seq += 1;
        self.write()
    }

    /// Record the script's final status and the finish time.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be rewritten.
    pub fn finish(&mut self, status: ExitStatus) -> Result<&Path, std::io::Error> {
        self.transcript.finished_at = Some(Utc::now());
        self.transcript.outcome = Some(Outcome::from_status(status));
        self.write()?;
        Ok(&self.path)
    }

    /// The transcript as recorded so far.
    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    fn write(&self) -> Result<(), std::io::Error> {
        let yaml = serde_yaml::to_string(&self.transcript).map_err(std::io::Error::other)?;
        std::fs::write(&self.path, yaml)
    }
}
