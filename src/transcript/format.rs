//! Transcript data structures written after a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::intercept::DecisionKind;
use crate::shell::ExitStatus;

/// One resolved call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranscriptEntry {
    /// Sequence number (assigned automatically by the recorder).
    pub seq: u64,
    /// The intercepted arguments; `args[0]` is the command name.
    pub args: Vec<String>,
    /// How the call was resolved.
    pub decision: DecisionKind,
    /// Status handed back to the script.
    pub exit_code: ExitStatus,
}

/// How the outer script ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum Outcome {
    /// The script finished with status zero.
    Completed,
    /// The script finished with a non-zero status.
    Failed {
        /// Final status.
        exit_code: ExitStatus,
    },
}

impl Outcome {
    /// The outcome matching a final status.
    #[must_use]
    pub fn from_status(status: ExitStatus) -> Self {
        if status.success() {
            Self::Completed
        } else {
            Self::Failed { exit_code: status }
        }
    }
}

/// Everything recorded about one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transcript {
    /// Script name.
    pub name: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished; absent while the run is still blocked or was interrupted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Resolved calls, in order.
    pub entries: Vec<TranscriptEntry>,
    /// Final outcome, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfinished_transcripts_omit_the_outcome() {
        let transcript = Transcript {
            name: "deploy.sh".into(),
            started_at: Utc::now(),
            finished_at: None,
            entries: vec![TranscriptEntry {
                seq: 0,
                args: vec!["git".into(), "push".into()],
                decision: DecisionKind::ForcedExit,
                exit_code: ExitStatus::new(3),
            }],
            outcome: None,
        };
        let yaml = serde_yaml::to_string(&transcript).unwrap();
        assert!(!yaml.contains("finished_at"));
        assert!(!yaml.contains("outcome"));
        assert!(yaml.contains("decision: forced-exit"));
        assert!(yaml.contains("exit_code: 3"));
    }

    #[test]
    fn failed_outcome_carries_the_code() {
        let yaml = serde_yaml::to_string(&Outcome::from_status(ExitStatus::new(2))).unwrap();
        assert_eq!(yaml, "result: failed\nexit_code: 2\n");
        assert_eq!(Outcome::from_status(ExitStatus::SUCCESS), Outcome::Completed);
    }
}
