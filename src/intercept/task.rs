//! Runs a program on its own thread behind an [`Interceptor`].

use std::sync::Arc;
use std::thread;

use tokio::sync::mpsc;

use super::coordinator::{CallStream, Interceptor};
use crate::shell::{EngineError, ExitStatus, Program, Runner, RunnerConfig, ScriptError};
use crate::transcript::SharedTranscript;

/// Stream carrying the single terminal outcome of a script.
pub type OutcomeStream = mpsc::Receiver<ScriptOutcome>;

/// How the outer script ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOutcome {
    /// Finished with status zero.
    Completed,
    /// Finished with an error.
    Failed(ScriptError),
}

impl ScriptOutcome {
    /// The status the host process should exit with.
    #[must_use]
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            Self::Completed => ExitStatus::SUCCESS,
            Self::Failed(err) => err.exit_status(),
        }
    }
}

impl From<Result<(), ScriptError>> for ScriptOutcome {
    fn from(result: Result<(), ScriptError>) -> Self {
        match result {
            Ok(()) => Self::Completed,
            Err(err) => Self::Failed(err),
        }
    }
}

/// The two streams a decision source consumes for one script run.
///
/// Both close once the script has finished: `calls` after the last call,
/// `outcome` after delivering exactly one [`ScriptOutcome`].
#[derive(Debug)]
pub struct SessionStreams {
    /// Calls awaiting a decision, in issue order.
    pub calls: CallStream,
    /// The script's terminal outcome.
    pub outcome: OutcomeStream,
}

/// Spawns script runs.
pub struct ScriptTask;

impl ScriptTask {
    /// Starts `program` on a dedicated thread.
    ///
    /// The runner is built before the thread starts, so construction failures
    /// surface here rather than as a script outcome.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the runner cannot be built or the thread
    /// cannot be spawned.
    pub fn spawn(
        program: Program,
        config: RunnerConfig,
        transcript: Option<SharedTranscript>,
    ) -> Result<SessionStreams, EngineError> {
        let (interceptor, calls) = Interceptor::channel(transcript);
        let mut runner = Runner::new(config, Arc::new(interceptor))?;
        let (outcome_tx, outcome) = mpsc::channel(1);
        thread::Builder::new().name("script-engine".to_string()).spawn(move || {
            let result = runner.run(&program);
            let outcome = ScriptOutcome::from(result);
            tracing::info!(script = %program.name, status = outcome.exit_status().code(), "script finished");
            let _ = outcome_tx.blocking_send(outcome);
            drop(outcome_tx);
            drop(runner);
        })?;
        Ok(SessionStreams { calls, outcome })
    }
}
