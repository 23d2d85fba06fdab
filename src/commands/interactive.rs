//! Run a script, prompting on the terminal for every external command.

use std::io;
use std::sync::Arc;

use super::script_config;
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::decision::InteractiveSource;
use crate::intercept::{MockAuthor, ResumeExecutor, ScriptTask};
use crate::shell::{ExitStatus, Program, StdStreams};
use crate::transcript::SharedTranscript;

/// Run `program`, reading decisions from stdin and prompting on stderr.
///
/// # Errors
///
/// Returns an error string if the engine cannot start or the terminal fails.
pub fn run(
    program: Program,
    settings: &Settings,
    ctx: &ServiceContext,
    transcript: Option<SharedTranscript>,
) -> Result<ExitStatus, String> {
    let config = script_config(StdStreams::inherit())?;
    let mut session = ScriptTask::spawn(program, config, transcript).map_err(|e| e.to_string())?;

    let resume = ResumeExecutor::new(Arc::clone(&ctx.exec), settings.nested);
    let author = MockAuthor::new(Arc::clone(&ctx.editor));
    let mut source = InteractiveSource::new(io::stdin().lock(), io::stderr(), resume, author, settings.forced_exit_code);
    source.run(&mut session.calls).map_err(|e| format!("Failed to prompt for a decision: {e}"))?;

    let outcome = session
        .outcome
        .blocking_recv()
        .ok_or_else(|| "Script engine stopped without reporting an outcome".to_string())?;
    Ok(outcome.exit_status())
}
