//! Command dispatch and handlers.

pub mod interactive;
pub mod remote;

use std::path::Path;

use crate::cli::Cli;
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::shell::{parse, Environment, ExitStatus, Program, RunnerConfig, StdStreams};
use crate::transcript::{SharedTranscript, TranscriptRecorder};

/// Resolve settings and run the script named on the command line.
///
/// # Errors
///
/// Returns an error string for fatal startup failures: unreadable config or
/// script, a script that does not parse, or an engine that cannot start.
pub fn dispatch(cli: &Cli) -> Result<ExitStatus, String> {
    let settings = Settings::load(cli)?;
    let ctx = ServiceContext::live(&settings);
    dispatch_with_context(&cli.script, &settings, &ctx)
}

/// Run `script` with the given settings and service context.
///
/// # Errors
///
/// Returns an error string for fatal startup failures.
pub fn dispatch_with_context(script: &Path, settings: &Settings, ctx: &ServiceContext) -> Result<ExitStatus, String> {
    let program = load_script(script)?;
    let transcript = open_transcript(settings, &program)?;

    let status = if settings.remote {
        remote::run(program, settings, ctx, transcript.clone())?
    } else {
        interactive::run(program, settings, ctx, transcript.clone())?
    };

    if let Some(transcript) = transcript {
        finish_transcript(&transcript, status);
    }
    Ok(status)
}

/// Read and parse a script; `$0` is its file name.
///
/// # Errors
///
/// Returns an error string if the file cannot be read or does not parse.
pub fn load_script(path: &Path) -> Result<Program, String> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read script {}: {e}", path.display()))?;
    let name = path.file_name().map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
    parse(&source, &name).map_err(|e| e.to_string())
}

/// Engine configuration for the outer script: the current directory and
/// the host environment.
///
/// # Errors
///
/// Returns an error string if the working directory cannot be determined.
pub fn script_config(streams: StdStreams) -> Result<RunnerConfig, String> {
    let dir = std::env::current_dir().map_err(|e| format!("Failed to read working directory: {e}"))?;
    let env: Environment = std::env::vars().collect();
    Ok(RunnerConfig::new(dir).with_env(env).with_streams(streams))
}

fn open_transcript(settings: &Settings, program: &Program) -> Result<Option<SharedTranscript>, String> {
    let Some(path) = &settings.transcript else {
        return Ok(None);
    };
    let recorder = TranscriptRecorder::create(path, program.name.clone())
        .map_err(|e| format!("Failed to write transcript {}: {e}", path.display()))?;
    Ok(Some(recorder.shared()))
}

/// Record the final status and print where the transcript went.
fn finish_transcript(transcript: &SharedTranscript, status: ExitStatus) {
    let mut recorder = transcript.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    match recorder.finish(status) {
        Ok(path) => eprintln!("Transcript saved to: {}", path.display()),
        Err(e) => tracing::warn!(error = %e, "failed to finish transcript"),
    }
}
