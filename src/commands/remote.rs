//! Run a script whose decisions come from a browser client.

use std::sync::Arc;

use tokio::net::TcpListener;

use super::script_config;
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::decision::remote;
use crate::intercept::{ResumeExecutor, ScriptTask};
use crate::shell::{ExitStatus, Program, StdStreams};
use crate::transcript::SharedTranscript;

/// Run `program` behind the remote server until the session ends or Ctrl-C.
///
/// The script's own output is discarded; only its status is reported.
///
/// # Errors
///
/// Returns an error string if the runtime or listener cannot start, the
/// engine cannot start, or the server fails.
pub fn run(
    program: Program,
    settings: &Settings,
    ctx: &ServiceContext,
    transcript: Option<SharedTranscript>,
) -> Result<ExitStatus, String> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?;

    runtime.block_on(async {
        let listener = TcpListener::bind(&settings.listen)
            .await
            .map_err(|e| format!("Failed to listen on {}: {e}", settings.listen))?;
        let session = ScriptTask::spawn(program, script_config(StdStreams::discard())?, transcript)
            .map_err(|e| e.to_string())?;
        let resume = ResumeExecutor::new(Arc::clone(&ctx.exec), settings.nested);

        let outcome = remote::serve(listener, session, resume, settings.remote_policy, &settings.webapp_dir, ctrl_c())
            .await
            .map_err(|e| format!("Server failed: {e}"))?;
        Ok(outcome.unwrap_or(ExitStatus::FAILURE))
    })
}

async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
