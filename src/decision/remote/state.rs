//! Shared session state behind the remote routes.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, watch};

use super::events::ServerEvent;
use crate::config::RemotePolicy;
use crate::intercept::{PendingCall, ResumeExecutor, SessionStreams};
use crate::shell::ExitStatus;

/// Why a client could not attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachError {
    /// Another client is already attached.
    Busy,
    /// The session has finished.
    Finished,
}

/// Why a posted code could not be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnError {
    /// No call is waiting.
    NothingPending,
}

#[derive(Default)]
struct Inner {
    pending: VecDeque<PendingCall>,
    client: Option<mpsc::UnboundedSender<ServerEvent>>,
    outcome: Option<ExitStatus>,
    finished: bool,
}

impl Inner {
    /// Sends to the attached client, detaching it if it has gone away.
    fn push(&mut self, event: ServerEvent) {
        if let Some(client) = &self.client {
            if client.send(event).is_err() {
                tracing::info!("client detached");
                self.client = None;
            }
        }
    }
}

/// State shared by the forwarding task and the HTTP handlers.
pub struct RemoteState {
    inner: Mutex<Inner>,
    resume: ResumeExecutor,
    policy: RemotePolicy,
    finished: watch::Sender<bool>,
}

impl RemoteState {
    /// Creates state that resolves calls with `resume` under `policy`.
    #[must_use]
    pub fn new(resume: ResumeExecutor, policy: RemotePolicy) -> Self {
        let (finished, _) = watch::channel(false);
        Self { inner: Mutex::default(), resume, policy, finished }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribes to the end of the session.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.finished.subscribe()
    }

    /// The script's final status, once it has finished.
    #[must_use]
    pub fn outcome(&self) -> Option<ExitStatus> {
        self.lock().outcome
    }

    /// Attaches a client, replaying every call still waiting for a code.
    ///
    /// # Errors
    ///
    /// Returns [`AttachError::Busy`] while another client is connected and
    /// [`AttachError::Finished`] once the session is over.
    pub fn attach(&self) -> Result<mpsc::UnboundedReceiver<ServerEvent>, AttachError> {
        let mut inner = self.lock();
        if inner.finished {
            return Err(AttachError::Finished);
        }
        if inner.client.as_ref().is_some_and(|client| !client.is_closed()) {
            return Err(AttachError::Busy);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        for pending in &inner.pending {
            let _ = tx.send(ServerEvent::Invocation { args: pending.call().args.clone() });
        }
        if let Some(exit_code) = inner.outcome {
            let _ = tx.send(ServerEvent::Result { exit_code });
        }
        inner.client = Some(tx);
        tracing::info!(replayed = inner.pending.len(), "client attached");
        Ok(rx)
    }

    /// Releases the oldest pending call with `code`, according to the policy.
    ///
    /// # Errors
    ///
    /// Returns [`ReturnError::NothingPending`] if no call is waiting.
    pub fn release(&self, code: ExitStatus) -> Result<(), ReturnError> {
        let pending = self.lock().pending.pop_front().ok_or(ReturnError::NothingPending)?;
        tracing::debug!(call = %pending.call().id, code = code.code(), "code received");
        let resumption = match self.policy {
            RemotePolicy::ForcedExit => ResumeExecutor::forced_exit(code),
            RemotePolicy::FallThrough => self.resume.fall_through_with_override(code),
        };
        pending.resolve(resumption);
        Ok(())
    }

    /// Moves calls and the outcome from the script into the session until
    /// both streams have closed.
    pub async fn forward(&self, mut session: SessionStreams) {
        let (mut calls_open, mut outcome_open) = (true, true);
        while calls_open || outcome_open {
            tokio::select! {
                call = session.calls.recv(), if calls_open => match call {
                    Some(pending) => {
                        let mut inner = self.lock();
                        inner.push(ServerEvent::Invocation { args: pending.call().args.clone() });
                        inner.pending.push_back(pending);
                    }
                    None => calls_open = false,
                },
                outcome = session.outcome.recv(), if outcome_open => match outcome {
                    Some(outcome) => {
                        let exit_code = outcome.exit_status();
                        let mut inner = self.lock();
                        inner.outcome = Some(exit_code);
                        inner.push(ServerEvent::Result { exit_code });
                    }
                    None => outcome_open = false,
                },
            }
        }
        {
            let mut inner = self.lock();
            inner.finished = true;
            inner.client = None;
        }
        tracing::info!(status = ?self.outcome().map(ExitStatus::code), "session finished");
        self.finished.send_replace(true);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::NestedPolicy;
    use crate::intercept::ScriptTask;
    use crate::shell::{parse, ExecContext, ExecHook, RunnerConfig};

    struct Status(u8);

    impl ExecHook for Status {
        fn exec(&self, _ctx: &ExecContext, _args: &[String]) -> ExitStatus {
            ExitStatus::new(self.0)
        }
    }

    fn state(policy: RemotePolicy) -> Arc<RemoteState> {
        Arc::new(RemoteState::new(ResumeExecutor::new(Arc::new(Status(3)), NestedPolicy::FallThrough), policy))
    }

    fn start(state: &Arc<RemoteState>, script: &str) -> tokio::task::JoinHandle<()> {
        let program = parse(script, "t.sh").unwrap();
        let session = ScriptTask::spawn(program, RunnerConfig::new(std::env::temp_dir()), None).unwrap();
        let state = Arc::clone(state);
        tokio::spawn(async move { state.forward(session).await })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn only_one_client_attaches_at_a_time() {
        let state = state(RemotePolicy::ForcedExit);
        let _first = state.attach().unwrap();
        assert_eq!(state.attach().unwrap_err(), AttachError::Busy);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn release_without_pending_calls_is_rejected() {
        let state = state(RemotePolicy::ForcedExit);
        assert_eq!(state.release(ExitStatus::new(1)), Err(ReturnError::NothingPending));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reattaching_replays_pending_calls() {
        let state = state(RemotePolicy::ForcedExit);
        let forward = start(&state, "deploy now");

        let mut first = state.attach().unwrap();
        assert_eq!(first.recv().await, Some(ServerEvent::Invocation { args: vec!["deploy".into(), "now".into()] }));
        drop(first);

        let mut second = state.attach().unwrap();
        assert_eq!(second.recv().await, Some(ServerEvent::Invocation { args: vec!["deploy".into(), "now".into()] }));

        state.release(ExitStatus::new(9)).unwrap();
        assert_eq!(second.recv().await, Some(ServerEvent::Result { exit_code: ExitStatus::new(9) }));
        assert_eq!(second.recv().await, None);

        forward.await.unwrap();
        assert_eq!(state.outcome(), Some(ExitStatus::new(9)));
        assert_eq!(state.attach().unwrap_err(), AttachError::Finished);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fall_through_policy_keeps_real_status_for_zero() {
        let state = state(RemotePolicy::FallThrough);
        let forward = start(&state, "check");
        let mut client = state.attach().unwrap();
        assert!(matches!(client.recv().await, Some(ServerEvent::Invocation { .. })));
        state.release(ExitStatus::SUCCESS).unwrap();
        forward.await.unwrap();
        assert_eq!(state.outcome(), Some(ExitStatus::new(3)));
    }
}
