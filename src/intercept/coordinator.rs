//! Channel handoff between a blocked exec hook and the active decision source.
//!
//! Each intercepted call travels as a [`PendingCall`] carrying a one-shot
//! reply slot. The hook blocks on that slot until the decision source answers
//! with a [`Resumption`], then runs it in the call's own context.

use std::sync::PoisonError;

use tokio::sync::{mpsc, oneshot};

use super::call::{DecisionKind, InterceptedCall};
use crate::shell::{ExecContext, ExecHook, ExitStatus};
use crate::transcript::SharedTranscript;

/// Behaviour run in place of a call.
pub type Behavior = Box<dyn FnOnce(&ExecContext, &[String]) -> ExitStatus + Send>;

/// Stream of calls awaiting a decision.
pub type CallStream = mpsc::Receiver<PendingCall>;

/// What a decision source hands back to a blocked hook.
pub struct Resumption {
    kind: DecisionKind,
    behavior: Behavior,
}

impl Resumption {
    /// Pairs a behaviour with the decision it implements.
    #[must_use]
    pub fn new(kind: DecisionKind, behavior: Behavior) -> Self {
        Self { kind, behavior }
    }

    /// The decision this resumption implements.
    #[must_use]
    pub fn kind(&self) -> DecisionKind {
        self.kind
    }

    /// Runs the behaviour for `args` in `ctx`.
    pub fn run(self, ctx: &ExecContext, args: &[String]) -> ExitStatus {
        (self.behavior)(ctx, args)
    }
}

impl std::fmt::Debug for Resumption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resumption").field("kind", &self.kind).finish_non_exhaustive()
    }
}

/// A call whose engine is blocked until [`PendingCall::resolve`] runs.
///
/// Resolving consumes the value, so a call is answered at most once.
#[derive(Debug)]
pub struct PendingCall {
    call: InterceptedCall,
    reply: oneshot::Sender<Resumption>,
}

impl PendingCall {
    /// The call awaiting a decision.
    #[must_use]
    pub fn call(&self) -> &InterceptedCall {
        &self.call
    }

    /// Releases the blocked engine with `resumption`.
    pub fn resolve(self, resumption: Resumption) {
        if self.reply.send(resumption).is_err() {
            tracing::warn!(call = %self.call.id, "engine stopped waiting before the call was resolved");
        }
    }
}

/// Exec hook that surfaces every call to a decision source and blocks until answered.
///
/// Must be invoked from a plain thread, never from inside the async runtime.
#[derive(Clone)]
pub struct Interceptor {
    calls: mpsc::Sender<PendingCall>,
    transcript: Option<SharedTranscript>,
}

impl Interceptor {
    /// Creates a hook and the stream its calls arrive on.
    #[must_use]
    pub fn channel(transcript: Option<SharedTranscript>) -> (Self, CallStream) {
        let (calls, stream) = mpsc::channel(1);
        (Self { calls, transcript }, stream)
    }

    fn record(&self, args: &[String], kind: DecisionKind, status: ExitStatus) {
        let Some(transcript) = &self.transcript else {
            return;
        };
        let mut recorder = transcript.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = recorder.record(args, kind, status) {
            tracing::warn!(error = %err, "failed to update transcript");
        }
    }
}

impl ExecHook for Interceptor {
    fn exec(&self, ctx: &ExecContext, args: &[String]) -> ExitStatus {
        let call = InterceptedCall::new(args.to_vec());
        let id = call.id;
        let (reply, answer) = oneshot::channel();
        if self.calls.blocking_send(PendingCall { call, reply }).is_err() {
            tracing::error!(call = %id, ?args, "no decision source is listening");
            return ExitStatus::FAILURE;
        }
        let Ok(resumption) = answer.blocking_recv() else {
            tracing::error!(call = %id, ?args, "call dropped without a decision");
            return ExitStatus::FAILURE;
        };
        let kind = resumption.kind();
        let status = resumption.run(ctx, args);
        tracing::info!(call = %id, ?args, decision = %kind, status = status.code(), "call resumed");
        self.record(args, kind, status);
        status
    }
}
