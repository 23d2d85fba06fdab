//! The interception core: calls, decisions, the hook handoff and resumption.

pub mod authoring;
pub mod call;
pub mod coordinator;
pub mod resume;
pub mod task;

pub use authoring::{MockAuthor, MockDraft};
pub use call::{CallId, Decision, DecisionKind, InterceptedCall};
pub use coordinator::{Behavior, CallStream, Interceptor, PendingCall, Resumption};
pub use resume::{run_mock, ResumeExecutor};
pub use task::{OutcomeStream, ScriptOutcome, ScriptTask, SessionStreams};
