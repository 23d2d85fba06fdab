//! Intercepted calls and the decisions that resolve them.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shell::ExitStatus;

/// Correlates an intercepted call with its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallId(Uuid);

impl CallId {
    /// A fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An external command the engine is blocked on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedCall {
    /// Identity of this call.
    pub id: CallId,
    /// Arguments; `args[0]` is the command name.
    pub args: Vec<String>,
}

impl InterceptedCall {
    /// Wraps the arguments of a new call.
    #[must_use]
    pub fn new(args: Vec<String>) -> Self {
        Self { id: CallId::new(), args }
    }

    /// The command name.
    #[must_use]
    pub fn command(&self) -> &str {
        self.args.first().map_or("", String::as_str)
    }

    /// The arguments joined by single spaces.
    #[must_use]
    pub fn command_line(&self) -> String {
        self.args.join(" ")
    }
}

/// How one call is to be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Run the real command.
    FallThrough,
    /// Author and run a substitute script.
    Mock,
    /// Skip execution and report this status.
    ForcedExit(ExitStatus),
}

impl Decision {
    /// The label used in logs and transcripts.
    #[must_use]
    pub fn kind(self) -> DecisionKind {
        match self {
            Self::FallThrough => DecisionKind::FallThrough,
            Self::Mock => DecisionKind::Mock,
            Self::ForcedExit(_) => DecisionKind::ForcedExit,
        }
    }
}

/// [`Decision`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionKind {
    /// The real command ran.
    FallThrough,
    /// A user-authored mock ran.
    Mock,
    /// A status was reported without running anything.
    ForcedExit,
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FallThrough => "fall-through",
            Self::Mock => "mock",
            Self::ForcedExit => "forced-exit",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calls_get_distinct_ids() {
        let a = InterceptedCall::new(vec!["ls".into()]);
        let b = InterceptedCall::new(vec!["ls".into()]);
        assert_ne!(a.id, b.id);
        assert_eq!(a.command(), "ls");
    }

    #[test]
    fn decision_kinds_label_decisions() {
        assert_eq!(Decision::ForcedExit(ExitStatus::new(4)).kind().to_string(), "forced-exit");
        assert_eq!(Decision::FallThrough.kind().to_string(), "fall-through");
        assert_eq!(Decision::Mock.kind(), DecisionKind::Mock);
    }
}
