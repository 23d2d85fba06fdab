//! Wire types for the remote client.

use axum::response::sse::Event;
use serde::{Deserialize, Serialize};

use crate::shell::ExitStatus;

/// An event pushed to the attached client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEvent {
    /// A call is waiting for a code.
    Invocation {
        /// Arguments of the call; `args[0]` is the command name.
        args: Vec<String>,
    },
    /// The script has finished.
    Result {
        /// The script's final status.
        #[serde(rename = "exitCode")]
        exit_code: ExitStatus,
    },
}

impl ServerEvent {
    /// The SSE event name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Invocation { .. } => "invocation",
            Self::Result { .. } => "result",
        }
    }
}

/// Body of `POST /return`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    /// Code the client chose for the oldest pending call.
    pub exit_code: i64,
}

impl ReturnRequest {
    /// Parses and range-checks a request body.
    ///
    /// # Errors
    ///
    /// Returns a message when the body is not the expected JSON or the code
    /// is outside `0..=255`.
    pub fn parse(body: &[u8]) -> Result<ExitStatus, String> {
        let request: Self = serde_json::from_slice(body).map_err(|e| format!("failed to parse body: {e}"))?;
        u8::try_from(request.exit_code)
            .map(ExitStatus::new)
            .map_err(|_| format!("exit code {} is outside 0..=255", request.exit_code))
    }
}

/// Numbers the events of one client connection, starting at 1.
#[derive(Debug)]
pub struct EventIds {
    next: u64,
}

impl EventIds {
    /// A fresh sequence.
    #[must_use]
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Encodes `event` with the next id.
    pub fn encode(&mut self, event: &ServerEvent) -> Event {
        let id = self.next;
        self.next += 1;
        let data = serde_json::to_string(event).unwrap_or_default();
        Event::default().id(id.to_string()).event(event.name()).data(data)
    }
}

impl Default for EventIds {
    fn default() -> Self {
        Self::new()
    }
}
