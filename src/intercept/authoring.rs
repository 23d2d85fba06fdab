//! Mock authoring: edit, parse, and retry until the draft is valid.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::call::InterceptedCall;
use crate::ports::TextEditor;
use crate::shell::{parse, Program};

const EDITOR_RETRY_DELAY: Duration = Duration::from_millis(500);

/// The text being authored for one call and the last reason it was rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockDraft {
    /// Text returned by the editor.
    pub text: String,
    /// Message shown at the top of the next seed.
    pub prior_error: Option<String>,
}

impl MockDraft {
    /// The text the editor opens with for `call`.
    ///
    /// Each non-empty line of the prior error becomes a comment, followed by a
    /// commented command line and two blank lines for the mock body.
    #[must_use]
    pub fn seed(&self, call: &InterceptedCall) -> String {
        let mut seed = String::new();
        if let Some(error) = &self.prior_error {
            for line in error.lines().filter(|line| !line.trim().is_empty()) {
                seed.push_str("# ");
                seed.push_str(line);
                seed.push('\n');
            }
        }
        seed.push_str("# ");
        seed.push_str(&call.command_line());
        seed.push_str("\n\n\n");
        seed
    }
}

/// Produces a runnable mock for a call by looping over the editor.
#[derive(Clone)]
pub struct MockAuthor {
    editor: Arc<dyn TextEditor>,
    retry_delay: Duration,
}

impl MockAuthor {
    /// Creates an author that drafts with `editor`.
    #[must_use]
    pub fn new(editor: Arc<dyn TextEditor>) -> Self {
        Self { editor, retry_delay: EDITOR_RETRY_DELAY }
    }

    /// Changes the pause taken after the editor itself fails.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Blocks until the user produces text that parses.
    ///
    /// There is no attempt limit; every failure is fed back into the next seed.
    #[must_use]
    pub fn author(&self, call: &InterceptedCall) -> Program {
        let name = format!("mock:{}", call.command());
        let mut draft = MockDraft::default();
        let mut attempt = 0u64;
        loop {
            attempt += 1;
            match self.editor.edit(&draft.seed(call)) {
                Ok(text) => {
                    draft.text = text;
                    match parse(&draft.text, &name) {
                        Ok(program) => {
                            tracing::debug!(call = %call.id, attempt, "mock draft accepted");
                            return program;
                        }
                        Err(err) => {
                            tracing::info!(call = %call.id, attempt, error = %err, "mock draft rejected");
                            draft.prior_error = Some(err.to_string());
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(call = %call.id, attempt, error = %err, "editor failed");
                    draft.prior_error = Some(format!("editor failed: {err}"));
                    thread::sleep(self.retry_delay);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::scripted::ScriptedEditor;

    fn call(words: &[&str]) -> InterceptedCall {
        InterceptedCall::new(words.iter().map(|w| (*w).to_string()).collect())
    }

    #[test]
    fn seed_comments_error_lines_and_the_call() {
        let draft = MockDraft { text: String::new(), prior_error: Some("first\n\nsecond\n".into()) };
        assert_eq!(draft.seed(&call(&["git", "push", "origin"])), "# first\n# second\n# git push origin\n\n\n");
        assert_eq!(MockDraft::default().seed(&call(&["ls"])), "# ls\n\n\n");
    }

    #[test]
    fn valid_draft_is_accepted_first_time() {
        let editor = Arc::new(ScriptedEditor::new(["echo mocked\nexit 3\n"]));
        let program = MockAuthor::new(editor.clone()).author(&call(&["deploy"]));
        assert_eq!(program.name, "mock:deploy");
        assert_eq!(editor.seeds().len(), 1);
    }

    #[test]
    fn parse_errors_are_fed_into_the_next_seed() {
        let editor = Arc::new(ScriptedEditor::new(["echo 'oops", "echo fixed"]));
        let author = MockAuthor::new(editor.clone()).with_retry_delay(Duration::ZERO);
        let _program = author.author(&call(&["deploy", "now"]));
        let seeds = editor.seeds();
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0], "# deploy now\n\n\n");
        assert!(seeds[1].starts_with("# mock:deploy:1:6: "));
        assert!(seeds[1].ends_with("# deploy now\n\n\n"));
    }
}
