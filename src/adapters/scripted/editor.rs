//! Scripted text editor serving queued drafts, for tests and unattended runs.

use std::collections::VecDeque;
use std::error::Error;
use std::sync::{Mutex, PoisonError};

use crate::ports::editor::TextEditor;

/// Returns pre-written drafts in order and remembers every seed offered.
#[derive(Debug, Default)]
pub struct ScriptedEditor {
    drafts: Mutex<VecDeque<String>>,
    seeds: Mutex<Vec<String>>,
}

impl ScriptedEditor {
    /// Creates an editor that answers with `drafts`, one per edit.
    pub fn new<I, S>(drafts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { drafts: Mutex::new(drafts.into_iter().map(Into::into).collect()), seeds: Mutex::default() }
    }

    /// Seeds received so far, oldest first.
    #[must_use]
    pub fn seeds(&self) -> Vec<String> {
        self.seeds.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl TextEditor for ScriptedEditor {
    fn edit(&self, seed: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
        self.seeds.lock().unwrap_or_else(PoisonError::into_inner).push(seed.to_string());
        self.drafts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| "scripted editor has no drafts left".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serves_drafts_in_order_and_records_seeds() {
        let editor = ScriptedEditor::new(["first", "second"]);
        assert_eq!(editor.edit("a").unwrap(), "first");
        assert_eq!(editor.edit("b").unwrap(), "second");
        assert!(editor.edit("c").is_err());
        assert_eq!(editor.seeds(), vec!["a", "b", "c"]);
    }
}
