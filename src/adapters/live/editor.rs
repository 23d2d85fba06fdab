//! Live text editor that opens a scratch file in the user's `$EDITOR`.

use std::error::Error;
use std::path::PathBuf;
use std::process::Command;

use crate::ports::editor::TextEditor;

/// Program used when no editor is configured.
pub const FALLBACK_EDITOR: &str = "vi";

/// Edits drafts with an external program bound to the terminal.
#[derive(Debug, Clone)]
pub struct LiveEditor {
    command: Vec<String>,
    scratch_dir: PathBuf,
}

impl LiveEditor {
    /// Creates an editor from a command line such as `"code --wait"`.
    ///
    /// A blank command line selects [`FALLBACK_EDITOR`].
    #[must_use]
    pub fn new(command_line: &str) -> Self {
        let mut command: Vec<String> = command_line.split_whitespace().map(str::to_string).collect();
        if command.is_empty() {
            command.push(FALLBACK_EDITOR.to_string());
        }
        Self { command, scratch_dir: std::env::temp_dir() }
    }

    /// Places scratch files under `dir` instead of the system temp directory.
    #[must_use]
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    fn scratch_path(&self) -> PathBuf {
        self.scratch_dir.join(format!("mockscript-{}.sh", uuid::Uuid::new_v4()))
    }
}

impl TextEditor for LiveEditor {
    fn edit(&self, seed: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
        let path = self.scratch_path();
        std::fs::write(&path, seed)
            .map_err(|e| format!("failed to write scratch file {}: {e}", path.display()))?;

        let result = Command::new(&self.command[0]).args(&self.command[1..]).arg(&path).status();
        let text = match result {
            Ok(status) if status.success() => std::fs::read_to_string(&path)
                .map_err(|e| format!("failed to read scratch file {}: {e}", path.display())),
            Ok(status) => Err(format!("editor {} exited with {status}", self.command[0])),
            Err(e) => Err(format!("failed to start editor {}: {e}", self.command[0])),
        };
        let _ = std::fs::remove_file(&path);
        Ok(text?)
    }
}
