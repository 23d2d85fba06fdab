//! Service context bundling the port trait objects a run needs.

use std::sync::Arc;

use crate::adapters::live::{LiveEditor, LiveExec};
use crate::config::Settings;
use crate::ports::{ExecHook, TextEditor};

/// Bundles the external boundaries of a run.
///
/// Constructors wire up different adapter implementations (live or scripted).
#[derive(Clone)]
pub struct ServiceContext {
    /// Real command execution used for fall-through.
    pub exec: Arc<dyn ExecHook>,
    /// Editor used to author mocks.
    pub editor: Arc<dyn TextEditor>,
}

impl ServiceContext {
    /// Creates a context from explicit adapters.
    #[must_use]
    pub fn new(exec: Arc<dyn ExecHook>, editor: Arc<dyn TextEditor>) -> Self {
        Self { exec, editor }
    }

    /// Creates a live context: real processes and the configured editor.
    #[must_use]
    pub fn live(settings: &Settings) -> Self {
        Self::new(Arc::new(LiveExec::new(settings.exec_timeout)), Arc::new(LiveEditor::new(&settings.editor)))
    }
}
