//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the interception core and an
//! external system (real program execution, the user's text editor).
//! Implementations live in `src/adapters/`.

pub mod editor;

pub use crate::shell::ExecHook;
pub use editor::TextEditor;
