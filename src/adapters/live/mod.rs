//! Live adapters for real external interactions.

pub mod editor;
pub mod exec;

pub use editor::LiveEditor;
pub use exec::LiveExec;
