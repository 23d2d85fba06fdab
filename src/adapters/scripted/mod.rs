//! Scripted adapters answering from canned data.

pub mod editor;

pub use editor::ScriptedEditor;
