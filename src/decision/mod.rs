//! Decision sources: the terminal menu and the remote browser client.

pub mod interactive;
pub mod options;
pub mod remote;

pub use interactive::InteractiveSource;
pub use options::MenuOption;
