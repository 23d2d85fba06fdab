//! Text acquisition port used to author mock scripts.

use std::error::Error;

/// Obtains free-form text from the user, starting from a seed.
pub trait TextEditor: Send + Sync {
    /// Presents `seed` for editing and returns the edited text.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor cannot be started, exits unsuccessfully,
    /// or its result cannot be read back.
    fn edit(&self, seed: &str) -> Result<String, Box<dyn Error + Send + Sync>>;
}
