//! Exit statuses shared by the engine, the hooks and the decision sources.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The exit status of a command or script. Zero means success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExitStatus(u8);

impl ExitStatus {
    /// Successful completion.
    pub const SUCCESS: Self = Self(0);
    /// Generic failure.
    pub const FAILURE: Self = Self(1);
    /// The real command exceeded the wall-clock ceiling and was killed.
    pub const TIMED_OUT: Self = Self(124);
    /// The program was found but could not be started.
    pub const NOT_EXECUTABLE: Self = Self(126);
    /// The program could not be found.
    pub const NOT_FOUND: Self = Self(127);

    /// Creates a status from a raw code.
    #[must_use]
    pub const fn new(code: u8) -> Self {
        Self(code)
    }

    /// Returns the raw numeric code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self.0
    }

    /// Returns `true` for a zero status.
    #[must_use]
    pub const fn success(self) -> bool {
        self.0 == 0
    }

    /// Maps an arbitrary process code onto the 0..=255 range the way a shell does.
    #[must_use]
    pub fn from_process_code(code: i32) -> Self {
        // Truncation to the low byte is the POSIX convention.
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        Self((code & 0xff) as u8)
    }
}

impl From<u8> for ExitStatus {
    fn from(code: u8) -> Self {
        Self(code)
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_codes_wrap_to_low_byte() {
        assert_eq!(ExitStatus::from_process_code(3), ExitStatus::new(3));
        assert_eq!(ExitStatus::from_process_code(256), ExitStatus::SUCCESS);
        assert_eq!(ExitStatus::from_process_code(-1), ExitStatus::new(255));
    }

    #[test]
    fn only_zero_is_success() {
        assert!(ExitStatus::SUCCESS.success());
        assert!(!ExitStatus::FAILURE.success());
    }
}
