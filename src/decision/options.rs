//! The interactive menu.

use crate::intercept::Decision;
use crate::shell::ExitStatus;

/// One entry of the per-call menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    /// Run the real command.
    RunReal,
    /// Author a mock in the editor.
    WriteMock,
    /// Report the configured forced-exit status.
    ForceExit,
}

impl MenuOption {
    /// Every option, in menu order.
    pub const ALL: [Self; 3] = [Self::RunReal, Self::WriteMock, Self::ForceExit];

    /// The number typed to select this option.
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Self::RunReal => 1,
            Self::WriteMock => 2,
            Self::ForceExit => 3,
        }
    }

    /// Menu text for this option.
    #[must_use]
    pub fn label(self, forced_exit_code: ExitStatus) -> String {
        match self {
            Self::RunReal => "run the real command".to_string(),
            Self::WriteMock => "write a mock".to_string(),
            Self::ForceExit => format!("exit {forced_exit_code}"),
        }
    }

    /// Parses a typed selection; surrounding whitespace is ignored.
    #[must_use]
    pub fn parse_selection(input: &str) -> Option<Self> {
        let number: u8 = input.trim().parse().ok()?;
        Self::ALL.into_iter().find(|option| option.number() == number)
    }

    /// The decision this option stands for.
    #[must_use]
    pub fn decision(self, forced_exit_code: ExitStatus) -> Decision {
        match self {
            Self::RunReal => Decision::FallThrough,
            Self::WriteMock => Decision::Mock,
            Self::ForceExit => Decision::ForcedExit(forced_exit_code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selections_map_to_options() {
        assert_eq!(MenuOption::parse_selection("1\n"), Some(MenuOption::RunReal));
        assert_eq!(MenuOption::parse_selection(" 2 "), Some(MenuOption::WriteMock));
        assert_eq!(MenuOption::parse_selection("3"), Some(MenuOption::ForceExit));
    }

    #[test]
    fn invalid_selections_are_rejected() {
        for input in ["", "0", "4", "-1", "one", "1 2", "999"] {
            assert_eq!(MenuOption::parse_selection(input), None, "{input:?}");
        }
    }

    #[test]
    fn force_exit_uses_the_configured_code() {
        let code = ExitStatus::new(5);
        assert_eq!(MenuOption::ForceExit.decision(code), Decision::ForcedExit(code));
        assert_eq!(MenuOption::ForceExit.label(code), "exit 5");
    }
}
