//! Core library entry for the `mockscript` CLI.
//!
//! `mockscript` runs a shell script and stops at every external command it
//! would invoke, letting a decision source choose to run the real command,
//! substitute a hand-written mock, or force an exit status.

pub mod adapters;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod decision;
pub mod intercept;
pub mod logging;
pub mod ports;
pub mod shell;
pub mod transcript;

use clap::Parser;

use crate::shell::ExitStatus;

/// Run the CLI with the provided arguments, returning the script's status.
///
/// `--help` and `--version` print and succeed.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or the run cannot start.
pub fn run<I, T>(args: I) -> Result<ExitStatus, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            print!("{err}");
            return Ok(ExitStatus::SUCCESS);
        }
        Err(err) => return Err(err.to_string()),
    };
    commands::dispatch(&cli)
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::shell::ExitStatus;

    #[test]
    fn run_prints_help() {
        assert_eq!(run(["mockscript", "--help"]), Ok(ExitStatus::SUCCESS));
    }

    #[test]
    fn run_errors_without_a_script() {
        assert!(run(["mockscript"]).is_err());
    }

    #[test]
    fn run_errors_on_missing_script_file() {
        let err = run(["mockscript", "/definitely/not/here.sh"]).unwrap_err();
        assert!(err.contains("Failed to read script"));
    }
}
