//! Binary entrypoint for the `mockscript` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    mockscript::logging::init();
    match mockscript::run(std::env::args()) {
        Ok(status) => ExitCode::from(status.code()),
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
