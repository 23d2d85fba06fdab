//! CLI argument definitions.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{NestedPolicy, RemotePolicy};

/// Top-level CLI parser for `mockscript`.
#[derive(Debug, Parser)]
#[command(
    name = "mockscript",
    version,
    about = "Run a shell script and decide how each external command it invokes resolves"
)]
pub struct Cli {
    /// Path to the script to run.
    pub script: PathBuf,

    /// Take decisions from a browser client instead of the terminal.
    #[arg(long)]
    pub remote: bool,

    /// Address the remote server listens on.
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<String>,

    /// How a code posted by the remote client resolves a call.
    #[arg(long, value_enum, value_name = "POLICY")]
    pub remote_policy: Option<RemotePolicy>,

    /// Where commands issued by a running mock go.
    #[arg(long, value_enum, value_name = "POLICY")]
    pub nested: Option<NestedPolicy>,

    /// Wall-clock ceiling for real commands, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub exec_timeout_ms: Option<u64>,

    /// Status reported by the "exit" menu option.
    #[arg(long, value_name = "CODE")]
    pub forced_exit_code: Option<u8>,

    /// Write a YAML transcript of every resolved call.
    #[arg(long, value_name = "PATH")]
    pub transcript: Option<PathBuf>,

    /// Read settings from this YAML file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Static asset directory served to the remote client.
    #[arg(long, value_name = "DIR")]
    pub webapp_dir: Option<PathBuf>,
}
