//! Layered run settings: defaults, YAML file, environment, then CLI flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::adapters::live::editor::FALLBACK_EDITOR;
use crate::cli::Cli;
use crate::shell::ExitStatus;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "MOCKSCRIPT_CONFIG";
/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = ".mockscript.yaml";

/// How a code posted by a remote client resolves a call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemotePolicy {
    /// The posted code is the call's status; nothing is spawned.
    #[default]
    ForcedExit,
    /// The real command runs; a non-zero posted code overrides its status.
    FallThrough,
}

/// Where commands issued by a running mock go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NestedPolicy {
    /// Straight to real execution, without asking.
    #[default]
    FallThrough,
    /// Back through the interceptor as further decisions.
    Intercept,
}

/// Optional keys read from a YAML config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    /// Editor command line.
    pub editor: Option<String>,
    /// Wall-clock ceiling for real commands, in milliseconds.
    pub exec_timeout_ms: Option<u64>,
    /// Status used by the interactive "exit" option.
    pub forced_exit_code: Option<u8>,
    /// Remote listen address.
    pub listen: Option<String>,
    /// Static asset directory for the remote client.
    pub webapp_dir: Option<PathBuf>,
    /// Remote decision policy.
    pub remote_policy: Option<RemotePolicy>,
    /// Nested command policy.
    pub nested: Option<NestedPolicy>,
    /// Transcript output path.
    pub transcript: Option<PathBuf>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Editor command line used to author mocks.
    pub editor: String,
    /// Wall-clock ceiling for real commands.
    pub exec_timeout: Duration,
    /// Status used by the interactive "exit" option.
    pub forced_exit_code: ExitStatus,
    /// Remote listen address.
    pub listen: String,
    /// Static asset directory for the remote client.
    pub webapp_dir: PathBuf,
    /// Remote decision policy.
    pub remote_policy: RemotePolicy,
    /// Nested command policy.
    pub nested: NestedPolicy,
    /// Transcript output path, if any.
    pub transcript: Option<PathBuf>,
    /// Whether decisions come from a remote client.
    pub remote: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            editor: FALLBACK_EDITOR.to_string(),
            exec_timeout: Duration::from_millis(1000),
            forced_exit_code: ExitStatus::FAILURE,
            listen: "127.0.0.1:8080".to_string(),
            webapp_dir: PathBuf::from("webapp"),
            remote_policy: RemotePolicy::default(),
            nested: NestedPolicy::default(),
            transcript: None,
            remote: false,
        }
    }
}

impl Settings {
    /// Resolves settings for `cli` from the process environment and working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named config file is missing, or if
    /// any config file cannot be read or parsed.
    pub fn load(cli: &Cli) -> Result<Self, String> {
        let cwd = std::env::current_dir().map_err(|e| format!("Failed to read working directory: {e}"))?;
        let file = match locate_config(cli.config.as_deref(), std::env::var(CONFIG_ENV).ok(), &cwd)? {
            Some(path) => Some(read_config(&path)?),
            None => None,
        };
        let editor = std::env::var("EDITOR").ok().filter(|value| !value.trim().is_empty());
        Ok(Self::layered(file.unwrap_or_default(), editor, cli))
    }

    /// Applies the layers over the defaults, lowest precedence first.
    #[must_use]
    pub fn layered(file: FileSettings, editor_env: Option<String>, cli: &Cli) -> Self {
        let mut settings = Self::default();

        if let Some(editor) = file.editor {
            settings.editor = editor;
        }
        if let Some(ms) = file.exec_timeout_ms {
            settings.exec_timeout = Duration::from_millis(ms);
        }
        if let Some(code) = file.forced_exit_code {
            settings.forced_exit_code = ExitStatus::new(code);
        }
        if let Some(listen) = file.listen {
            settings.listen = listen;
        }
        if let Some(dir) = file.webapp_dir {
            settings.webapp_dir = dir;
        }
        if let Some(policy) = file.remote_policy {
            settings.remote_policy = policy;
        }
        if let Some(nested) = file.nested {
            settings.nested = nested;
        }
        settings.transcript = file.transcript;

        if let Some(editor) = editor_env {
            settings.editor = editor;
        }

        if let Some(ms) = cli.exec_timeout_ms {
            settings.exec_timeout = Duration::from_millis(ms);
        }
        if let Some(code) = cli.forced_exit_code {
            settings.forced_exit_code = ExitStatus::new(code);
        }
        if let Some(listen) = &cli.listen {
            settings.listen.clone_from(listen);
        }
        if let Some(dir) = &cli.webapp_dir {
            settings.webapp_dir.clone_from(dir);
        }
        if let Some(policy) = cli.remote_policy {
            settings.remote_policy = policy;
        }
        if let Some(nested) = cli.nested {
            settings.nested = nested;
        }
        if cli.transcript.is_some() {
            settings.transcript.clone_from(&cli.transcript);
        }
        settings.remote = cli.remote;
        settings
    }
}

/// Picks the config file to read, if any.
///
/// An explicit path or `$MOCKSCRIPT_CONFIG` must exist; the working-directory
/// default is optional.
///
/// # Errors
///
/// Returns an error if an explicitly requested file does not exist.
pub fn locate_config(
    explicit: Option<&Path>,
    env_value: Option<String>,
    cwd: &Path,
) -> Result<Option<PathBuf>, String> {
    let requested = explicit.map(Path::to_path_buf).or_else(|| env_value.map(PathBuf::from));
    if let Some(path) = requested {
        if !path.is_file() {
            return Err(format!("Config file not found: {}", path.display()));
        }
        return Ok(Some(path));
    }
    let fallback = cwd.join(DEFAULT_CONFIG_FILE);
    Ok(fallback.is_file().then_some(fallback))
}

/// Reads and parses a YAML config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not match the schema.
pub fn read_config(path: &Path) -> Result<FileSettings, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(FileSettings::default());
    }
    serde_yaml::from_str(&content).map_err(|e| format!("Failed to parse config file {}: {e}", path.display()))
}
