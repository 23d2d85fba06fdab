//! Tree-walking interpreter with a pluggable exec hook.

use std::collections::{BTreeMap, HashMap};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use super::ast::{AndOr, Command, Connector, List, Pipeline, Program, Redirect, RedirectOp, SimpleCommand};
use super::builtins::Builtin;
use super::io::{Input, Output, StdStreams};
use super::status::ExitStatus;

/// Exported variables handed to external commands.
pub type Environment = BTreeMap<String, String>;

/// The state an external command runs in, snapshotted at the call site.
#[derive(Clone)]
pub struct ExecContext {
    /// Working directory.
    pub dir: PathBuf,
    /// Exported environment, including prefix assignments.
    pub env: Environment,
    /// Standard streams after redirections.
    pub streams: StdStreams,
    /// The hook installed in the engine that issued the call.
    pub hook: Arc<dyn ExecHook>,
}

/// Receives every external command the engine would otherwise spawn.
///
/// Reentrant: a hook may build and run a nested [`Runner`] while handling a call.
pub trait ExecHook: Send + Sync {
    /// Handles one command. `args[0]` is the command name; never empty.
    fn exec(&self, ctx: &ExecContext, args: &[String]) -> ExitStatus;
}

/// Failure to construct a [`Runner`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// The configured working directory does not exist.
    #[error("working directory {} is not a directory", .0.display())]
    WorkingDirectory(PathBuf),
    /// The initial parameters were rejected by `set`.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    /// The engine thread could not be started.
    #[error("failed to start script engine: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Terminal error of a script run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// The script finished with a non-zero status.
    #[error("exit status {0}")]
    Exit(ExitStatus),
}

impl ScriptError {
    /// The status a host should report for this error.
    #[must_use]
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            Self::Exit(status) => *status,
        }
    }
}

/// Non-local exit from `exit`, `set -e` or `set -u`.
#[derive(Debug, Clone, Copy)]
pub(super) struct Exit(pub(super) ExitStatus);

pub(super) type Flow = Result<ExitStatus, Exit>;

/// Construction parameters for a [`Runner`].
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Initial working directory.
    pub dir: PathBuf,
    /// Initial exported environment.
    pub env: Environment,
    /// Standard streams.
    pub streams: StdStreams,
    /// Arguments applied as if passed to `set`; use a leading `"--"` to
    /// assign positional parameters verbatim.
    pub params: Vec<String>,
}

impl RunnerConfig {
    /// A config rooted at `dir` with an empty environment and discarded output.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), env: Environment::new(), streams: StdStreams::discard(), params: Vec::new() }
    }

    /// Replaces the environment.
    #[must_use]
    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    /// Replaces the standard streams.
    #[must_use]
    pub fn with_streams(mut self, streams: StdStreams) -> Self {
        self.streams = streams;
        self
    }

    /// Replaces the `set` arguments.
    #[must_use]
    pub fn with_params(mut self, params: Vec<String>) -> Self {
        self.params = params;
        self
    }
}

#[derive(Debug, Clone)]
pub(super) struct Variable {
    pub(super) value: Option<String>,
    pub(super) exported: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub(super) struct Options {
    pub(super) errexit: bool,
    pub(super) nounset: bool,
    pub(super) xtrace: bool,
}

/// Executes parsed programs.
#[derive(Clone)]
pub struct Runner {
    pub(super) name: String,
    pub(super) dir: PathBuf,
    pub(super) vars: HashMap<String, Variable>,
    pub(super) params: Vec<String>,
    pub(super) streams: StdStreams,
    pub(super) options: Options,
    pub(super) status: ExitStatus,
    hook: Arc<dyn ExecHook>,
    condition_depth: usize,
}

impl Runner {
    /// Creates a runner that sends every external command to `hook`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the directory is missing or the parameters
    /// contain an invalid option.
    pub fn new(config: RunnerConfig, hook: Arc<dyn ExecHook>) -> Result<Self, EngineError> {
        if !config.dir.is_dir() {
            return Err(EngineError::WorkingDirectory(config.dir));
        }
        let vars = config
            .env
            .into_iter()
            .map(|(name, value)| (name, Variable { value: Some(value), exported: true }))
            .collect();
        let mut runner = Self {
            name: "mockscript".to_string(),
            dir: config.dir,
            vars,
            params: Vec::new(),
            streams: config.streams,
            options: Options::default(),
            status: ExitStatus::SUCCESS,
            hook,
            condition_depth: 0,
        };
        runner.apply_set(&config.params).map_err(EngineError::InvalidParameters)?;
        Ok(runner)
    }

    /// Runs `program` to completion.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Exit`] when the final status is non-zero.
    pub fn run(&mut self, program: &Program) -> Result<(), ScriptError> {
        self.name.clone_from(&program.name);
        let status = match self.run_list(&program.body) {
            Ok(status) | Err(Exit(status)) => status,
        };
        self.status = status;
        if status.success() {
            Ok(())
        } else {
            Err(ScriptError::Exit(status))
        }
    }

    /// Current positional parameters.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Current working directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Value of a shell variable, if set.
    #[must_use]
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).and_then(|var| var.value.as_deref())
    }

    pub(super) fn set_var(&mut self, name: String, value: String) {
        let exported = self.vars.get(&name).is_some_and(|var| var.exported);
        self.vars.insert(name, Variable { value: Some(value), exported });
    }

    pub(super) fn exported(&self) -> Environment {
        self.vars
            .iter()
            .filter(|(_, var)| var.exported)
            .filter_map(|(name, var)| var.value.clone().map(|value| (name.clone(), value)))
            .collect()
    }

    pub(super) fn resolve(&self, path: &str) -> PathBuf {
        self.dir.join(path)
    }

    /// Applies `set`-style arguments: flags until the first operand or `--`,
    /// then the remaining words become the positional parameters.
    pub(super) fn apply_set(&mut self, args: &[String]) -> Result<(), String> {
        for (index, arg) in args.iter().enumerate() {
            if arg == "--" {
                self.params = args[index + 1..].to_vec();
                return Ok(());
            }
            let enable = arg.starts_with('-');
            if arg.len() > 1 && (enable || arg.starts_with('+')) {
                for flag in arg[1..].chars() {
                    let slot = match flag {
                        'e' => &mut self.options.errexit,
                        'u' => &mut self.options.nounset,
                        'x' => &mut self.options.xtrace,
                        other => return Err(format!("set: invalid option \"{}{other}\"", &arg[..1])),
                    };
                    *slot = enable;
                }
                continue;
            }
            self.params = args[index..].to_vec();
            return Ok(());
        }
        Ok(())
    }

    fn in_condition<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.condition_depth += 1;
        let result = f(self);
        self.condition_depth -= 1;
        result
    }

    pub(super) fn run_list(&mut self, list: &List) -> Flow {
        let mut status = ExitStatus::SUCCESS;
        for item in list {
            status = self.run_and_or(item)?;
        }
        Ok(status)
    }

    fn run_and_or(&mut self, item: &AndOr) -> Flow {
        let mut status = self.run_pipeline(&item.first, !item.rest.is_empty())?;
        for (index, (connector, pipeline)) in item.rest.iter().enumerate() {
            let proceed = match connector {
                Connector::And => status.success(),
                Connector::Or => !status.success(),
            };
            if proceed {
                status = self.run_pipeline(pipeline, index + 1 < item.rest.len())?;
            }
        }
        Ok(status)
    }

    fn run_pipeline(&mut self, pipeline: &Pipeline, in_chain: bool) -> Flow {
        let status = if pipeline.negated {
            let inner = self.in_condition(|runner| runner.run_command(&pipeline.command))?;
            if inner.success() {
                ExitStatus::FAILURE
            } else {
                ExitStatus::SUCCESS
            }
        } else {
            self.run_command(&pipeline.command)?
        };
        self.status = status;
        if self.options.errexit
            && !status.success()
            && !pipeline.negated
            && !in_chain
            && self.condition_depth == 0
        {
            return Err(Exit(status));
        }
        Ok(status)
    }

    fn run_command(&mut self, command: &Command) -> Flow {
        match command {
            Command::Simple(simple) => self.run_simple(simple),
            Command::If { branches, otherwise } => {
                for (cond, body) in branches {
                    if self.in_condition(|runner| runner.run_list(cond))?.success() {
                        return self.run_list(body);
                    }
                }
                match otherwise {
                    Some(body) => self.run_list(body),
                    None => Ok(ExitStatus::SUCCESS),
                }
            }
            Command::Loop { until, cond, body } => {
                let mut status = ExitStatus::SUCCESS;
                loop {
                    let passed = self.in_condition(|runner| runner.run_list(cond))?.success();
                    if passed == *until {
                        break;
                    }
                    status = self.run_list(body)?;
                }
                Ok(status)
            }
            Command::For { var, items, body } => {
                let items = match items {
                    Some(words) => self.expand_fields(words)?,
                    None => self.params.clone(),
                };
                let mut status = ExitStatus::SUCCESS;
                for item in items {
                    self.set_var(var.clone(), item);
                    status = self.run_list(body)?;
                }
                Ok(status)
            }
            Command::Group(body) => self.run_list(body),
            Command::Subshell(body) => {
                let mut subshell = self.clone();
                match subshell.run_list(body) {
                    Ok(status) | Err(Exit(status)) => Ok(status),
                }
            }
        }
    }

    fn run_simple(&mut self, command: &SimpleCommand) -> Flow {
        let args = self.expand_fields(&command.words)?;
        let mut assigns = Vec::with_capacity(command.assigns.len());
        for assign in &command.assigns {
            assigns.push((assign.name.clone(), self.expand_string(&assign.value)?));
        }
        let mut targets = Vec::with_capacity(command.redirects.len());
        for redirect in &command.redirects {
            targets.push(self.expand_string(&redirect.target)?);
        }

        let streams = match self.redirect(&command.redirects, &targets) {
            Ok(streams) => streams,
            Err(message) => {
                self.streams.stderr.diagnostic(&format!("{}: {message}", self.name));
                return Ok(ExitStatus::FAILURE);
            }
        };

        if args.is_empty() {
            for (name, value) in assigns {
                self.set_var(name, value);
            }
            return Ok(ExitStatus::SUCCESS);
        }

        if self.options.xtrace {
            self.streams.stderr.diagnostic(&format!("+ {}", args.join(" ")));
        }

        if let Some(builtin) = Builtin::lookup(&args[0]) {
            for (name, value) in assigns {
                self.set_var(name, value);
            }
            return builtin.run(self, &args[1..], &streams);
        }

        let mut env = self.exported();
        env.extend(assigns);
        let ctx = ExecContext { dir: self.dir.clone(), env, streams, hook: Arc::clone(&self.hook) };
        Ok(self.hook.exec(&ctx, &args))
    }

    fn redirect(&self, redirects: &[Redirect], targets: &[String]) -> Result<StdStreams, String> {
        let mut streams = self.streams.clone();
        for (redirect, target) in redirects.iter().zip(targets) {
            let output = match redirect.op {
                RedirectOp::Read => {
                    if redirect.fd != 0 {
                        return Err(format!("{}: input redirection must target stdin", redirect.fd));
                    }
                    let file = File::open(self.resolve(target)).map_err(|e| format!("{target}: {e}"))?;
                    streams.stdin = Input::File(Arc::new(file));
                    continue;
                }
                RedirectOp::Write => {
                    let file = File::create(self.resolve(target)).map_err(|e| format!("{target}: {e}"))?;
                    Output::File(Arc::new(file))
                }
                RedirectOp::Append => {
                    let file = OpenOptions::new()
                        .append(true)
                        .create(true)
                        .open(self.resolve(target))
                        .map_err(|e| format!("{target}: {e}"))?;
                    Output::File(Arc::new(file))
                }
                RedirectOp::Duplicate => match target.as_str() {
                    "1" => streams.stdout.clone(),
                    "2" => streams.stderr.clone(),
                    _ => return Err(format!("{target}: bad file descriptor")),
                },
            };
            match redirect.fd {
                1 => streams.stdout = output,
                2 => streams.stderr = output,
                fd => return Err(format!("{fd}: bad file descriptor")),
            }
        }
        Ok(streams)
    }
}
