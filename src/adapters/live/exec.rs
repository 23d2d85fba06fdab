//! Live exec hook that spawns the real program with `std::process::Command`.

use std::io;
use std::process::{Child, Command};
use std::thread;
use std::time::{Duration, Instant};

use crate::shell::{Capture, ExecContext, ExecHook, ExitStatus, Input};

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const DRAIN_GRACE: Duration = Duration::from_millis(50);

/// Runs intercepted commands for real, bounded by a wall-clock ceiling.
#[derive(Debug, Clone, Copy)]
pub struct LiveExec {
    timeout: Duration,
}

impl LiveExec {
    /// Ceiling applied when none is configured.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

    /// Creates an executor that kills programs running longer than `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn spawn(ctx: &ExecContext, program: &str, args: &[String]) -> io::Result<Child> {
        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(&ctx.dir)
            .env_clear()
            .envs(&ctx.env)
            .stdin(ctx.streams.stdin.stdio()?)
            .stdout(ctx.streams.stdout.stdio()?)
            .stderr(ctx.streams.stderr.stdio()?);
        isolate(&mut command, &ctx.streams.stdin);
        command.spawn()
    }

    fn wait(&self, child: &mut Child, program: &str, deadline: Instant) -> io::Result<ExitStatus> {
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(map_status(status));
            }
            if Instant::now() >= deadline {
                tracing::warn!(program, timeout_ms = self.timeout.as_millis(), "command timed out, killing it");
                kill_tree(child)?;
                child.wait()?;
                return Ok(ExitStatus::TIMED_OUT);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Starts the child in its own process group so a timeout can kill its
/// descendants too. A child reading the terminal must stay in the foreground
/// group, so inherited stdin opts out.
#[cfg(unix)]
fn isolate(command: &mut Command, stdin: &Input) {
    use std::os::unix::process::CommandExt;

    if !matches!(stdin, Input::Inherit) {
        command.process_group(0);
    }
}

#[cfg(not(unix))]
fn isolate(_command: &mut Command, _stdin: &Input) {}

/// Kills the child's process group when it leads one, else just the child.
#[cfg(unix)]
fn kill_tree(child: &mut Child) -> io::Result<()> {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::{getpgid, Pid};

    let pid = Pid::from_raw(i32::try_from(child.id()).map_err(io::Error::other)?);
    if getpgid(Some(pid)) == Ok(pid) {
        if let Err(err) = killpg(pid, Signal::SIGKILL) {
            tracing::debug!(%pid, error = %err, "failed to kill process group");
        }
    }
    match child.kill() {
        Err(err) if err.kind() != io::ErrorKind::InvalidInput => Err(err),
        _ => Ok(()),
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) -> io::Result<()> {
    child.kill()
}

impl Default for LiveExec {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT)
    }
}

impl ExecHook for LiveExec {
    fn exec(&self, ctx: &ExecContext, args: &[String]) -> ExitStatus {
        let Some((program, rest)) = args.split_first() else {
            return ExitStatus::SUCCESS;
        };
        let mut child = match Self::spawn(ctx, program, rest) {
            Ok(child) => child,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                ctx.streams.stderr.diagnostic(&format!("{program}: command not found"));
                return ExitStatus::NOT_FOUND;
            }
            Err(err) => {
                ctx.streams.stderr.diagnostic(&format!("{program}: {err}"));
                return ExitStatus::NOT_EXECUTABLE;
            }
        };
        let deadline = Instant::now() + self.timeout;
        let capture = Capture::start(&ctx.streams, child.stdout.take(), child.stderr.take());
        let status = self.wait(&mut child, program, deadline).unwrap_or_else(|err| {
            tracing::error!(program, error = %err, "failed waiting for command");
            ExitStatus::FAILURE
        });
        if !capture.finish_by(deadline.max(Instant::now()) + DRAIN_GRACE) {
            tracing::warn!(program, "output still open after the command ended, detaching it");
        }
        status
    }
}

#[cfg(unix)]
fn map_status(status: std::process::ExitStatus) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    match (status.code(), status.signal()) {
        (Some(code), _) => ExitStatus::from_process_code(code),
        (None, Some(signal)) => ExitStatus::from_process_code(128 + signal),
        (None, None) => ExitStatus::FAILURE,
    }
}

#[cfg(not(unix))]
fn map_status(status: std::process::ExitStatus) -> ExitStatus {
    status.code().map_or(ExitStatus::FAILURE, ExitStatus::from_process_code)
}
