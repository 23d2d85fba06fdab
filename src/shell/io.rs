//! Standard stream handles passed to scripts, builtins and spawned programs.

use std::fs::File;
use std::io::{self, Read, Write};
use std::process::{ChildStderr, ChildStdout, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const DRAIN_POLL: Duration = Duration::from_millis(5);

/// Where a script reads standard input from.
#[derive(Debug, Clone, Default)]
pub enum Input {
    /// Empty input.
    #[default]
    Null,
    /// The host process's standard input.
    Inherit,
    /// An open file.
    File(Arc<File>),
}

/// Where a script writes an output stream to.
#[derive(Debug, Clone, Default)]
pub enum Output {
    /// Discarded.
    #[default]
    Null,
    /// The host process's standard output.
    Stdout,
    /// The host process's standard error.
    Stderr,
    /// An open file.
    File(Arc<File>),
    /// An in-memory capture.
    Buffer(OutputBuffer),
}

/// Shared in-memory capture of an output stream.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer(Arc<Mutex<Vec<u8>>>);

impl OutputBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends bytes.
    pub fn append(&self, bytes: &[u8]) {
        let mut guard = self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.extend_from_slice(bytes);
    }

    /// Returns everything captured so far, lossily decoded.
    #[must_use]
    pub fn contents(&self) -> String {
        let guard = self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        String::from_utf8_lossy(&guard).into_owned()
    }
}

impl Input {
    /// Builds the `Stdio` a child process should inherit.
    ///
    /// # Errors
    ///
    /// Returns an error if a file handle cannot be duplicated.
    pub fn stdio(&self) -> io::Result<Stdio> {
        Ok(match self {
            Self::Null => Stdio::null(),
            Self::Inherit => Stdio::inherit(),
            Self::File(file) => Stdio::from(file.try_clone()?),
        })
    }
}

impl Output {
    /// Writes all of `bytes` to the stream.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the underlying handle.
    pub fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        match self {
            Self::Null => Ok(()),
            Self::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(bytes)?;
                out.flush()
            }
            Self::Stderr => io::stderr().lock().write_all(bytes),
            Self::File(file) => (&**file).write_all(bytes),
            Self::Buffer(buffer) => {
                buffer.append(bytes);
                Ok(())
            }
        }
    }

    /// Writes a line, ignoring failures. Used for diagnostics.
    pub fn diagnostic(&self, message: &str) {
        let _ = self.write_all(format!("{message}\n").as_bytes());
    }

    /// Builds the `Stdio` a child process should write to.
    ///
    /// Buffers are backed by a pipe that must be drained with [`Capture`].
    ///
    /// # Errors
    ///
    /// Returns an error if a handle cannot be duplicated.
    pub fn stdio(&self) -> io::Result<Stdio> {
        Ok(match self {
            Self::Null => Stdio::null(),
            Self::Stdout => Stdio::from(io::stdout()),
            Self::Stderr => Stdio::from(io::stderr()),
            Self::File(file) => Stdio::from(file.try_clone()?),
            Self::Buffer(_) => Stdio::piped(),
        })
    }
}

/// Standard input, output and error for one run.
#[derive(Debug, Clone, Default)]
pub struct StdStreams {
    /// Standard input.
    pub stdin: Input,
    /// Standard output.
    pub stdout: Output,
    /// Standard error.
    pub stderr: Output,
}

impl StdStreams {
    /// Streams wired to the host process (`stdin` stays empty).
    #[must_use]
    pub fn inherit() -> Self {
        Self { stdin: Input::Null, stdout: Output::Stdout, stderr: Output::Stderr }
    }

    /// Streams that discard all output.
    #[must_use]
    pub fn discard() -> Self {
        Self::default()
    }

    /// Streams capturing output into fresh buffers, returned alongside.
    #[must_use]
    pub fn captured() -> (Self, OutputBuffer, OutputBuffer) {
        let stdout = OutputBuffer::new();
        let stderr = OutputBuffer::new();
        let streams = Self {
            stdin: Input::Null,
            stdout: Output::Buffer(stdout.clone()),
            stderr: Output::Buffer(stderr.clone()),
        };
        (streams, stdout, stderr)
    }
}

/// Background copiers draining a child's piped output into buffers.
#[derive(Default)]
pub struct Capture {
    threads: Vec<JoinHandle<()>>,
}

impl Capture {
    /// Starts draining whichever child pipes belong to buffer outputs.
    pub fn start(
        streams: &StdStreams,
        stdout: Option<ChildStdout>,
        stderr: Option<ChildStderr>,
    ) -> Self {
        let mut capture = Self::default();
        if let (Output::Buffer(buffer), Some(pipe)) = (&streams.stdout, stdout) {
            capture.drain(pipe, buffer.clone());
        }
        if let (Output::Buffer(buffer), Some(pipe)) = (&streams.stderr, stderr) {
            capture.drain(pipe, buffer.clone());
        }
        capture
    }

    fn drain(&mut self, mut pipe: impl Read + Send + 'static, buffer: OutputBuffer) {
        self.threads.push(std::thread::spawn(move || {
            let mut chunk = [0u8; 4096];
            while let Ok(n) = pipe.read(&mut chunk) {
                if n == 0 {
                    break;
                }
                buffer.append(&chunk[..n]);
            }
        }));
    }

    /// Waits for the copiers to reach end of stream, but no later than
    /// `deadline`. Copiers still running then are detached.
    ///
    /// Returns `false` if any copier was left behind.
    pub fn finish_by(self, deadline: Instant) -> bool {
        while self.threads.iter().any(|thread| !thread.is_finished()) && Instant::now() < deadline {
            std::thread::sleep(DRAIN_POLL);
        }
        let mut complete = true;
        for thread in self.threads {
            if thread.is_finished() {
                let _ = thread.join();
            } else {
                complete = false;
            }
        }
        complete
    }
}
