//! Terminal decision source: one menu prompt per call.

use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

use super::options::MenuOption;
use crate::intercept::{CallStream, Decision, InterceptedCall, MockAuthor, PendingCall, ResumeExecutor};
use crate::shell::ExitStatus;

const EOF_BACKOFF: Duration = Duration::from_millis(250);

/// Prompts on `output`, reads selections from `input`.
pub struct InteractiveSource<R, W> {
    input: R,
    output: W,
    resume: ResumeExecutor,
    author: MockAuthor,
    forced_exit_code: ExitStatus,
    eof_backoff: Duration,
}

impl<R: BufRead, W: Write> InteractiveSource<R, W> {
    /// Creates a source answering calls with `resume` and `author`.
    pub fn new(input: R, output: W, resume: ResumeExecutor, author: MockAuthor, forced_exit_code: ExitStatus) -> Self {
        Self { input, output, resume, author, forced_exit_code, eof_backoff: EOF_BACKOFF }
    }

    /// Changes the pause between prompts once input is exhausted.
    #[must_use]
    pub fn with_eof_backoff(mut self, backoff: Duration) -> Self {
        self.eof_backoff = backoff;
        self
    }

    /// Answers calls until the stream closes.
    ///
    /// Mocks are authored on their own threads, so the prompt loop stays free
    /// for calls from other engines while the editor is open.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt cannot be written or input cannot be read.
    pub fn run(&mut self, calls: &mut CallStream) -> io::Result<()> {
        let mut authors = Vec::new();
        while let Some(pending) = calls.blocking_recv() {
            let decision = self.prompt(pending.call())?;
            match decision {
                Decision::FallThrough => pending.resolve(self.resume.fall_through()),
                Decision::ForcedExit(code) => pending.resolve(ResumeExecutor::forced_exit(code)),
                Decision::Mock => authors.push(self.spawn_author(pending)?),
            }
        }
        for author in authors {
            if author.join().is_err() {
                tracing::error!("mock author panicked, its call fails");
            }
        }
        Ok(())
    }

    fn spawn_author(&self, pending: PendingCall) -> io::Result<thread::JoinHandle<()>> {
        let author = self.author.clone();
        let resume = self.resume.clone();
        thread::Builder::new().name("mock-author".to_string()).spawn(move || {
            let program = author.author(pending.call());
            pending.resolve(resume.mock(program));
        })
    }

    /// Prompts until a valid selection is read.
    ///
    /// Exhausted input never resolves the call: the loop keeps re-prompting
    /// and the script stays blocked.
    fn prompt(&mut self, call: &InterceptedCall) -> io::Result<Decision> {
        let mut warned = false;
        loop {
            writeln!(self.output)?;
            writeln!(self.output, "$ {}", call.command_line())?;
            for option in MenuOption::ALL {
                writeln!(self.output, "  {}) {}", option.number(), option.label(self.forced_exit_code))?;
            }
            write!(self.output, "> ")?;
            self.output.flush()?;

            let mut line = Vec::new();
            if self.input.read_until(b'\n', &mut line)? == 0 {
                if !warned {
                    tracing::warn!(call = %call.id, args = ?call.args, "input closed, call is blocked awaiting decision");
                    warned = true;
                }
                thread::sleep(self.eof_backoff);
                continue;
            }
            match MenuOption::parse_selection(&String::from_utf8_lossy(&line)) {
                Some(option) => return Ok(option.decision(self.forced_exit_code)),
                None => writeln!(self.output, "invalid selection")?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Read;
    use std::sync::Arc;

    use super::*;
    use crate::adapters::scripted::ScriptedEditor;
    use crate::config::NestedPolicy;
    use crate::intercept::ScriptTask;
    use crate::shell::{parse, ExecContext, ExecHook, RunnerConfig};

    struct Unreachable;

    impl ExecHook for Unreachable {
        fn exec(&self, _ctx: &ExecContext, args: &[String]) -> ExitStatus {
            panic!("real execution of {args:?}");
        }
    }

    /// Serves chunks in order; an empty chunk reads as end-of-input once.
    struct Chunks {
        chunks: VecDeque<&'static [u8]>,
        pos: usize,
    }

    impl Chunks {
        fn new(chunks: &[&'static str]) -> Self {
            Self { chunks: chunks.iter().map(|c| c.as_bytes()).collect(), pos: 0 }
        }

        fn bytes(chunks: &[&'static [u8]]) -> Self {
            Self { chunks: chunks.iter().copied().collect(), pos: 0 }
        }
    }

    impl Read for Chunks {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let available = self.fill_buf()?;
            let n = available.len().min(buf.len());
            buf[..n].copy_from_slice(&available[..n]);
            self.consume(n);
            Ok(n)
        }
    }

    impl BufRead for Chunks {
        fn fill_buf(&mut self) -> io::Result<&[u8]> {
            loop {
                let Some(&chunk) = self.chunks.front() else {
                    return Ok(&[]);
                };
                if chunk.is_empty() {
                    self.chunks.pop_front();
                    return Ok(&[]);
                }
                if self.pos < chunk.len() {
                    return Ok(&chunk[self.pos..]);
                }
                self.chunks.pop_front();
                self.pos = 0;
            }
        }

        fn consume(&mut self, amount: usize) {
            self.pos += amount;
        }
    }

    fn source(input: Chunks, editor: Arc<ScriptedEditor>) -> InteractiveSource<Chunks, Vec<u8>> {
        let resume = ResumeExecutor::new(Arc::new(Unreachable), NestedPolicy::FallThrough);
        InteractiveSource::new(input, Vec::new(), resume, MockAuthor::new(editor), ExitStatus::new(6))
            .with_eof_backoff(Duration::ZERO)
    }

    fn run(script: &str, input: Chunks, editor: Arc<ScriptedEditor>) -> (ExitStatus, String) {
        let program = parse(script, "t.sh").unwrap();
        let mut session = ScriptTask::spawn(program, RunnerConfig::new(std::env::temp_dir()), None).unwrap();
        let mut source = source(input, editor);
        source.run(&mut session.calls).unwrap();
        let status = session.outcome.blocking_recv().unwrap().exit_status();
        (status, String::from_utf8(source.output).unwrap())
    }

    #[test]
    fn invalid_selections_reprompt_without_consuming_the_call() {
        let (status, output) = run("deploy prod", Chunks::new(&["x\n9\n3\n"]), Arc::new(ScriptedEditor::default()));
        assert_eq!(status, ExitStatus::new(6));
        assert_eq!(output.matches("invalid selection").count(), 2);
        assert_eq!(output.matches("$ deploy prod").count(), 3);
    }

    #[test]
    fn undecodable_input_is_an_invalid_selection() {
        let (status, output) = run("deploy", Chunks::bytes(&[&b"\xff\xfe\n3\n"[..]]), Arc::new(ScriptedEditor::default()));
        assert_eq!(status, ExitStatus::new(6));
        assert_eq!(output.matches("invalid selection").count(), 1);
    }

    #[test]
    fn panicking_author_fails_its_call_without_stopping_the_source() {
        struct Panicking;
        impl crate::ports::TextEditor for Panicking {
            fn edit(&self, _seed: &str) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
                panic!("editor crashed");
            }
        }
        let program = parse("build; exit $?", "t.sh").unwrap();
        let mut session = ScriptTask::spawn(program, RunnerConfig::new(std::env::temp_dir()), None).unwrap();
        let resume = ResumeExecutor::new(Arc::new(Unreachable), NestedPolicy::FallThrough);
        let mut source =
            InteractiveSource::new(Chunks::new(&["2\n"]), Vec::new(), resume, MockAuthor::new(Arc::new(Panicking)), ExitStatus::new(6));
        assert!(source.run(&mut session.calls).is_ok());
        assert_eq!(session.outcome.blocking_recv().unwrap().exit_status(), ExitStatus::FAILURE);
    }

    #[test]
    fn end_of_input_keeps_prompting() {
        let (status, output) = run("deploy", Chunks::new(&["", "", "3\n"]), Arc::new(ScriptedEditor::default()));
        assert_eq!(status, ExitStatus::new(6));
        assert_eq!(output.matches("$ deploy").count(), 3);
        assert!(!output.contains("invalid selection"));
    }

    #[test]
    fn mock_selection_authors_and_runs_the_mock() {
        let editor = Arc::new(ScriptedEditor::new(["exit 11\n"]));
        let (status, _) = run("build --fast; exit $?", Chunks::new(&["2\n"]), Arc::clone(&editor));
        assert_eq!(status, ExitStatus::new(11));
        assert_eq!(editor.seeds(), vec!["# build --fast\n\n\n".to_string()]);
    }
}
