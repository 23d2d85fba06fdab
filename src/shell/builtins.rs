//! Commands the engine runs itself instead of handing to the exec hook.

use super::interp::{Exit, Flow, Runner};
use super::io::StdStreams;
use super::parser::is_name;
use super::status::ExitStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Builtin {
    Colon,
    True,
    False,
    Echo,
    Exit,
    Cd,
    Pwd,
    Export,
    Unset,
    Set,
    Shift,
}

impl Builtin {
    pub(super) fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            ":" => Self::Colon,
            "true" => Self::True,
            "false" => Self::False,
            "echo" => Self::Echo,
            "exit" => Self::Exit,
            "cd" => Self::Cd,
            "pwd" => Self::Pwd,
            "export" => Self::Export,
            "unset" => Self::Unset,
            "set" => Self::Set,
            "shift" => Self::Shift,
            _ => return None,
        })
    }

    pub(super) fn run(self, runner: &mut Runner, args: &[String], streams: &StdStreams) -> Flow {
        let status = match self {
            Self::Colon | Self::True => ExitStatus::SUCCESS,
            Self::False => ExitStatus::FAILURE,
            Self::Echo => echo(args, streams),
            Self::Exit => return Err(Exit(exit_status(runner, args, streams))),
            Self::Cd => cd(runner, args, streams),
            Self::Pwd => write(streams, &format!("{}\n", runner.dir.display())),
            Self::Export => {
                for arg in args {
                    match arg.split_once('=') {
                        Some((name, value)) if is_name(name) => {
                            runner.set_var(name.to_string(), value.to_string());
                            mark_exported(runner, name);
                        }
                        None if is_name(arg) => mark_exported(runner, arg),
                        _ => {
                            streams.stderr.diagnostic(&format!("export: {arg}: not a valid identifier"));
                            return Ok(ExitStatus::FAILURE);
                        }
                    }
                }
                ExitStatus::SUCCESS
            }
            Self::Unset => {
                for arg in args {
                    runner.vars.remove(arg);
                }
                ExitStatus::SUCCESS
            }
            Self::Set => match runner.apply_set(args) {
                Ok(()) => ExitStatus::SUCCESS,
                Err(message) => {
                    streams.stderr.diagnostic(&message);
                    ExitStatus::new(2)
                }
            },
            Self::Shift => shift(runner, args, streams),
        };
        Ok(status)
    }
}

fn write(streams: &StdStreams, text: &str) -> ExitStatus {
    match streams.stdout.write_all(text.as_bytes()) {
        Ok(()) => ExitStatus::SUCCESS,
        Err(_) => ExitStatus::FAILURE,
    }
}

fn echo(args: &[String], streams: &StdStreams) -> ExitStatus {
    let (newline, words) = match args.first() {
        Some(flag) if flag == "-n" => (false, &args[1..]),
        _ => (true, args),
    };
    let mut text = words.join(" ");
    if newline {
        text.push('\n');
    }
    write(streams, &text)
}

fn exit_status(runner: &Runner, args: &[String], streams: &StdStreams) -> ExitStatus {
    let Some(arg) = args.first() else {
        return runner.status;
    };
    match arg.parse::<i32>() {
        Ok(code) => ExitStatus::from_process_code(code),
        Err(_) => {
            streams.stderr.diagnostic(&format!("exit: invalid exit status {arg:?}"));
            ExitStatus::new(2)
        }
    }
}

fn cd(runner: &mut Runner, args: &[String], streams: &StdStreams) -> ExitStatus {
    let target = match args.first() {
        Some(target) => target.clone(),
        None => match runner.var("HOME") {
            Some(home) => home.to_string(),
            None => {
                streams.stderr.diagnostic("cd: HOME not set");
                return ExitStatus::FAILURE;
            }
        },
    };
    let path = runner.resolve(&target);
    if !path.is_dir() {
        streams.stderr.diagnostic(&format!("cd: {target}: No such file or directory"));
        return ExitStatus::FAILURE;
    }
    runner.dir = path.canonicalize().unwrap_or(path);
    let pwd = runner.dir.display().to_string();
    runner.set_var("PWD".to_string(), pwd);
    ExitStatus::SUCCESS
}

fn shift(runner: &mut Runner, args: &[String], streams: &StdStreams) -> ExitStatus {
    let count = match args.first().map(|arg| arg.parse::<usize>()) {
        None => 1,
        Some(Ok(count)) => count,
        Some(Err(_)) => {
            streams.stderr.diagnostic("shift: numeric argument required");
            return ExitStatus::new(2);
        }
    };
    if count > runner.params.len() {
        streams.stderr.diagnostic("shift: can't shift that many");
        return ExitStatus::FAILURE;
    }
    runner.params.drain(..count);
    ExitStatus::SUCCESS
}

fn mark_exported(runner: &mut Runner, name: &str) {
    runner
        .vars
        .entry(name.to_string())
        .or_insert(super::interp::Variable { value: None, exported: true })
        .exported = true;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::shell::interp::{ExecContext, ExecHook, RunnerConfig};
    use crate::shell::{parse, ExitStatus, Runner, StdStreams};

    struct Noop;

    impl ExecHook for Noop {
        fn exec(&self, _ctx: &ExecContext, _args: &[String]) -> ExitStatus {
            ExitStatus::SUCCESS
        }
    }

    fn output_of(source: &str) -> String {
        let (streams, stdout, _) = StdStreams::captured();
        let config = RunnerConfig::new(std::env::temp_dir()).with_streams(streams);
        let mut runner = Runner::new(config, Arc::new(Noop)).unwrap();
        let _ = runner.run(&parse(source, "t.sh").unwrap());
        stdout.contents()
    }

    #[test]
    fn echo_joins_arguments_and_honours_dash_n() {
        assert_eq!(output_of("echo a  b; echo -n c"), "a b\nc");
    }

    #[test]
    fn set_and_shift_manage_positional_parameters() {
        assert_eq!(output_of("set -- x y z; shift; echo $# $1; shift 2; echo $#"), "2 y\n0\n");
    }

    #[test]
    fn shift_past_the_end_fails() {
        assert_eq!(output_of("set -- a; shift 3 || echo failed"), "failed\n");
    }

    #[test]
    fn export_makes_variables_visible_to_commands() {
        struct Env(std::sync::Mutex<String>);
        impl ExecHook for Env {
            fn exec(&self, ctx: &ExecContext, _args: &[String]) -> ExitStatus {
                *self.0.lock().unwrap() = ctx.env.get("TOKEN").cloned().unwrap_or_default();
                ExitStatus::SUCCESS
            }
        }
        let hook = Arc::new(Env(std::sync::Mutex::new(String::new())));
        let mut runner =
            Runner::new(RunnerConfig::new(std::env::temp_dir()), Arc::clone(&hook) as Arc<dyn ExecHook>)
                .unwrap();
        runner.run(&parse("export TOKEN; TOKEN=abc; env-check", "t.sh").unwrap()).unwrap();
        assert_eq!(*hook.0.lock().unwrap(), "abc");
    }

    #[test]
    fn exit_without_argument_uses_last_status() {
        let mut runner = Runner::new(RunnerConfig::new(std::env::temp_dir()), Arc::new(Noop)).unwrap();
        let result = runner.run(&parse("false; exit", "t.sh").unwrap());
        assert_eq!(result.unwrap_err().exit_status(), ExitStatus::FAILURE);
    }

    #[test]
    fn cd_changes_directory_for_later_commands() {
        let dir = std::env::temp_dir().join("mockscript_builtin_cd/inner");
        std::fs::create_dir_all(&dir).unwrap();
        let mut runner = Runner::new(
            RunnerConfig::new(std::env::temp_dir().join("mockscript_builtin_cd")),
            Arc::new(Noop),
        )
        .unwrap();
        runner.run(&parse("cd inner", "t.sh").unwrap()).unwrap();
        assert!(runner.dir().ends_with("inner"));
        let _ = std::fs::remove_dir_all(std::env::temp_dir().join("mockscript_builtin_cd"));
    }
}
