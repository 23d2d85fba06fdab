//! Integration tests for top-level CLI behavior.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use mockscript::shell::ExitStatus;
use mockscript::transcript::{Outcome, Transcript};

fn workdir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn run_mockscript(dir: &Path, args: &[&str], stdin: &str) -> Output {
    let bin = env!("CARGO_BIN_EXE_mockscript");
    let mut child = Command::new(bin)
        .args(args)
        .current_dir(dir)
        .env_remove("MOCKSCRIPT_CONFIG")
        .env("MOCKSCRIPT_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run mockscript binary");
    child.stdin.take().unwrap().write_all(stdin.as_bytes()).unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn missing_script_argument_shows_usage() {
    let dir = workdir("mockscript_cli_usage");
    let output = run_mockscript(&dir, &[], "");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("<SCRIPT>"));
}

#[test]
fn help_lists_the_options() {
    let dir = workdir("mockscript_cli_help");
    let output = run_mockscript(&dir, &["--help"], "");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("--remote"));
    assert!(stdout.contains("--transcript"));
}

#[test]
fn unparsable_script_is_fatal() {
    let dir = workdir("mockscript_cli_unparsable");
    std::fs::write(dir.join("bad.sh"), "echo ok\nif true; then echo\n").unwrap();
    let output = run_mockscript(&dir, &["bad.sh"], "");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("bad.sh:"), "{stderr}");
}

#[test]
fn exit_code_is_the_script_status() {
    let dir = workdir("mockscript_cli_status");
    std::fs::write(dir.join("run.sh"), "echo hello\nexit 3\n").unwrap();
    let output = run_mockscript(&dir, &["run.sh"], "");
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hello\n");
}

#[test]
fn forced_exit_from_the_menu_reaches_the_script() {
    let dir = workdir("mockscript_cli_forced");
    std::fs::write(dir.join("run.sh"), "deploy --prod || echo \"deploy failed with $?\"\n").unwrap();
    let output = run_mockscript(&dir, &["--forced-exit-code", "42", "run.sh"], "x\n3\n");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "deploy failed with 42\n");
    assert!(stderr.contains("$ deploy --prod"));
    assert!(stderr.contains("invalid selection"));
}

#[test]
fn transcript_records_each_call() {
    let dir = workdir("mockscript_cli_transcript");
    std::fs::write(dir.join("run.sh"), "first\nsecond arg\n").unwrap();
    let output = run_mockscript(&dir, &["--transcript", "run.yaml", "--forced-exit-code", "5", "run.sh"], "3\n3\n");
    assert_eq!(output.status.code(), Some(5));

    let content = std::fs::read_to_string(dir.join("run.yaml")).unwrap();
    let transcript: Transcript = serde_yaml::from_str(&content).unwrap();
    assert_eq!(transcript.name, "run.sh");
    assert_eq!(transcript.entries.len(), 2);
    assert_eq!(transcript.entries[1].args, vec!["second", "arg"]);
    assert_eq!(transcript.outcome, Some(Outcome::Failed { exit_code: ExitStatus::new(5) }));
    assert!(transcript.finished_at.is_some());
}

#[test]
fn config_file_in_working_directory_is_applied() {
    let dir = workdir("mockscript_cli_config");
    std::fs::write(dir.join(".mockscript.yaml"), "forced_exit_code: 9\n").unwrap();
    std::fs::write(dir.join("run.sh"), "check\n").unwrap();
    let output = run_mockscript(&dir, &["run.sh"], "3\n");
    assert_eq!(output.status.code(), Some(9));
}
