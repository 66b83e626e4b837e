//! Shell session integration tests
//!
//! Drives the shell with scripted answers against a real repository cloned from
//! a local bare remote. Skipped when `git` is not on PATH.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use branchdeck::console::{Channel, ScriptedConsole};
use branchdeck::git::{CommandRunner, SystemRunner};
use branchdeck::profile::ProfileStore;
use branchdeck::shell::{Shell, ShellState};
use tempfile::TempDir;

fn git_available() -> bool {
    if which::which("git").is_err() {
        eprintln!("git not found on PATH, skipping");
        return false;
    }
    true
}

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Bare remote with one commit on `main`, and a clone tracking it.
fn setup_repository(temp: &TempDir) -> PathBuf {
    let remote = temp.path().join("remote.git");
    let work = temp.path().join("work");
    fs::create_dir_all(&remote).unwrap();
    git(&remote, &["init", "--bare", "-q"]);
    git(&remote, &["symbolic-ref", "HEAD", "refs/heads/main"]);

    git(temp.path(), &["clone", "-q", "remote.git", "work"]);
    git(&work, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    fs::write(work.join("README.md"), "hello\n").unwrap();
    git(&work, &["add", "README.md"]);
    git(&work, &["commit", "-q", "-m", "Initial commit"]);
    git(&work, &["push", "-q", "-u", "origin", "main"]);
    git(&work, &["remote", "set-head", "origin", "main"]);
    work
}

fn shell_for(
    temp: &TempDir,
    work: &Path,
    answers: &[&str],
) -> Shell<SystemRunner, ScriptedConsole> {
    let store = ProfileStore::open(temp.path().join("config.json"), work).unwrap();
    Shell::new(
        SystemRunner,
        ScriptedConsole::new(answers.iter().copied()),
        store,
    )
}

#[test]
fn test_create_branch_end_to_end() {
    if !git_available() {
        return;
    }
    let temp = TempDir::new().unwrap();
    let work = setup_repository(&temp);
    let mut shell = shell_for(&temp, &work, &["42", "fix-login"]);

    assert_eq!(shell.execute_line("5"), ShellState::AwaitingCommand);
    assert!(
        shell.console().lines(Channel::Error).is_empty(),
        "errors: {:?}",
        shell.console().lines(Channel::Error)
    );

    assert_eq!(git(&work, &["branch", "--show-current"]), "dl/TTSH-42/fix-login");
    let remote_heads = git(&work, &["ls-remote", "--heads", "origin"]);
    assert!(remote_heads.contains("refs/heads/dl/TTSH-42/fix-login"));
    let upstream = git(&work, &["rev-parse", "--abbrev-ref", "@{upstream}"]);
    assert_eq!(upstream, "origin/dl/TTSH-42/fix-login");
}

#[test]
fn test_declined_hard_reset_keeps_changes() {
    if !git_available() {
        return;
    }
    let temp = TempDir::new().unwrap();
    let work = setup_repository(&temp);
    fs::write(work.join("README.md"), "local edit\n").unwrap();
    let mut shell = shell_for(&temp, &work, &["n"]);

    shell.execute_line("1");

    assert_eq!(
        fs::read_to_string(work.join("README.md")).unwrap(),
        "local edit\n"
    );
    let info = shell.console().lines(Channel::Info);
    assert!(info.iter().any(|l| l.contains("README.md")));
    assert_eq!(info.last(), Some(&"Cancelled"));
}

#[test]
fn test_log_and_status_views() {
    if !git_available() {
        return;
    }
    let temp = TempDir::new().unwrap();
    let work = setup_repository(&temp);
    let mut shell = shell_for(&temp, &work, &[]);

    shell.execute_line("8");
    shell.execute_line("s");

    let info = shell.console().lines(Channel::Info);
    assert!(info.iter().any(|l| l.contains("Initial commit")));
    assert!(info.iter().any(|l| l.starts_with("## main")));
}

#[test]
fn test_runner_reports_failures_as_outcomes() {
    if !git_available() {
        return;
    }
    let temp = TempDir::new().unwrap();
    let work = setup_repository(&temp);

    let outcome = SystemRunner
        .git(&["checkout", "no-such-branch"], &work)
        .unwrap();
    assert!(!outcome.succeeded);
    assert!(outcome.error_text().is_some());
}

#[test]
fn test_one_shot_command_exit_status() {
    let temp = TempDir::new().unwrap();
    let run = |workdir: &Path, key: &str| {
        Command::new(env!("CARGO_BIN_EXE_branchdeck"))
            .arg("--config")
            .arg(temp.path().join("config.json"))
            .arg("--workdir")
            .arg(workdir)
            .args(["--command", key])
            .output()
            .expect("failed to run branchdeck")
    };

    let output = run(&temp.path().join("missing"), "s");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Directory does not exist"));

    let output = run(&temp.path().join("missing"), "h");
    assert!(output.status.success());
}
