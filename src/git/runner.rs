//! Process execution boundary
//!
//! Every git invocation goes through [`CommandRunner`]. The system implementation
//! spawns the binary, waits for it and captures both streams; nothing here retries
//! or turns a non-zero exit into a panic.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

/// Name of the VCS binary, resolved through `PATH`.
pub const VCS_BINARY: &str = "git";

/// Fallback text when a failing command wrote nothing to stderr.
pub const UNKNOWN_ERROR: &str = "unknown error";

/// Captured result of a single external invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    pub succeeded: bool,
    /// Trailing whitespace and leading blank lines removed. Leading spaces of the
    /// first line are kept because porcelain formats use them as status columns.
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutcome {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(stderr: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Error text for reporting, `None` if the command failed silently.
    pub fn error_text(&self) -> Option<&str> {
        let text = self.stderr.trim();
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("Empty command line")]
    EmptyCommand,
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Executes an external program in a working directory.
pub trait CommandRunner {
    /// Run `argv[0]` with the remaining arguments inside `working_dir`.
    fn run(&self, argv: &[&str], working_dir: &Path) -> Result<CommandOutcome, RunnerError>;

    /// Run the VCS binary with `args`.
    fn git(&self, args: &[&str], working_dir: &Path) -> Result<CommandOutcome, RunnerError> {
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(VCS_BINARY);
        argv.extend_from_slice(args);
        self.run(&argv, working_dir)
    }
}

/// Runner backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[&str], working_dir: &Path) -> Result<CommandOutcome, RunnerError> {
        ensure_directory(working_dir)?;
        let (program, args) = argv.split_first().ok_or(RunnerError::EmptyCommand)?;

        debug!(command = %argv.join(" "), dir = %working_dir.display(), "Running command");

        let output = Command::new(program)
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| RunnerError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let outcome = decode_output(output.status.success(), &output.stdout, &output.stderr);
        if !outcome.succeeded {
            debug!(command = %argv.join(" "), stderr = %outcome.stderr, "Command failed");
        }
        Ok(outcome)
    }
}

/// Fails with `DirectoryNotFound` unless `dir` exists and is a directory.
pub fn ensure_directory(dir: &Path) -> Result<(), RunnerError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(RunnerError::DirectoryNotFound(dir.to_path_buf()))
    }
}

/// Decode captured streams; undecodable output turns the outcome into a failure.
pub(crate) fn decode_output(succeeded: bool, stdout: &[u8], stderr: &[u8]) -> CommandOutcome {
    match (std::str::from_utf8(stdout), std::str::from_utf8(stderr)) {
        (Ok(out), Ok(err)) => CommandOutcome {
            succeeded,
            stdout: tidy(out),
            stderr: err.trim().to_string(),
        },
        _ => CommandOutcome {
            succeeded: false,
            stdout: tidy(&String::from_utf8_lossy(stdout)),
            stderr: "Command output is not valid UTF-8".to_string(),
        },
    }
}

fn tidy(text: &str) -> String {
    text.trim_start_matches(['\n', '\r']).trim_end().to_string()
}
