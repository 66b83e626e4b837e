// Ops module - multi-step branch operations driven from the shell
//
// Every operation follows the same shape:
// - resolve the active profile and validate its working directory
// - clear destructive intents through the safety gate
// - run git steps in order, halting on the first failure without rollback
// - reinstall dependencies when the tree was rewritten and a manifest exists
//
// Submodules:
// - create: new branch from the default branch
// - delete: local and upstream branch removal
// - reset: hard/soft reset and rebase
// - switch: checkout with forced recovery
// - inspect: log, status and manifest scripts
// - settings: prefix, directory, remote, locale, profiles, histories

mod create;
mod delete;
mod inspect;
mod reset;
mod settings;
mod switch;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::console::Console;
use crate::git::{
    BranchCatalog, CommandRunner, QueryError, RunnerError, SafetyDecision, SafetyGate, StatusScope,
    UNKNOWN_ERROR,
};
use crate::manifest::{self, ManifestError};
use crate::profile::{ProfileError, ProfileStore};
use crate::render;

pub use reset::{ResetTarget, UNSTABLE_BRANCH};
pub use settings::SUPPORTED_LOCALES;

#[derive(Error, Debug)]
pub enum OpError {
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error("Directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("Not a git repository: {}", .0.display())]
    NotAVersionControlledDirectory(PathBuf),
    #[error("Step {step} of {total} failed (`{command}`): {message}")]
    CommandFailed {
        step: usize,
        total: usize,
        command: String,
        message: String,
    },
    #[error("No branches found")]
    NoBranches,
    #[error("Expected to be on {expected}, but the current branch is {actual}")]
    BranchNotSwitched { expected: String, actual: String },
    #[error("Cannot delete the current branch: {0}")]
    CannotDeleteCurrent(String),
    #[error(transparent)]
    Runner(#[from] RunnerError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

impl OpError {
    /// Steps that completed before the failing one; their effects are kept.
    pub fn completed_steps(&self) -> Option<usize> {
        match self {
            OpError::CommandFailed { step, .. } => Some(step - 1),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpOutcome {
    Done,
    Cancelled,
}

/// Snapshot of the active profile's fields an operation works with.
#[derive(Debug, Clone)]
pub(crate) struct Workspace {
    pub dir: PathBuf,
    pub remote: String,
    pub prefix: String,
}

impl Workspace {
    pub fn catalog<'w>(&'w self, runner: &'w dyn CommandRunner) -> BranchCatalog<'w> {
        BranchCatalog::new(runner, &self.dir, &self.remote)
    }
}

/// Everything an operation needs: the runner, the console and the profile store.
pub struct OpContext<'a> {
    runner: &'a dyn CommandRunner,
    console: &'a mut dyn Console,
    store: &'a mut ProfileStore,
    package_manager: &'a str,
}

impl<'a> OpContext<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        console: &'a mut dyn Console,
        store: &'a mut ProfileStore,
    ) -> Self {
        Self {
            runner,
            console,
            store,
            package_manager: manifest::package_manager(),
        }
    }

    /// Install dependencies with `program` instead of the platform's npm.
    pub fn with_package_manager(mut self, program: &'a str) -> Self {
        self.package_manager = program;
        self
    }

    /// Active profile with its working directory validated.
    pub(crate) fn workspace(&self) -> Result<Workspace, OpError> {
        let profile = self.store.active()?;
        let dir = profile.working_directory.clone();
        check_repository(&dir)?;
        Ok(Workspace {
            dir,
            remote: profile.remote_name.clone(),
            prefix: profile.branch_prefix.clone(),
        })
    }

    /// Run the safety gate and ask for approval when the tree has changes.
    pub(crate) fn clear_destructive(&mut self, dir: &Path, scope: StatusScope) -> bool {
        let mut decision = SafetyGate::new(self.runner).check(dir, scope);
        if decision.has_uncommitted_changes {
            self.list_changes(&decision);
            let approved = self.console.confirm("These changes will be lost. Continue?");
            decision.approve(approved);
        }
        let proceed = decision.may_proceed();
        if !proceed {
            info!(dir = %dir.display(), "Destructive operation declined");
        }
        proceed
    }

    /// Like `clear_destructive`, but asks `question` even when the tree is clean.
    pub(crate) fn confirm_destructive(
        &mut self,
        dir: &Path,
        scope: StatusScope,
        question: &str,
    ) -> bool {
        let mut decision = SafetyGate::new(self.runner).check(dir, scope);
        if decision.has_uncommitted_changes {
            self.list_changes(&decision);
        }
        decision.approve(self.console.confirm(question));
        if !decision.user_approved {
            info!(dir = %dir.display(), "Destructive operation declined");
        }
        decision.user_approved
    }

    fn list_changes(&mut self, decision: &SafetyDecision) {
        if decision.changed_files.is_empty() {
            self.console
                .error("Could not read the working tree state, assuming local changes");
            return;
        }
        self.console.info("Uncommitted changes (they will be lost):");
        for row in render::changed_file_rows(&decision.changed_files) {
            self.console.info(&row);
        }
    }

    /// Reinstall dependencies when the working directory has a manifest.
    /// Install failures are reported but do not fail the operation.
    pub(crate) fn install_dependencies(&mut self, dir: &Path) {
        if !manifest::has_manifest(dir) {
            return;
        }
        self.console.info("Installing dependencies...");
        let program = self.package_manager;
        let label = format!("{} install", program);
        let console = &mut *self.console;
        let result =
            manifest::run_install(program, dir, |elapsed| console.progress(&label, elapsed));
        match result {
            Ok(report) if report.succeeded => self.console.success("Dependencies installed"),
            Ok(report) => {
                let code = report
                    .exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                self.console
                    .error(&format!("Dependency install failed (exit {}): {}", code, report.stderr));
            }
            Err(e) => self.console.error(&e.to_string()),
        }
    }

    /// Trimmed answer; `None` on empty input or end of input.
    pub(crate) fn ask(&mut self, prompt: &str) -> Option<String> {
        let answer = self.console.read_line(prompt)?;
        let answer = answer.trim();
        (!answer.is_empty()).then(|| answer.to_string())
    }

    /// Re-prompt until `valid` accepts the answer; empty input cancels.
    pub(crate) fn ask_valid(
        &mut self,
        prompt: &str,
        valid: fn(&str) -> bool,
        hint: &str,
    ) -> Option<String> {
        loop {
            let answer = self.ask(prompt)?;
            if valid(&answer) {
                return Some(answer);
            }
            self.console.error(hint);
        }
    }

    /// 1-based selection among `len` rows; `q`, empty input or end of input cancels.
    pub(crate) fn select(&mut self, prompt: &str, len: usize) -> Option<usize> {
        loop {
            let answer = self.ask(prompt)?;
            if answer.eq_ignore_ascii_case("q") {
                return None;
            }
            match parse_index(&answer, len) {
                Some(index) => return Some(index),
                None => self
                    .console
                    .error(&format!("Enter a number between 1 and {}", len)),
            }
        }
    }

    pub(crate) fn show(&mut self, rows: Vec<String>) {
        for row in rows {
            self.console.info(&row);
        }
    }

    /// Fail with `BranchNotSwitched` unless HEAD is on `expected`.
    pub(crate) fn verify_current(&self, ws: &Workspace, expected: &str) -> Result<(), OpError> {
        match ws.catalog(self.runner).current_branch() {
            Some(current) if current == expected => Ok(()),
            other => Err(OpError::BranchNotSwitched {
                expected: expected.to_string(),
                actual: other.unwrap_or_else(|| "(detached HEAD)".to_string()),
            }),
        }
    }
}

/// Missing directory and missing `.git` are reported before any git call.
pub(crate) fn check_repository(dir: &Path) -> Result<(), OpError> {
    if !dir.is_dir() {
        return Err(OpError::DirectoryNotFound(dir.to_path_buf()));
    }
    if !dir.join(".git").exists() {
        return Err(OpError::NotAVersionControlledDirectory(dir.to_path_buf()));
    }
    Ok(())
}

pub(crate) fn step(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}

/// Run git steps in order and stop at the first failure.
///
/// Nothing is undone: on `CommandFailed` the repository is in the state the
/// last successful step left it in.
pub(crate) fn run_steps(
    runner: &dyn CommandRunner,
    dir: &Path,
    steps: &[Vec<String>],
) -> Result<(), OpError> {
    let total = steps.len();
    for (index, args) in steps.iter().enumerate() {
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        let command = format!("git {}", args.join(" "));
        info!(step = index + 1, total, command = %command, "Running step");

        let outcome = runner.git(&argv, dir)?;
        if !outcome.succeeded {
            let message = outcome.error_text().unwrap_or(UNKNOWN_ERROR).to_string();
            warn!(step = index + 1, command = %command, error = %message, "Step failed");
            return Err(OpError::CommandFailed {
                step: index + 1,
                total,
                command,
                message,
            });
        }
    }
    Ok(())
}

fn parse_index(answer: &str, len: usize) -> Option<usize> {
    answer
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=len).contains(n))
        .map(|n| n - 1)
}
