//! Working-tree safety gate
//!
//! Destructive operations (hard reset, forced checkout) ask the gate first. The
//! gate only reports; collecting the user's answer is up to the caller.

use std::path::Path;

use tracing::{debug, warn};

use super::runner::CommandRunner;

/// One `git status --porcelain` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    pub status_code: String,
    pub path: String,
}

/// Whether a destructive step may run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafetyDecision {
    pub has_uncommitted_changes: bool,
    pub changed_files: Vec<ChangedFile>,
    pub user_approved: bool,
}

impl SafetyDecision {
    pub fn approve(&mut self, approved: bool) {
        self.user_approved = approved;
    }

    pub fn may_proceed(&self) -> bool {
        !self.has_uncommitted_changes || self.user_approved
    }
}

/// Which files count as changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusScope {
    /// `git status --porcelain`
    Default,
    /// `git status --porcelain -u`, used before a forced checkout
    IncludeUntracked,
}

pub struct SafetyGate<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> SafetyGate<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Inspect the working tree. A status query that cannot run counts as
    /// uncommitted changes so the caller must still ask for approval.
    pub fn check(&self, working_dir: &Path, scope: StatusScope) -> SafetyDecision {
        let args: &[&str] = match scope {
            StatusScope::Default => &["status", "--porcelain"],
            StatusScope::IncludeUntracked => &["status", "--porcelain", "-u"],
        };

        match self.runner.git(args, working_dir) {
            Ok(outcome) if outcome.succeeded => {
                let changed_files = parse_porcelain(&outcome.stdout);
                debug!(changed = changed_files.len(), "Working tree inspected");
                SafetyDecision {
                    has_uncommitted_changes: !outcome.stdout.trim().is_empty(),
                    changed_files,
                    user_approved: false,
                }
            }
            Ok(outcome) => {
                warn!(stderr = %outcome.stderr, "Status query failed, treating tree as dirty");
                dirty_unknown()
            }
            Err(e) => {
                warn!(error = %e, "Status query failed, treating tree as dirty");
                dirty_unknown()
            }
        }
    }
}

fn dirty_unknown() -> SafetyDecision {
    SafetyDecision {
        has_uncommitted_changes: true,
        changed_files: Vec::new(),
        user_approved: false,
    }
}

/// Parse porcelain v1 rows: two status characters, a space, then the path.
///
/// Rows too short to carry a path are skipped.
pub fn parse_porcelain(output: &str) -> Vec<ChangedFile> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let code = line.get(..2)?;
            let path = line.get(3..).filter(|p| !p.is_empty())?;
            Some(ChangedFile {
                status_code: code.to_string(),
                path: path.to_string(),
            })
        })
        .collect()
}
