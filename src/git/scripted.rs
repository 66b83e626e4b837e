//! Scripted runner for unit tests: canned outcomes keyed by command line.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::Path;

use super::runner::{CommandOutcome, CommandRunner, RunnerError};

/// Replies with queued outcomes for exact command lines ("git fetch origin").
/// The last queued outcome for a command repeats; unknown commands succeed with
/// empty output. Every invocation is recorded.
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    replies: RefCell<HashMap<String, VecDeque<CommandOutcome>>>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(self, command: &str, outcome: CommandOutcome) -> Self {
        self.replies
            .borrow_mut()
            .entry(command.to_string())
            .or_default()
            .push_back(outcome);
        self
    }

    pub(crate) fn ok(self, command: &str, stdout: &str) -> Self {
        self.reply(command, CommandOutcome::success(stdout))
    }

    pub(crate) fn fail(self, command: &str, stderr: &str) -> Self {
        self.reply(command, CommandOutcome::failure(stderr))
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Calls other than read-only queries.
    pub(crate) fn mutating_calls(&self) -> Vec<String> {
        const QUERIES: [&str; 7] = [
            "git status",
            "git branch --show-current",
            "git branch -a",
            "git symbolic-ref",
            "git for-each-ref",
            "git show-ref",
            "git remote",
        ];
        self.calls()
            .into_iter()
            .filter(|c| !QUERIES.iter().any(|q| c.starts_with(q)))
            .collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, argv: &[&str], _working_dir: &Path) -> Result<CommandOutcome, RunnerError> {
        let key = argv.join(" ");
        self.calls.borrow_mut().push(key.clone());

        let mut replies = self.replies.borrow_mut();
        let outcome = match replies.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some(queue) => queue.front().cloned().unwrap_or_default(),
            None => CommandOutcome::success(""),
        };
        Ok(outcome)
    }
}
