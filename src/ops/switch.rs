use tracing::{info, warn};

use super::{run_steps, step, OpContext, OpError, OpOutcome};
use crate::git::{StatusScope, UNKNOWN_ERROR};
use crate::render;

impl OpContext<'_> {
    /// Check out a branch from the catalog. When git refuses, list what a
    /// forced checkout would discard (untracked files included) and ask first.
    pub fn switch_branch(&mut self) -> Result<OpOutcome, OpError> {
        let ws = self.workspace()?;
        let catalog = ws.catalog(self.runner);

        let branches = catalog.list();
        if branches.is_empty() {
            return Err(OpError::NoBranches);
        }
        let current = catalog.current_branch();
        self.show(render::branch_rows(&branches, current.as_deref()));

        let Some(index) = self.select("Switch to (number, q to cancel): ", branches.len()) else {
            return Ok(OpOutcome::Cancelled);
        };
        let name = branches[index].local_name.clone();
        if current.as_deref() == Some(name.as_str()) {
            self.console.info(&format!("Already on {}", name));
            return Ok(OpOutcome::Done);
        }

        let outcome = self.runner.git(&["checkout", &name], &ws.dir)?;
        let switched = outcome.succeeded && catalog.current_branch().as_deref() == Some(name.as_str());
        if !switched {
            let reason = outcome.error_text().unwrap_or(UNKNOWN_ERROR);
            warn!(branch = %name, error = %reason, "Checkout failed");
            self.console.error(&format!("Could not switch to {}: {}", name, reason));

            let question = format!("Try a forced checkout of {}?", name);
            if !self.confirm_destructive(&ws.dir, StatusScope::IncludeUntracked, &question) {
                return Ok(OpOutcome::Cancelled);
            }
            run_steps(self.runner, &ws.dir, &[step(&["checkout", "-f", &name])])?;
            self.verify_current(&ws, &name)?;
            info!(branch = %name, "Forced checkout done");
        }

        self.console.success(&format!("Switched to {}", name));
        self.install_dependencies(&ws.dir);
        Ok(OpOutcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{Channel, ScriptedConsole};
    use crate::git::scripted::ScriptedRunner;
    use crate::git::REF_LISTING_FORMAT;
    use crate::ops::testing::repo_store;
    use tempfile::TempDir;

    fn listing() -> ScriptedRunner {
        let key = format!("git for-each-ref {} refs/heads/", REF_LISTING_FORMAT);
        ScriptedRunner::new().ok(
            &key,
            "main|1 hour ago|3000|origin/main|alice\ntopic|2 days ago|2000||bob",
        )
    }

    #[test]
    fn test_plain_switch() {
        let temp = TempDir::new().unwrap();
        let mut store = repo_store(&temp);
        let runner = listing()
            .ok("git branch --show-current", "main")
            .ok("git branch --show-current", "topic");
        let mut console = ScriptedConsole::new(["2"]);

        let outcome = OpContext::new(&runner, &mut console, &mut store)
            .switch_branch()
            .unwrap();
        assert_eq!(outcome, OpOutcome::Done);
        assert_eq!(runner.mutating_calls(), ["git checkout topic"]);
    }

    #[test]
    fn test_refused_checkout_falls_back_to_force() {
        let temp = TempDir::new().unwrap();
        let mut store = repo_store(&temp);
        let runner = listing()
            .ok("git branch --show-current", "main")
            .ok("git branch --show-current", "topic")
            .fail(
                "git checkout topic",
                "error: Your local changes would be overwritten",
            )
            .ok("git status --porcelain -u", " M src/app.rs");
        let mut console = ScriptedConsole::new(["2", "y"]);

        let outcome = OpContext::new(&runner, &mut console, &mut store)
            .switch_branch()
            .unwrap();
        assert_eq!(outcome, OpOutcome::Done);
        assert_eq!(
            runner.mutating_calls(),
            ["git checkout topic", "git checkout -f topic"]
        );
        assert!(console.lines(Channel::Error)[0].contains("would be overwritten"));
    }

    #[test]
    fn test_declined_force_leaves_tree_alone() {
        let temp = TempDir::new().unwrap();
        let mut store = repo_store(&temp);
        let runner = listing()
            .ok("git branch --show-current", "main")
            .fail("git checkout topic", "error: untracked files")
            .ok("git status --porcelain -u", "?? new.txt");
        let mut console = ScriptedConsole::new(["2", "n"]);

        let outcome = OpContext::new(&runner, &mut console, &mut store)
            .switch_branch()
            .unwrap();
        assert_eq!(outcome, OpOutcome::Cancelled);
        assert_eq!(runner.mutating_calls(), ["git checkout topic"]);
    }

    #[test]
    fn test_force_on_clean_tree_still_asks() {
        let temp = TempDir::new().unwrap();
        let mut store = repo_store(&temp);
        let runner = listing()
            .ok("git branch --show-current", "main")
            .fail("git checkout topic", "error: pathspec did not match")
            .ok("git status --porcelain -u", "");
        let mut console = ScriptedConsole::new(["2", "n"]);

        let outcome = OpContext::new(&runner, &mut console, &mut store)
            .switch_branch()
            .unwrap();
        assert_eq!(outcome, OpOutcome::Cancelled);
        assert_eq!(runner.mutating_calls(), ["git checkout topic"]);
        assert!(console
            .lines(Channel::Prompt)
            .iter()
            .any(|l| l.contains("Try a forced checkout of topic?")));
    }

    #[test]
    fn test_already_on_branch() {
        let temp = TempDir::new().unwrap();
        let mut store = repo_store(&temp);
        let runner = listing().ok("git branch --show-current", "main");
        let mut console = ScriptedConsole::new(["1"]);

        OpContext::new(&runner, &mut console, &mut store)
            .switch_branch()
            .unwrap();
        assert!(runner.mutating_calls().is_empty());
    }
}
