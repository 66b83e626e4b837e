use tracing::info;

use super::{run_steps, step, OpContext, OpError, OpOutcome};
use crate::render;

impl OpContext<'_> {
    /// Delete a local branch picked from the catalog, then optionally its upstream.
    pub fn delete_branch(&mut self) -> Result<OpOutcome, OpError> {
        let ws = self.workspace()?;
        let catalog = ws.catalog(self.runner);

        let branches = catalog.list();
        if branches.is_empty() {
            return Err(OpError::NoBranches);
        }
        let current = catalog.current_branch();
        self.show(render::branch_rows(&branches, current.as_deref()));

        let Some(index) = self.select("Branch to delete (number, q to cancel): ", branches.len())
        else {
            return Ok(OpOutcome::Cancelled);
        };
        let branch = &branches[index];
        if current.as_deref() == Some(branch.local_name.as_str()) {
            return Err(OpError::CannotDeleteCurrent(branch.local_name.clone()));
        }

        if !self
            .console
            .confirm(&format!("Delete local branch {}?", branch.local_name))
        {
            return Ok(OpOutcome::Cancelled);
        }
        run_steps(self.runner, &ws.dir, &[step(&["branch", "-D", &branch.local_name])])?;
        info!(branch = %branch.local_name, "Local branch deleted");
        self.console
            .success(&format!("Deleted local branch {}", branch.local_name));

        if branch.has_upstream() {
            // The upstream may live on another remote than the profile's.
            let remote = branch.upstream_remote.as_str();
            if self.console.confirm(&format!(
                "Also delete {}/{} on the remote?",
                remote, branch.remote_name
            )) {
                run_steps(
                    self.runner,
                    &ws.dir,
                    &[step(&["push", remote, "--delete", &branch.remote_name])],
                )?;
                info!(branch = %branch.remote_name, remote, "Remote branch deleted");
                self.console
                    .success(&format!("Deleted {}/{}", remote, branch.remote_name));
            }
        }
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
        ScriptedRunner::new()
            .ok(
                &key,
                "main|1 hour ago|3000|origin/main|alice|origin\n\
                 topic|2 days ago|2000|origin/topic|bob|origin\n\
                 local|3 days ago|1000||carol|",
            )
            .ok("git branch --show-current", "main")
    }

    #[test]
    fn test_delete_local_and_upstream() {
        let temp = TempDir::new().unwrap();
        let mut store = repo_store(&temp);
        let runner = listing();
        let mut console = ScriptedConsole::new(["2", "y", "y"]);

        let outcome = OpContext::new(&runner, &mut console, &mut store)
            .delete_branch()
            .unwrap();
        assert_eq!(outcome, OpOutcome::Done);
        assert_eq!(
            runner.mutating_calls(),
            ["git branch -D topic", "git push origin --delete topic"]
        );
    }

    #[test]
    fn test_upstream_on_another_remote_is_deleted_there() {
        let temp = TempDir::new().unwrap();
        let mut store = repo_store(&temp);
        let key = format!("git for-each-ref {} refs/heads/", REF_LISTING_FORMAT);
        let runner = ScriptedRunner::new()
            .ok(
                &key,
                "main|1 hour ago|3000|origin/main|alice|origin\n\
                 topic|2 days ago|2000|fork/topic|bob|fork",
            )
            .ok("git branch --show-current", "main");
        let mut console = ScriptedConsole::new(["2", "y", "y"]);

        OpContext::new(&runner, &mut console, &mut store)
            .delete_branch()
            .unwrap();
        assert_eq!(
            runner.mutating_calls(),
            ["git branch -D topic", "git push fork --delete topic"]
        );
        assert!(console
            .lines(Channel::Prompt)
            .iter()
            .any(|l| l.contains("Also delete fork/topic")));
    }

    #[test]
    fn test_branch_without_upstream_skips_remote_question() {
        let temp = TempDir::new().unwrap();
        let mut store = repo_store(&temp);
        let runner = listing();
        let mut console = ScriptedConsole::new(["3", "y"]);

        OpContext::new(&runner, &mut console, &mut store)
            .delete_branch()
            .unwrap();
        assert_eq!(runner.mutating_calls(), ["git branch -D local"]);
        assert_eq!(console.remaining_answers(), 0);
    }

    #[test]
    fn test_current_branch_is_refused() {
        let temp = TempDir::new().unwrap();
        let mut store = repo_store(&temp);
        let runner = listing();
        let mut console = ScriptedConsole::new(["1"]);

        let err = OpContext::new(&runner, &mut console, &mut store)
            .delete_branch()
            .unwrap_err();
        assert!(matches!(err, OpError::CannotDeleteCurrent(name) if name == "main"));
        assert!(runner.mutating_calls().is_empty());
    }

    #[test]
    fn test_declined_or_cancelled() {
        let temp = TempDir::new().unwrap();
        let mut store = repo_store(&temp);
        let runner = listing();
        let mut console = ScriptedConsole::new(["2", "n", "q"]);

        let mut ctx = OpContext::new(&runner, &mut console, &mut store);
        assert_eq!(ctx.delete_branch().unwrap(), OpOutcome::Cancelled);
        assert_eq!(ctx.delete_branch().unwrap(), OpOutcome::Cancelled);
        assert!(runner.mutating_calls().is_empty());
    }

    #[test]
    fn test_empty_catalog() {
        let temp = TempDir::new().unwrap();
        let mut store = repo_store(&temp);
        let runner = ScriptedRunner::new();
        let mut console = ScriptedConsole::new(Vec::<String>::new());

        let err = OpContext::new(&runner, &mut console, &mut store)
            .delete_branch()
            .unwrap_err();
        assert!(matches!(err, OpError::NoBranches));
    }
}
