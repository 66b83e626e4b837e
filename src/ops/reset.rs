//! Hard reset to a remote branch, soft reset and rebase onto the default branch

use tracing::info;

use super::{run_steps, step, OpContext, OpError, OpOutcome};
use crate::git::StatusScope;

/// Secondary integration branch reset by key `2`.
pub const UNSTABLE_BRANCH: &str = "unstable";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetTarget {
    DefaultBranch,
    Unstable,
}

impl OpContext<'_> {
    /// Discard local work and move onto `<remote>/<target>`.
    ///
    /// The safety gate runs before anything else, so a declined gate leaves the
    /// status query as the only git call.
    pub fn hard_reset(&mut self, target: ResetTarget) -> Result<OpOutcome, OpError> {
        let ws = self.workspace()?;
        if !self.clear_destructive(&ws.dir, StatusScope::Default) {
            return Ok(OpOutcome::Cancelled);
        }

        let catalog = ws.catalog(self.runner);
        let branch = match target {
            ResetTarget::DefaultBranch => catalog.default_branch_name(),
            ResetTarget::Unstable => UNSTABLE_BRANCH.to_string(),
        };
        let upstream = format!("{}/{}", ws.remote, branch);
        if !self.console.confirm(&format!(
            "Hard reset {} to {}? Local commits will be lost",
            branch, upstream
        )) {
            return Ok(OpOutcome::Cancelled);
        }

        let mut steps = vec![step(&["fetch", &ws.remote])];
        if catalog.current_branch().as_deref() != Some(branch.as_str()) {
            steps.push(step(&["checkout", "-f", &branch]));
        }
        steps.push(step(&["reset", "--hard", &upstream]));
        run_steps(self.runner, &ws.dir, &steps)?;

        info!(branch = %branch, upstream = %upstream, "Hard reset done");
        self.console.success(&format!("{} now matches {}", branch, upstream));
        self.install_dependencies(&ws.dir);
        Ok(OpOutcome::Done)
    }

    /// `git reset --soft <default>`; working tree and index are kept.
    pub fn soft_reset(&mut self) -> Result<OpOutcome, OpError> {
        let ws = self.workspace()?;
        let default = ws.catalog(self.runner).default_branch_name();
        if !self
            .console
            .confirm(&format!("Soft reset the current branch to {}?", default))
        {
            return Ok(OpOutcome::Cancelled);
        }
        run_steps(self.runner, &ws.dir, &[step(&["reset", "--soft", &default])])?;
        self.console
            .success(&format!("Soft reset to {}; changes are staged", default));
        Ok(OpOutcome::Done)
    }

    /// `git rebase <default>`. A failed rebase is reported and left to the user.
    pub fn rebase(&mut self) -> Result<OpOutcome, OpError> {
        let ws = self.workspace()?;
        let default = ws.catalog(self.runner).default_branch_name();
        if !self
            .console
            .confirm(&format!("Rebase the current branch onto {}?", default))
        {
            return Ok(OpOutcome::Cancelled);
        }
        run_steps(self.runner, &ws.dir, &[step(&["rebase", &default])])?;
        self.console.success(&format!("Rebased onto {}", default));
        Ok(OpOutcome::Done)
    }
}
