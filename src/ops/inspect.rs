//! Read-only views (log, status) and manifest scripts

use super::{OpContext, OpError, OpOutcome};
use crate::git::{git_log, git_short_status};
use crate::manifest;
use crate::render;

impl OpContext<'_> {
    pub fn show_log(&mut self) -> Result<OpOutcome, OpError> {
        let ws = self.workspace()?;
        let entries = git_log(self.runner, &ws.dir)?;
        if entries.is_empty() {
            self.console.info("No commits to show");
        } else {
            self.show(render::log_rows(&entries));
        }
        Ok(OpOutcome::Done)
    }

    /// `git status -sb`, printed as git wrote it.
    pub fn show_status(&mut self) -> Result<OpOutcome, OpError> {
        let ws = self.workspace()?;
        match git_short_status(self.runner, &ws.dir)? {
            Some(text) => self.show(text.lines().map(str::to_string).collect()),
            None => self.console.info("No status information"),
        }
        Ok(OpOutcome::Done)
    }

    /// List `package.json` scripts and launch the chosen one in a new terminal.
    pub fn run_script(&mut self) -> Result<OpOutcome, OpError> {
        let ws = self.workspace()?;
        let scripts = manifest::read_scripts(&ws.dir)?;
        if scripts.is_empty() {
            self.console.info("package.json declares no scripts");
            return Ok(OpOutcome::Done);
        }

        let width = scripts.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
        let rows = scripts
            .iter()
            .enumerate()
            .map(|(i, (name, command))| {
                format!("[{:>2}] {:<width$}  {}", i + 1, name, command, width = width)
            })
            .collect();
        self.show(rows);

        let Some(index) = self.select("Script to run (number, q to cancel): ", scripts.len())
        else {
            return Ok(OpOutcome::Cancelled);
        };
        let name = &scripts[index].0;
        manifest::launch_script(&ws.dir, name)?;
        self.console
            .success(&format!("Started `npm run {}` in a new terminal", name));
        Ok(OpOutcome::Done)
    }
}
