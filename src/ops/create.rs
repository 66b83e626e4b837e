//! New branch from the default branch
//!
//! Name layout: `<prefix><task>/<short>`, e.g. `dl/TTSH-42/fix-login`.

use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use super::{run_steps, step, OpContext, OpError, OpOutcome};

static SHORT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("short name pattern is valid"));

fn is_task_number(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

fn is_short_name(value: &str) -> bool {
    SHORT_NAME.is_match(value)
}

pub fn full_branch_name(prefix: &str, task: &str, short: &str) -> String {
    format!("{}{}/{}", prefix, task, short)
}

impl OpContext<'_> {
    /// Prompt for task and name, then branch off a freshly reset default branch
    /// and publish it. An existing branch is offered as a switch instead.
    pub fn create_branch(&mut self) -> Result<OpOutcome, OpError> {
        let ws = self.workspace()?;
        let catalog = ws.catalog(self.runner);

        loop {
            let Some(task) =
                self.ask_valid("Task number: ", is_task_number, "Task number must be digits only")
            else {
                return Ok(OpOutcome::Cancelled);
            };
            let Some(short) = self.ask_valid(
                "Short name: ",
                is_short_name,
                "Use letters, digits, '_' and '-' only",
            ) else {
                return Ok(OpOutcome::Cancelled);
            };

            let full = full_branch_name(&ws.prefix, &task, &short);
            if catalog.branch_exists(&full) {
                self.console.info(&format!("Branch {} already exists", full));
                if !self.console.confirm("Switch to it?") {
                    continue;
                }
                run_steps(self.runner, &ws.dir, &[step(&["checkout", &full])])?;
                self.verify_current(&ws, &full)?;
                self.console.success(&format!("Switched to {}", full));
                return Ok(OpOutcome::Done);
            }

            let default = catalog.default_branch_name();
            let upstream = format!("{}/{}", ws.remote, default);
            info!(branch = %full, base = %upstream, "Creating branch");

            let steps = [
                step(&["fetch", &ws.remote]),
                step(&["checkout", &default]),
                step(&["reset", "--hard", &upstream]),
                step(&["checkout", "-b", &full]),
                step(&["push", "-u", &ws.remote, &full]),
            ];
            run_steps(self.runner, &ws.dir, &steps)?;
            self.verify_current(&ws, &full)?;

            self.console
                .success(&format!("Created {} from {} and pushed it", full, upstream));
            return Ok(OpOutcome::Done);
        }
    }
}
