// Shell module - the interactive command loop
//
// The loop is a small state machine: while awaiting a command it reads a line,
// parses it into a `Command` and dispatches it. Unknown input reports an error
// and stays in the same state; quit or end of input finishes the loop.

mod command;

pub use command::{Command, KEY_BINDINGS};

use tracing::{info, warn};

use crate::console::Console;
use crate::git::{BranchCatalog, CommandRunner};
use crate::ops::{OpContext, OpError, OpOutcome, ResetTarget};
use crate::profile::ProfileStore;
use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellState {
    AwaitingCommand,
    Finished,
}

pub struct Shell<R: CommandRunner, C: Console> {
    runner: R,
    console: C,
    store: ProfileStore,
    state: ShellState,
    last_failed: bool,
}

impl<R: CommandRunner, C: Console> Shell<R, C> {
    pub fn new(runner: R, console: C, store: ProfileStore) -> Self {
        Self {
            runner,
            console,
            store,
            state: ShellState::AwaitingCommand,
            last_failed: false,
        }
    }

    /// Read and execute commands until quit or end of input.
    pub fn run(&mut self) {
        info!(profile = %self.store.active_name(), "Shell started");
        self.console
            .info(&format!("branchdeck, profile {}. Type h for help.", self.store.active_name()));

        while self.state == ShellState::AwaitingCommand {
            let prompt = self.prompt();
            match self.console.read_line(&prompt) {
                Some(line) => {
                    self.execute_line(&line);
                }
                None => self.state = ShellState::Finished,
            }
        }
        info!("Shell finished");
    }

    /// Execute one input line; a blank line does nothing.
    pub fn execute_line(&mut self, line: &str) -> ShellState {
        self.last_failed = false;
        if let Some(command) = Command::parse(line) {
            self.dispatch(command);
        }
        self.state
    }

    pub fn dispatch(&mut self, command: Command) {
        match command {
            Command::Quit => {
                self.state = ShellState::Finished;
                return;
            }
            Command::Help => {
                self.print_help();
                return;
            }
            Command::Unknown(token) => {
                self.last_failed = true;
                self.console
                    .error(&format!("Unknown command: {}. Type h for help.", token));
                return;
            }
            _ => {}
        }

        info!(command = ?command, "Dispatching");
        let result = {
            let mut ctx = OpContext::new(&self.runner, &mut self.console, &mut self.store);
            match command {
                Command::HardResetDefault => ctx.hard_reset(ResetTarget::DefaultBranch),
                Command::HardResetUnstable => ctx.hard_reset(ResetTarget::Unstable),
                Command::SoftReset => ctx.soft_reset(),
                Command::Rebase => ctx.rebase(),
                Command::CreateBranch => ctx.create_branch(),
                Command::SwitchBranch => ctx.switch_branch(),
                Command::ChangePrefix => ctx.change_prefix(),
                Command::ShowLog => ctx.show_log(),
                Command::ShowStatus => ctx.show_status(),
                Command::DeleteBranch => ctx.delete_branch(),
                Command::ChangeDirectory => ctx.change_directory(),
                Command::SetRemote => ctx.set_remote(),
                Command::ChangeLocale => ctx.change_locale(),
                Command::Profiles => ctx.manage_profiles(),
                Command::Scripts => ctx.run_script(),
                Command::ClearHistory => ctx.clear_history(),
                Command::Help | Command::Quit | Command::Unknown(_) => Ok(OpOutcome::Done),
            }
        };
        self.report(result);
    }

    /// `branchdeck -> ~/src/app [main]> `
    pub fn prompt(&self) -> String {
        let Ok(profile) = self.store.active() else {
            return "branchdeck> ".to_string();
        };
        let dir = &profile.working_directory;
        let branch = if dir.join(".git").exists() {
            BranchCatalog::new(&self.runner, dir, &profile.remote_name).current_branch()
        } else {
            None
        };
        match branch {
            Some(branch) => format!("branchdeck -> {} [{}]> ", render::shorten_home(dir), branch),
            None => format!("branchdeck -> {}> ", render::shorten_home(dir)),
        }
    }

    pub fn state(&self) -> ShellState {
        self.state
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    /// Whether the last executed line was unknown or its operation failed.
    pub fn last_command_failed(&self) -> bool {
        self.last_failed
    }

    fn report(&mut self, result: Result<OpOutcome, OpError>) {
        match result {
            Ok(OpOutcome::Done) => {}
            Ok(OpOutcome::Cancelled) => self.console.info("Cancelled"),
            Err(e) => {
                self.last_failed = true;
                warn!(error = %e, "Operation failed");
                self.console.error(&e.to_string());
                if let Some(done) = e.completed_steps() {
                    self.console.error(&format!(
                        "Nothing was rolled back after {} completed step(s)",
                        done
                    ));
                }
            }
        }
    }

    fn print_help(&mut self) {
        let profile = self.store.active_name().to_string();
        self.console.info(&format!("Profile: {}", profile));
        for (key, description) in KEY_BINDINGS {
            self.console.info(&format!("  {:<2} {}", key, description));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{Channel, ScriptedConsole};
    use crate::git::scripted::ScriptedRunner;
    use crate::ops::testing::repo_store;
    use tempfile::TempDir;

    fn shell(
        temp: &TempDir,
        runner: ScriptedRunner,
        answers: &[&str],
    ) -> Shell<ScriptedRunner, ScriptedConsole> {
        let store = repo_store(temp);
        Shell::new(runner, ScriptedConsole::new(answers.iter().copied()), store)
    }

    #[test]
    fn test_unknown_command_keeps_awaiting() {
        let temp = TempDir::new().unwrap();
        let mut shell = shell(&temp, ScriptedRunner::new(), &[]);

        assert_eq!(shell.execute_line("x"), ShellState::AwaitingCommand);
        assert_eq!(shell.execute_line(""), ShellState::AwaitingCommand);
        assert_eq!(shell.console().lines(Channel::Error).len(), 1);
        assert_eq!(shell.execute_line("q"), ShellState::Finished);
    }

    #[test]
    fn test_run_until_end_of_input() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new().ok("git branch --show-current", "main");
        let mut shell = shell(&temp, runner, &["h", "zz"]);

        shell.run();
        assert_eq!(shell.state(), ShellState::Finished);
        let prompts = shell.console().lines(Channel::Prompt);
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].ends_with("[main]> "));
        assert!(shell
            .console()
            .lines(Channel::Info)
            .iter()
            .any(|l| l.contains("Hard reset to the default branch")));
    }

    #[test]
    fn test_errors_are_reported_not_fatal() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new()
            .ok("git symbolic-ref refs/remotes/origin/HEAD", "refs/remotes/origin/main")
            .fail("git rebase main", "");
        let mut shell = shell(&temp, runner, &["y"]);

        assert_eq!(shell.execute_line("4"), ShellState::AwaitingCommand);
        let errors = shell.console().lines(Channel::Error);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("unknown error"));
        assert!(errors[1].contains("after 0 completed"));
        assert!(shell.last_command_failed());
    }

    #[test]
    fn test_failure_flag_tracks_last_line() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new().fail("git status -sb", "fatal: index file corrupt");
        let mut shell = shell(&temp, runner, &["n"]);

        shell.execute_line("s");
        assert!(shell.last_command_failed());
        shell.execute_line("h");
        assert!(!shell.last_command_failed());
        shell.execute_line("zz");
        assert!(shell.last_command_failed());
        // a cancelled operation is not a failure
        shell.execute_line("3");
        assert!(!shell.last_command_failed());
    }

    #[test]
    fn test_declined_hard_reset_through_shell() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new().ok("git status --porcelain", " M a.txt\n M b.txt");
        let mut shell = shell(&temp, runner, &["n"]);

        shell.execute_line("1");
        assert_eq!(shell.runner.calls(), ["git status --porcelain"]);
        assert_eq!(shell.console().lines(Channel::Info).last(), Some(&"Cancelled"));
    }

    #[test]
    fn test_prompt_without_repository() {
        let temp = TempDir::new().unwrap();
        let store =
            ProfileStore::open(temp.path().join("c.json"), &temp.path().join("missing")).unwrap();
        let shell = Shell::new(
            ScriptedRunner::new(),
            ScriptedConsole::new(Vec::<String>::new()),
            store,
        );
        assert!(shell.prompt().ends_with("missing> "));
        assert!(shell.runner.calls().is_empty());
    }
}
