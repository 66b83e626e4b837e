//! Profile-level settings: prefix, working directory, remote, locale, the
//! profile list itself and the recency histories.

use std::path::{Path, PathBuf};

use super::{check_repository, OpContext, OpError, OpOutcome};
use crate::render;

pub const SUPPORTED_LOCALES: [&str; 2] = ["en", "ru"];

/// Answer to a "pick from the list or enter a new value" prompt.
enum Choice {
    Existing(usize),
    New(String),
}

impl OpContext<'_> {
    pub fn change_prefix(&mut self) -> Result<OpOutcome, OpError> {
        let current = self.store.active()?.branch_prefix.clone();
        let history = self.store.prefix_history().to_vec();

        self.console.info(&format!("Current prefix: {}", current));
        let value = match self.choose_or_enter(&history, Some(current.as_str()), "New prefix: ") {
            Some(Choice::Existing(i)) => history[i].clone(),
            Some(Choice::New(value)) => value,
            None => return Ok(OpOutcome::Cancelled),
        };
        self.store.record_prefix(&value)?;
        self.console.success(&format!("Branch prefix set to {}", value));
        Ok(OpOutcome::Done)
    }

    /// Pick a working directory from history or enter a new one. The target
    /// must be an existing git working tree.
    pub fn change_directory(&mut self) -> Result<OpOutcome, OpError> {
        let current = self.store.active()?.working_directory.clone();
        let history = self.store.directory_history().to_vec();
        let labels: Vec<String> = history.iter().map(|p| render::shorten_home(p)).collect();

        self.console
            .info(&format!("Current directory: {}", render::shorten_home(&current)));
        let dir = match self.choose_or_enter(
            &labels,
            Some(render::shorten_home(&current).as_str()),
            "New directory: ",
        ) {
            Some(Choice::Existing(i)) => history[i].clone(),
            Some(Choice::New(raw)) => expand_home(&raw),
            None => return Ok(OpOutcome::Cancelled),
        };

        check_repository(&dir)?;
        self.store.record_directory(&dir)?;
        self.console
            .success(&format!("Working directory set to {}", render::shorten_home(&dir)));
        Ok(OpOutcome::Done)
    }

    /// Choose the remote used for fetch, push and the default-branch lookup.
    pub fn set_remote(&mut self) -> Result<OpOutcome, OpError> {
        let ws = self.workspace()?;
        let remotes = ws.catalog(self.runner).remotes();
        if remotes.is_empty() {
            self.console.info("No remotes configured in this repository");
            return Ok(OpOutcome::Cancelled);
        }

        let remote = match self.choose_or_enter(&remotes, Some(ws.remote.as_str()), "Remote name: ") {
            Some(Choice::Existing(i)) => remotes[i].clone(),
            Some(Choice::New(value)) => value,
            None => return Ok(OpOutcome::Cancelled),
        };
        self.store.set_remote(&remote)?;
        self.console.success(&format!("Default remote set to {}", remote));
        Ok(OpOutcome::Done)
    }

    pub fn change_locale(&mut self) -> Result<OpOutcome, OpError> {
        let current = self.store.active()?.locale.clone();
        self.show(render::choice_rows(&SUPPORTED_LOCALES[..], Some(current.as_str())));

        let Some(index) = self.select("Language (number, q to cancel): ", SUPPORTED_LOCALES.len())
        else {
            return Ok(OpOutcome::Cancelled);
        };
        let locale = SUPPORTED_LOCALES[index];
        self.store.set_locale(locale)?;
        self.console.success(&format!("Language set to {}", locale));
        Ok(OpOutcome::Done)
    }

    /// List profiles, then add, remove or switch one.
    pub fn manage_profiles(&mut self) -> Result<OpOutcome, OpError> {
        let rows = render::profile_rows(self.store.profiles(), self.store.active_name());
        self.show(rows);

        let Some(action) = self.ask("a add, r remove, s switch, q back: ") else {
            return Ok(OpOutcome::Cancelled);
        };
        match action.to_ascii_lowercase().as_str() {
            "a" => self.add_profile(),
            "r" => {
                let Some(name) = self.pick_profile("Profile to remove: ") else {
                    return Ok(OpOutcome::Cancelled);
                };
                self.store.remove_profile(&name)?;
                self.console.success(&format!("Removed profile {}", name));
                self.report_active();
                Ok(OpOutcome::Done)
            }
            "s" => {
                let Some(name) = self.pick_profile("Profile to activate: ") else {
                    return Ok(OpOutcome::Cancelled);
                };
                self.store.switch_active(&name)?;
                self.report_active();
                Ok(OpOutcome::Done)
            }
            "q" => Ok(OpOutcome::Cancelled),
            other => {
                self.console.error(&format!("Unknown action: {}", other));
                Ok(OpOutcome::Cancelled)
            }
        }
    }

    /// Reset prefix and/or directory history to the active profile's values.
    pub fn clear_history(&mut self) -> Result<OpOutcome, OpError> {
        let Some(answer) = self.ask("Clear 1 prefixes, 2 directories, 3 both (q to cancel): ")
        else {
            return Ok(OpOutcome::Cancelled);
        };
        match answer.as_str() {
            "1" => self.store.clear_prefix_history()?,
            "2" => self.store.clear_directory_history()?,
            "3" => {
                self.store.clear_prefix_history()?;
                self.store.clear_directory_history()?;
            }
            _ => return Ok(OpOutcome::Cancelled),
        }
        self.console.success("History cleared");
        Ok(OpOutcome::Done)
    }

    fn add_profile(&mut self) -> Result<OpOutcome, OpError> {
        let active = self.store.active()?.clone();

        let Some(name) = self.ask("Profile name: ") else {
            return Ok(OpOutcome::Cancelled);
        };
        let Some(prefix) = self.ask_or_default("Branch prefix", &active.branch_prefix) else {
            return Ok(OpOutcome::Cancelled);
        };
        let Some(remote) = self.ask_or_default("Remote", &active.remote_name) else {
            return Ok(OpOutcome::Cancelled);
        };
        let current_dir = active.working_directory.display().to_string();
        let Some(dir) = self.ask_or_default("Working directory", &current_dir) else {
            return Ok(OpOutcome::Cancelled);
        };
        let Some(locale) = self.ask_or_default("Language (en/ru)", &active.locale) else {
            return Ok(OpOutcome::Cancelled);
        };

        self.store
            .add_profile(&name, &prefix, &remote, &expand_home(&dir), &locale)?;
        self.console.success(&format!("Added profile {}", name.trim()));
        self.report_active();
        Ok(OpOutcome::Done)
    }

    fn pick_profile(&mut self, prompt: &str) -> Option<String> {
        let count = self.store.profiles().len();
        let index = self.select(prompt, count)?;
        Some(self.store.profiles()[index].name.clone())
    }

    fn report_active(&mut self) {
        let name = self.store.active_name().to_string();
        self.console.info(&format!("Active profile: {}", name));
    }

    /// `None` only at end of input; an empty answer takes `default`.
    fn ask_or_default(&mut self, label: &str, default: &str) -> Option<String> {
        let answer = self.console.read_line(&format!("{} [{}]: ", label, default))?;
        let answer = answer.trim();
        Some(if answer.is_empty() {
            default.to_string()
        } else {
            answer.to_string()
        })
    }

    /// Numbered list with `n` for a new value; `q`, empty input or end of input cancels.
    fn choose_or_enter(
        &mut self,
        items: &[String],
        current: Option<&str>,
        new_prompt: &str,
    ) -> Option<Choice> {
        self.show(render::choice_rows(items, current));
        loop {
            let answer = self.ask("Number, n for new, q to cancel: ")?;
            match answer.to_ascii_lowercase().as_str() {
                "q" => return None,
                "n" => return self.ask(new_prompt).map(Choice::New),
                _ => {}
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=items.len()).contains(&n) => return Some(Choice::Existing(n - 1)),
                _ => self.console.error("Invalid choice"),
            }
        }
    }
}

/// Expand a leading `~` to the home directory.
fn expand_home(raw: &str) -> PathBuf {
    let home = dirs::home_dir();
    match (raw.strip_prefix('~'), home) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) if rest.starts_with('/') => {
            home.join(rest.trim_start_matches('/'))
        }
        _ => Path::new(raw).to_path_buf(),
    }
}
