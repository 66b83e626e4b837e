//! Plain-text rows for the console

use std::path::Path;

use crate::git::{BranchRecord, ChangedFile, LogEntry};
use crate::profile::Profile;

const CURRENT_MARK: &str = "*";

/// Numbered branch rows with upstream, age and author.
pub fn branch_rows(branches: &[BranchRecord], current: Option<&str>) -> Vec<String> {
    let name_width = branches
        .iter()
        .map(|b| b.local_name.chars().count())
        .max()
        .unwrap_or(0);

    branches
        .iter()
        .enumerate()
        .map(|(idx, branch)| {
            let mark = if Some(branch.local_name.as_str()) == current {
                CURRENT_MARK
            } else {
                " "
            };
            let upstream = if branch.has_upstream() {
                branch.remote_name.as_str()
            } else {
                "-"
            };
            format!(
                "[{:>2}] {} {:<width$}  -> {:<20} {:<18} {}",
                idx + 1,
                mark,
                branch.local_name,
                upstream,
                branch.last_commit_relative,
                branch.author_name,
                width = name_width,
            )
        })
        .collect()
}

pub fn changed_file_rows(files: &[ChangedFile]) -> Vec<String> {
    files
        .iter()
        .map(|f| format!("  {:<3} {}", f.status_code.trim(), f.path))
        .collect()
}

pub fn log_rows(entries: &[LogEntry]) -> Vec<String> {
    entries
        .iter()
        .enumerate()
        .map(|(idx, e)| {
            let refs = if e.refs.is_empty() {
                String::new()
            } else {
                format!("  ({})", e.refs.join(", "))
            };
            format!(
                "{:>3} {} {} | {} | {}{}",
                idx + 1,
                e.hash,
                e.date,
                e.author,
                e.subject,
                refs
            )
        })
        .collect()
}

pub fn profile_rows(profiles: &[Profile], active: &str) -> Vec<String> {
    profiles
        .iter()
        .enumerate()
        .map(|(idx, p)| {
            let mark = if p.name == active { CURRENT_MARK } else { " " };
            format!(
                "[{:>2}] {} {}  prefix={} remote={} locale={} dir={}",
                idx + 1,
                mark,
                p.name,
                p.branch_prefix,
                p.remote_name,
                p.locale,
                shorten_home(&p.working_directory)
            )
        })
        .collect()
}

/// Numbered rows with a mark on the entry equal to `current`.
pub fn choice_rows<T: AsRef<str>>(items: &[T], current: Option<&str>) -> Vec<String> {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let item = item.as_ref();
            let mark = if Some(item) == current { CURRENT_MARK } else { " " };
            format!("[{:>2}] {} {}", idx + 1, mark, item)
        })
        .collect()
}

/// Replace the home directory prefix with `~`.
pub fn shorten_home(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(rest) = path.strip_prefix(&home) {
            return if rest.as_os_str().is_empty() {
                "~".to_string()
            } else {
                format!("~/{}", rest.display())
            };
        }
    }
    path.display().to_string()
}
