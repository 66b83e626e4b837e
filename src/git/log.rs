//! Commit history and status summaries

use std::path::Path;

use thiserror::Error;
use tracing::warn;

use super::runner::{CommandRunner, RunnerError, UNKNOWN_ERROR};

/// Number of commits shown by the history view.
pub const LOG_LIMIT: usize = 20;

const LOG_FORMAT: &str = "--pretty=format:%h|%s|%an|%ad|%d";
const LOG_DATE_FORMAT: &str = "--date=format:%Y-%m-%d %H:%M";

/// A read-only query git ran but refused.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Runner(#[from] RunnerError),
    #[error("`{command}` failed: {message}")]
    Failed { command: String, message: String },
}

/// Git log entry (single commit)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub hash: String,
    pub subject: String,
    pub author: String,
    pub date: String,
    /// Decorations such as `HEAD -> main`, `origin/main`, `tag: v1.0`
    pub refs: Vec<String>,
}

/// Last [`LOG_LIMIT`] commits across all refs.
pub fn git_log(
    runner: &dyn CommandRunner,
    working_dir: &Path,
) -> Result<Vec<LogEntry>, QueryError> {
    let limit = format!("-n{}", LOG_LIMIT);
    let stdout = query(
        runner,
        working_dir,
        &[
            "log",
            "--all",
            LOG_FORMAT,
            LOG_DATE_FORMAT,
            "--abbrev-commit",
            &limit,
        ],
    )?;
    Ok(parse_log(&stdout))
}

/// `git status -sb` as printed by git; `None` when it produced nothing.
pub fn git_short_status(
    runner: &dyn CommandRunner,
    working_dir: &Path,
) -> Result<Option<String>, QueryError> {
    let stdout = query(runner, working_dir, &["status", "-sb"])?;
    Ok((!stdout.trim().is_empty()).then_some(stdout))
}

fn query(
    runner: &dyn CommandRunner,
    working_dir: &Path,
    args: &[&str],
) -> Result<String, QueryError> {
    let outcome = runner.git(args, working_dir)?;
    if !outcome.succeeded {
        let command = format!("git {}", args.join(" "));
        let message = outcome.error_text().unwrap_or(UNKNOWN_ERROR).to_string();
        warn!(command = %command, error = %message, "Query failed");
        return Err(QueryError::Failed { command, message });
    }
    Ok(outcome.stdout)
}

/// Parse `hash|subject|author|date|refs` rows; rows with fewer fields are skipped.
///
/// The subject may itself contain `|`, so fields are taken from both ends.
pub fn parse_log(output: &str) -> Vec<LogEntry> {
    output
        .lines()
        .filter_map(|line| {
            let mut head = line.splitn(2, '|');
            let hash = head.next()?.trim();
            let rest = head.next()?;

            let mut tail = rest.rsplitn(4, '|');
            let refs = tail.next()?.trim();
            let date = tail.next()?.trim();
            let author = tail.next()?.trim();
            let subject = tail.next()?.trim();

            Some(LogEntry {
                hash: hash.chars().take(7).collect(),
                subject: subject.to_string(),
                author: author.to_string(),
                date: date.to_string(),
                refs: parse_decorations(refs),
            })
        })
        .collect()
}

fn parse_decorations(raw: &str) -> Vec<String> {
    raw.trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(", ")
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}
