//! Git branch catalog
//!
//! Turns `git for-each-ref` output into sorted branch records and resolves the
//! repository's default branch.

use std::path::Path;

use tracing::debug;

use super::runner::CommandRunner;

/// Per-ref record layout: name|relative date|epoch|upstream|author|upstream remote
pub const REF_LISTING_FORMAT: &str = "--format=%(refname:short)|%(committerdate:relative)|%(committerdate:unix)|%(upstream:short)|%(authorname)|%(upstream:remotename)";

/// Author shown when the listing carries none.
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// Branches checked when the remote HEAD cannot be resolved.
const MAIN_BRANCH: &str = "main";
const MASTER_BRANCH: &str = "master";

/// One local branch and its last commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRecord {
    pub local_name: String,
    /// Upstream without the remote prefix; empty when the branch tracks nothing.
    pub remote_name: String,
    /// Remote the upstream belongs to; empty when the branch tracks nothing.
    pub upstream_remote: String,
    pub last_commit_relative: String,
    pub last_commit_epoch: i64,
    pub author_name: String,
}

impl BranchRecord {
    pub fn has_upstream(&self) -> bool {
        !self.remote_name.is_empty()
    }
}

/// Branch queries against one working directory and remote.
pub struct BranchCatalog<'a> {
    runner: &'a dyn CommandRunner,
    working_dir: &'a Path,
    remote: &'a str,
}

impl<'a> BranchCatalog<'a> {
    pub fn new(runner: &'a dyn CommandRunner, working_dir: &'a Path, remote: &'a str) -> Self {
        Self {
            runner,
            working_dir,
            remote,
        }
    }

    /// Local branches, most recently committed first.
    ///
    /// A failed or empty listing yields an empty vector.
    pub fn list(&self) -> Vec<BranchRecord> {
        match self
            .runner
            .git(&["for-each-ref", REF_LISTING_FORMAT, "refs/heads/"], self.working_dir)
        {
            Ok(outcome) if outcome.succeeded => parse_branch_listing(&outcome.stdout, self.remote),
            Ok(outcome) => {
                debug!(stderr = %outcome.stderr, "Branch listing failed");
                Vec::new()
            }
            Err(e) => {
                debug!(error = %e, "Branch listing failed");
                Vec::new()
            }
        }
    }

    /// Resolve the default branch. Never fails: falls back to "master".
    ///
    /// 1. `git symbolic-ref refs/remotes/<remote>/HEAD`, last path segment
    /// 2. "main" if `git branch -a` lists `<remote>/main`
    /// 3. "master"
    pub fn default_branch_name(&self) -> String {
        let head_ref = format!("refs/remotes/{}/HEAD", self.remote);
        if let Ok(outcome) = self.runner.git(&["symbolic-ref", &head_ref], self.working_dir) {
            if outcome.succeeded {
                if let Some(name) = outcome
                    .stdout
                    .trim()
                    .rsplit('/')
                    .next()
                    .filter(|s| !s.is_empty())
                {
                    return name.to_string();
                }
            }
        }

        if let Ok(outcome) = self.runner.git(&["branch", "-a"], self.working_dir) {
            if outcome.succeeded && lists_remote_branch(&outcome.stdout, self.remote, MAIN_BRANCH)
            {
                return MAIN_BRANCH.to_string();
            }
        }

        MASTER_BRANCH.to_string()
    }

    /// Currently checked-out branch; `None` when detached or on error.
    pub fn current_branch(&self) -> Option<String> {
        let outcome = self
            .runner
            .git(&["branch", "--show-current"], self.working_dir)
            .ok()?;
        let name = outcome.stdout.trim();
        (outcome.succeeded && !name.is_empty()).then(|| name.to_string())
    }

    /// Whether `refs/heads/<name>` exists.
    pub fn branch_exists(&self, name: &str) -> bool {
        let reference = format!("refs/heads/{}", name);
        self.runner
            .git(&["show-ref", "--verify", "--quiet", &reference], self.working_dir)
            .map(|o| o.succeeded)
            .unwrap_or(false)
    }

    /// Configured remote names.
    pub fn remotes(&self) -> Vec<String> {
        match self.runner.git(&["remote"], self.working_dir) {
            Ok(outcome) if outcome.succeeded => outcome
                .stdout
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Parse ref listing output and sort by commit epoch, newest first.
///
/// Malformed rows are skipped; the rest of the listing survives.
pub fn parse_branch_listing(raw: &str, remote: &str) -> Vec<BranchRecord> {
    let mut records: Vec<BranchRecord> = raw
        .lines()
        .filter_map(|line| parse_branch_line(line, remote))
        .collect();
    // sort_by is stable: equal epochs keep listing order
    records.sort_by(|a, b| b.last_commit_epoch.cmp(&a.last_commit_epoch));
    records
}

fn parse_branch_line(line: &str, remote: &str) -> Option<BranchRecord> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let mut fields = line.split('|').map(str::trim);
    let local_name = match fields.next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            debug!(line, "Skipping branch row without a name");
            return None;
        }
    };
    let last_commit_relative = fields.next().unwrap_or("").to_string();
    let last_commit_epoch = match fields.next().unwrap_or("") {
        "" => 0,
        raw => match raw.parse::<i64>() {
            Ok(epoch) => epoch,
            Err(_) => {
                debug!(line, "Skipping branch row with a malformed epoch");
                return None;
            }
        },
    };
    let upstream = fields.next().unwrap_or("");
    let author_name = fields
        .next()
        .filter(|a| !a.is_empty())
        .unwrap_or(UNKNOWN_AUTHOR)
        .to_string();
    // Older listings carry no remote column; assume the configured remote then.
    let upstream_remote = match fields.next().filter(|r| !r.is_empty()) {
        Some(owner) => owner,
        None if upstream.is_empty() => "",
        None => remote,
    };

    Some(BranchRecord {
        local_name,
        remote_name: strip_remote_prefix(upstream, upstream_remote).to_string(),
        upstream_remote: upstream_remote.to_string(),
        last_commit_relative,
        last_commit_epoch,
        author_name,
    })
}

fn strip_remote_prefix<'s>(upstream: &'s str, remote: &str) -> &'s str {
    upstream
        .strip_prefix(remote)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(upstream)
}

/// Whether `git branch -a` output contains `<remote>/<branch>`.
fn lists_remote_branch(listing: &str, remote: &str, branch: &str) -> bool {
    let short = format!("{}/{}", remote, branch);
    let full = format!("remotes/{}", short);
    listing
        .lines()
        .filter_map(|line| line.trim_start_matches(['*', '+']).split_whitespace().next())
        .any(|name| name == full || name == short)
}
