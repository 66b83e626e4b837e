//! Package manifest support (package.json)
//!
//! After a branch operation rewrites the working tree, dependencies are
//! reinstalled when the working directory carries a manifest. The manifest's
//! `scripts` table can also be launched in a separate terminal.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

pub const MANIFEST_FILE: &str = "package.json";

/// How often the install child is polled while the ticker runs.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

const MAX_OUTPUT_LEN: usize = 10000;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("No package.json in {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to read package.json: {0}")]
    Read(String),
    #[error("Failed to parse package.json: {0}")]
    Parse(String),
    #[error("Package manager not found on PATH: {0}")]
    PackageManagerMissing(String),
    #[error("Failed to start {program}: {message}")]
    Spawn { program: String, message: String },
}

/// Result of a finished dependency install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub succeeded: bool,
    pub exit_code: Option<i32>,
    pub stderr: String,
}

pub fn manifest_path(working_dir: &Path) -> PathBuf {
    working_dir.join(MANIFEST_FILE)
}

pub fn has_manifest(working_dir: &Path) -> bool {
    manifest_path(working_dir).is_file()
}

/// Script table in declaration order; a manifest without `scripts` yields none.
pub fn read_scripts(working_dir: &Path) -> Result<Vec<(String, String)>, ManifestError> {
    let path = manifest_path(working_dir);
    if !path.is_file() {
        return Err(ManifestError::NotFound(working_dir.to_path_buf()));
    }

    let content = fs::read_to_string(&path).map_err(|e| ManifestError::Read(e.to_string()))?;
    let manifest: Value =
        serde_json::from_str(&content).map_err(|e| ManifestError::Parse(e.to_string()))?;

    let scripts = match manifest.get("scripts") {
        Some(Value::Object(table)) => table
            .iter()
            .map(|(name, command)| {
                let command = command
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| command.to_string());
                (name.clone(), command)
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(scripts)
}

/// Package manager binary for this platform.
pub fn package_manager() -> &'static str {
    if cfg!(windows) {
        "npm.cmd"
    } else {
        "npm"
    }
}

/// Run `<program> install` and block until it exits.
///
/// `tick` is called with the elapsed time on every poll; it only drives display
/// and has no say in when this function returns.
pub fn run_install<F>(
    program: &str,
    working_dir: &Path,
    mut tick: F,
) -> Result<InstallReport, ManifestError>
where
    F: FnMut(Duration),
{
    let resolved = which::which(program)
        .map_err(|_| ManifestError::PackageManagerMissing(program.to_string()))?;

    info!(dir = %working_dir.display(), program, "Installing dependencies");

    let mut child = Command::new(&resolved)
        .args(["install", "--no-audit", "--progress=false"])
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ManifestError::Spawn {
            program: program.to_string(),
            message: e.to_string(),
        })?;

    // Drain stderr on a helper thread so a chatty child cannot fill the pipe.
    let stderr_reader = child.stderr.take().map(|mut stream| {
        thread::spawn(move || {
            let mut buf = String::new();
            let _ = stream.read_to_string(&mut buf);
            buf
        })
    });

    let started = Instant::now();
    let status = wait_with_ticks(&mut child, started, &mut tick).map_err(|e| {
        ManifestError::Spawn {
            program: program.to_string(),
            message: e.to_string(),
        }
    })?;

    let stderr = stderr_reader
        .and_then(|handle| handle.join().ok())
        .map(|s| truncate_output(&s))
        .unwrap_or_default();

    let report = InstallReport {
        succeeded: status.success(),
        exit_code: status.code(),
        stderr,
    };
    if report.succeeded {
        info!(elapsed_ms = started.elapsed().as_millis() as u64, "Dependencies installed");
    } else {
        warn!(exit_code = ?report.exit_code, stderr = %report.stderr, "Dependency install failed");
    }
    Ok(report)
}

fn wait_with_ticks<F>(
    child: &mut std::process::Child,
    started: Instant,
    tick: &mut F,
) -> std::io::Result<ExitStatus>
where
    F: FnMut(Duration),
{
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        tick(started.elapsed());
        thread::sleep(POLL_INTERVAL);
    }
}

/// Start `npm run <script>` in a new terminal window and return immediately.
pub fn launch_script(working_dir: &Path, script: &str) -> Result<(), ManifestError> {
    let program = package_manager();
    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", "cmd", "/k", program, "run", script]);
        c
    } else {
        let terminal =
            std::env::var("TERMINAL").unwrap_or_else(|_| "x-terminal-emulator".to_string());
        let mut c = Command::new(&terminal);
        c.args(["-e", "bash", "-c"])
            .arg(format!("{} run {}; exec bash", program, shell_quote(script)));
        c
    };

    command
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ManifestError::Spawn {
            program: program.to_string(),
            message: e.to_string(),
        })?;

    info!(script, "Script launched");
    Ok(())
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn truncate_output(s: &str) -> String {
    let s = s.trim();
    if s.len() > MAX_OUTPUT_LEN {
        let mut end = MAX_OUTPUT_LEN;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated]", &s[..end])
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_manifest_detection() {
        let temp = TempDir::new().unwrap();
        assert!(!has_manifest(temp.path()));

        fs::write(temp.path().join(MANIFEST_FILE), "{}").unwrap();
        assert!(has_manifest(temp.path()));
    }

    #[test]
    fn test_scripts_keep_declaration_order() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(MANIFEST_FILE),
            r#"{"name": "app", "scripts": {"start": "vite", "build": "vite build", "anything": 3}}"#,
        )
        .unwrap();

        let scripts = read_scripts(temp.path()).unwrap();
        assert_eq!(
            scripts,
            [
                ("start".to_string(), "vite".to_string()),
                ("build".to_string(), "vite build".to_string()),
                ("anything".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_scripts_missing_or_broken() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            read_scripts(temp.path()),
            Err(ManifestError::NotFound(_))
        ));

        fs::write(temp.path().join(MANIFEST_FILE), r#"{"name": "app"}"#).unwrap();
        assert!(read_scripts(temp.path()).unwrap().is_empty());

        fs::write(temp.path().join(MANIFEST_FILE), "{").unwrap();
        assert!(matches!(
            read_scripts(temp.path()),
            Err(ManifestError::Parse(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_wait_with_ticks_until_exit() {
        let mut child = Command::new("sleep").arg("0.3").spawn().unwrap();
        let mut ticks = Vec::new();

        let status =
            wait_with_ticks(&mut child, Instant::now(), &mut |elapsed| ticks.push(elapsed)).unwrap();
        assert!(status.success());
        assert!(!ticks.is_empty());
        assert!(ticks.windows(2).all(|w| w[0] <= w[1]));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_install_reports_exit_status() {
        let temp = TempDir::new().unwrap();

        let report = run_install("true", temp.path(), |_| {}).unwrap();
        assert!(report.succeeded);
        assert_eq!(report.exit_code, Some(0));

        let report = run_install("false", temp.path(), |_| {}).unwrap();
        assert!(!report.succeeded);
        assert_eq!(report.exit_code, Some(1));
    }

    #[test]
    fn test_run_install_without_package_manager() {
        let temp = TempDir::new().unwrap();
        let err = run_install("branchdeck-no-such-tool", temp.path(), |_| {}).unwrap_err();
        assert!(
            matches!(err, ManifestError::PackageManagerMissing(ref name) if name == "branchdeck-no-such-tool")
        );
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("dev"), "'dev'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn test_truncate_output() {
        assert_eq!(truncate_output("  short \n"), "short");
        let long = "é".repeat(MAX_OUTPUT_LEN);
        assert!(truncate_output(&long).ends_with("... [truncated]"));
    }
}
