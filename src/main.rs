use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use branchdeck::console::StdConsole;
use branchdeck::git::SystemRunner;
use branchdeck::profile::{ConfigFile, ProfileStore, CONFIG_ENV};
use branchdeck::shell::Shell;

#[derive(Parser, Debug)]
#[command(name = "branchdeck", version, about = "Profile-driven git branch workflows")]
struct Cli {
    /// Config file (default: ~/.branchdeck/config.json)
    #[arg(long, value_name = "PATH", env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Working directory for the default profile created on first run
    #[arg(long, value_name = "DIR")]
    workdir: Option<PathBuf>,

    /// Run a single shell command (e.g. `8` or `s`) and exit
    #[arg(long, value_name = "KEY")]
    command: Option<String>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    branchdeck::util::init_logging().context("Failed to initialise logging")?;

    let config_path = match cli.config {
        Some(path) => path,
        None => ConfigFile::default_path().context("Cannot determine the home directory")?,
    };
    let fallback_dir = match cli.workdir {
        Some(dir) => dir,
        None => env::current_dir().context("Cannot read the current directory")?,
    };

    let store = ProfileStore::open(config_path.clone(), &fallback_dir)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    info!(config = %config_path.display(), "Starting branchdeck");

    let mut shell = Shell::new(SystemRunner, StdConsole::new(), store);
    match cli.command {
        Some(key) => {
            shell.execute_line(&key);
            if shell.last_command_failed() {
                return Ok(ExitCode::FAILURE);
            }
        }
        None => shell.run(),
    }
    Ok(ExitCode::SUCCESS)
}
