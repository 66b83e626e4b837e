// Git module - everything that talks to the git binary
//
// This module is split into logical submodules:
// - runner: Process execution boundary and captured outcomes
// - branches: Branch catalog (listing, default branch, existence checks)
// - status: Working-tree safety gate
// - log: Commit history and short status

pub mod branches;
pub mod log;
pub mod runner;
pub mod status;

#[cfg(test)]
pub(crate) mod scripted;

pub use branches::*;
pub use log::*;
pub use runner::*;
pub use status::*;
