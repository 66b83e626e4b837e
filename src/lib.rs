//! branchdeck - interactive shell for profile-driven git branch workflows
//!
//! Modules:
//! - git: process runner, branch catalog, safety gate and log parsing
//! - profile: profiles, recency histories and the persisted config file
//! - ops: multi-step branch operations (create, delete, reset, rebase, switch)
//! - manifest: package.json detection, dependency install and scripts
//! - shell: the interactive command loop
//! - console/render: line-based input and plain-text output

pub mod console;
pub mod git;
pub mod manifest;
pub mod ops;
pub mod profile;
pub mod render;
pub mod shell;
pub mod util;
