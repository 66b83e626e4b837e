//! Profiles and their persisted configuration
//!
//! - state: on-disk layout, `Profile` record, atomic save
//! - store: `ProfileStore` with its invariants and recency histories

pub mod state;
pub mod store;

pub use state::{ConfigFile, Profile, StateError, CONFIG_ENV};
pub use store::{
    ProfileError, ProfileStore, DEFAULT_LOCALE, DEFAULT_PREFIX, DEFAULT_PROFILE, DEFAULT_REMOTE,
    HISTORY_LIMIT,
};
