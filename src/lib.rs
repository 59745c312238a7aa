//! gist-bridge - backend adapters for hosted snippet services.
//!
//! Maps a backend-agnostic gist model (named collections of text snippets)
//! onto the GitHub Gists API and the GitLab project Snippets API. The crate
//! only translates operations into HTTP calls and reshapes the responses;
//! the configured backend stays the single source of truth.

pub mod backends;
pub mod config;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use backends::{create_backend, Provider};
pub use config::BridgeConfig;
pub use domain::model::{AccessToken, FileChanges, Gist, NewFiles, Snippet, UserProfile};
pub use domain::ports::GistBackend;
pub use utils::error::{BridgeError, Result};
