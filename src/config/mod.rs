pub mod toml_config;

pub use toml_config::{BackendSection, BridgeConfig, GitHubSection, GitLabSection, HttpSection};

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "gist-bridge")]
#[command(about = "Inspect gists on the configured snippet backend")]
pub struct CliConfig {
    #[arg(long, default_value = "gist-bridge.toml")]
    pub config: String,

    #[arg(long, help = "Access token; falls back to GIST_BRIDGE_TOKEN")]
    pub token: Option<String>,

    #[arg(long, help = "Fetch one gist's contents instead of listing")]
    pub gist_id: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}
