use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

/// What to do when a single asset fails to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AssetErrorPolicy {
    /// Leave the reference pointing at its remote URL and keep going.
    #[default]
    Skip,
    /// Fail the whole page.
    Abort,
}

/// Settings for one multi-page run.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Base URL the pages live under, e.g. `https://example.com/blog`.
    pub source_root: String,
    pub output_root: PathBuf,
    /// Pause enforced between consecutive network requests.
    pub politeness_delay: Duration,
    pub timeout: Duration,
    pub user_agent: String,
    pub asset_errors: AssetErrorPolicy,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            source_root: String::new(),
            output_root: PathBuf::from("./pages"),
            politeness_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
            user_agent: concat!("amesc/", env!("CARGO_PKG_VERSION")).to_string(),
            asset_errors: AssetErrorPolicy::Skip,
        }
    }
}

impl MirrorConfig {
    pub fn new(source_root: impl Into<String>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            output_root: output_root.into(),
            ..Self::default()
        }
    }
}
