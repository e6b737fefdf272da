use clap::Parser;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{AssetErrorPolicy, MirrorConfig};

#[derive(Parser, Debug)]
#[command(
    name = "amesc",
    about = "Mirror a numbered page series for offline reading",
    version,
    long_about = "Downloads {root}/page-{n}.html for every n in FROM..=TO, stores the images and stylesheets they reference under content-addressed names, rewrites references to local relative paths and strips scripts."
)]
pub struct MirrorCommand {
    /// Host (optionally with a path) the pages live under, e.g. example.com/blog
    #[arg(required = true)]
    pub host: String,

    /// First page number
    pub from: u32,

    /// Last page number (inclusive)
    pub to: u32,

    /// Output directory for the mirrored pages
    #[arg(short, long, default_value = "./pages")]
    pub output_dir: PathBuf,

    /// Scheme used when HOST does not carry one
    #[arg(long, default_value = "https")]
    pub scheme: String,

    /// Minimum pause between requests in milliseconds
    #[arg(long, default_value = "1000")]
    pub delay_ms: u64,

    /// Timeout for requests in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// User agent string to use for requests
    #[arg(long, default_value = concat!("amesc/", env!("CARGO_PKG_VERSION")))]
    pub user_agent: String,

    /// What to do when an image or stylesheet cannot be downloaded
    #[arg(long, value_enum, default_value_t = AssetErrorPolicy::Skip)]
    pub asset_errors: AssetErrorPolicy,

    /// Log skipped references and politeness delays
    #[arg(short, long)]
    pub verbose: bool,
}

impl MirrorCommand {
    pub fn source_root(&self) -> String {
        let root = if self.host.contains("://") {
            self.host.clone()
        } else {
            format!("{}://{}", self.scheme, self.host)
        };
        root.trim_end_matches('/').to_string()
    }

    pub fn pages(&self) -> RangeInclusive<u32> {
        self.from..=self.to
    }

    pub fn to_config(&self) -> MirrorConfig {
        MirrorConfig {
            source_root: self.source_root(),
            output_root: self.output_dir.clone(),
            politeness_delay: Duration::from_millis(self.delay_ms),
            timeout: Duration::from_secs(self.timeout),
            user_agent: self.user_agent.clone(),
            asset_errors: self.asset_errors,
        }
    }
}
