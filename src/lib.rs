pub mod cli;
pub mod config;
pub mod content_store;
pub mod css_rewriter;
pub mod downloader;
pub mod error;
pub mod fetcher;
pub mod html_parser;
pub mod rewriter;
pub mod url_resolver;

// Re-export main types for convenience
pub use cli::MirrorCommand;
pub use config::{AssetErrorPolicy, MirrorConfig};
pub use content_store::{AssetCategory, ContentStore};
pub use downloader::{PageMirror, PageReport, PageRequest};
pub use error::MirrorError;
pub use fetcher::{Fetch, HttpFetcher, RateGate};
pub use html_parser::{strip_scripts, Document};
pub use rewriter::AssetRewriter;
pub use url_resolver::{resolve, AssetKind, ResolvedAsset};
