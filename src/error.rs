use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while mirroring pages and their assets.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// An asset reference could not be parsed as a URL. Recovered per reference.
    #[error("malformed reference {reference:?}: {source}")]
    MalformedReference {
        reference: String,
        #[source]
        source: url::ParseError,
    },

    /// Network failure, timeout or non-success status.
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Local filesystem failure. Always fatal.
    #[error("failed to write {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rewritten DOM could not be rendered back to HTML.
    #[error("failed to serialize document: {source}")]
    Serialize {
        #[source]
        source: std::io::Error,
    },

    /// A fatal error tagged with the page it aborted.
    #[error("page {page}: {source}")]
    Page {
        page: u32,
        #[source]
        source: Box<MirrorError>,
    },
}

impl MirrorError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MirrorError::Storage {
            path: path.into(),
            source,
        }
    }

    pub fn is_fetch(&self) -> bool {
        matches!(self, MirrorError::Fetch { .. })
    }
}

pub type Result<T, E = MirrorError> = std::result::Result<T, E>;
