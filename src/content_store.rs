use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use url::Url;

use crate::error::{MirrorError, Result};
use crate::url_resolver::{self, AssetKind};

/// Fixed directory segment each asset kind is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    Image,
    Stylesheet,
}

impl AssetCategory {
    pub fn dir_name(self) -> &'static str {
        match self {
            AssetCategory::Image => "img",
            AssetCategory::Stylesheet => "css",
        }
    }
}

impl From<AssetKind> for AssetCategory {
    fn from(kind: AssetKind) -> Self {
        match kind {
            AssetKind::Image => AssetCategory::Image,
            AssetKind::Stylesheet => AssetCategory::Stylesheet,
        }
    }
}

/// Hex SHA-256 of the URL string. Used as the stored file stem.
pub fn content_address(url: &Url) -> String {
    format!("{:x}", Sha256::digest(url.as_str().as_bytes()))
}

/// Maps asset URLs to deterministic paths under the output root and remembers
/// which URLs were already fetched during this run.
#[derive(Debug)]
pub struct ContentStore {
    root: PathBuf,
    /// URL to the path its bytes were written to. A URL is stored once per
    /// run, under whichever category first asked for it.
    fetched: HashMap<String, PathBuf>,
    /// Stylesheets whose `url()`s have been localized.
    rewritten: HashSet<String>,
}

impl ContentStore {
    pub fn new(root: &Path) -> Result<Self> {
        let root = root.to_path_buf();
        fs::create_dir_all(&root).map_err(|e| MirrorError::storage(&root, e))?;

        Ok(Self {
            root,
            fetched: HashMap::new(),
            rewritten: HashSet::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `root/{category}/{sha256(url)}{ext}`. Pure in `(url, category)`.
    pub fn path_for(&self, url: &Url, category: AssetCategory) -> PathBuf {
        let file_name = format!("{}{}", content_address(url), url_resolver::extension(url));
        self.root.join(category.dir_name()).join(file_name)
    }

    /// Whether `url` was stored earlier in this run. Does not look at the disk.
    pub fn has(&self, url: &Url) -> bool {
        self.fetched.contains_key(url.as_str())
    }

    /// Where `url` was written earlier in this run.
    pub fn stored_path(&self, url: &Url) -> Option<&Path> {
        self.fetched.get(url.as_str()).map(PathBuf::as_path)
    }

    /// Writes `bytes` for `url` and marks it fetched. Returns the stored path.
    pub fn put(&mut self, url: &Url, category: AssetCategory, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(url, category);
        write_file(&path, bytes)?;
        self.fetched.insert(url.to_string(), path.clone());
        Ok(path)
    }

    pub fn is_rewritten(&self, url: &Url) -> bool {
        self.rewritten.contains(url.as_str())
    }

    /// Records that the stylesheet stored for `url` no longer needs its
    /// `url()`s localized.
    pub fn mark_rewritten(&mut self, url: &Url) {
        self.rewritten.insert(url.to_string());
    }

    pub fn fetched_count(&self) -> usize {
        self.fetched.len()
    }

    /// `{root}/{page}.html`
    pub fn page_path(&self, page: u32) -> PathBuf {
        self.root.join(format!("{page}.html"))
    }
}

/// Writes through a temporary sibling and renames it into place so a failed
/// write never leaves a truncated file at `path`.
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| MirrorError::storage(parent, e))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".part");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes).map_err(|e| MirrorError::storage(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        MirrorError::storage(path, e)
    })
}

/// `target` expressed relative to the directory `base`, with `/` separators
/// so it can go straight into an `href`.
pub fn relative_href(target: &Path, base: &Path) -> String {
    let relative = pathdiff::diff_paths(target, base).unwrap_or_else(|| target.to_path_buf());
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
