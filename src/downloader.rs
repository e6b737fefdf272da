use std::path::PathBuf;
use tracing::info;
use url::Url;

use crate::config::{AssetErrorPolicy, MirrorConfig};
use crate::content_store::{self, ContentStore};
use crate::error::{MirrorError, Result};
use crate::fetcher::{Fetch, HttpFetcher};
use crate::html_parser::{self, Document};
use crate::rewriter::AssetRewriter;

/// One page of the series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub source_root: String,
    pub page_number: u32,
}

impl PageRequest {
    pub fn new(source_root: &str, page_number: u32) -> Self {
        Self {
            source_root: source_root.to_string(),
            page_number,
        }
    }

    /// `{source_root}/page-{n}.html`
    pub fn url(&self) -> Result<Url> {
        let raw = format!(
            "{}/page-{}.html",
            self.source_root.trim_end_matches('/'),
            self.page_number
        );
        Url::parse(&raw).map_err(|source| MirrorError::MalformedReference {
            reference: raw,
            source,
        })
    }
}

/// Counts for one processed page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageReport {
    pub path: PathBuf,
    pub stylesheets: usize,
    pub inline_styles: usize,
    pub images: usize,
    pub scripts: usize,
}

/// Mirrors pages of one source root into one output root.
///
/// Lives for a whole multi-page run so the store's dedup set accumulates
/// across pages.
pub struct PageMirror<F = HttpFetcher> {
    source_root: String,
    store: ContentStore,
    fetcher: F,
    asset_errors: AssetErrorPolicy,
}

impl PageMirror<HttpFetcher> {
    pub fn new(config: &MirrorConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(config)?;
        Self::with_fetcher(config, fetcher)
    }
}

impl<F: Fetch> PageMirror<F> {
    pub fn with_fetcher(config: &MirrorConfig, fetcher: F) -> Result<Self> {
        let store = ContentStore::new(&config.output_root)?;

        Ok(Self {
            source_root: config.source_root.clone(),
            store,
            fetcher,
            asset_errors: config.asset_errors,
        })
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// Fetches, localizes, strips and writes one page. Errors carry the page
    /// number.
    pub async fn process_page(&mut self, page: u32) -> Result<PageReport> {
        self.mirror_page(page)
            .await
            .map_err(|source| MirrorError::Page {
                page,
                source: Box::new(source),
            })
    }

    async fn mirror_page(&mut self, page: u32) -> Result<PageReport> {
        let page_url = PageRequest::new(&self.source_root, page).url()?;

        info!(page, url = %page_url, "fetching page");
        let html = self.fetcher.fetch(&page_url).await?;
        let document = Document::parse(&html);

        let mut rewriter = AssetRewriter::new(&self.fetcher, &mut self.store, self.asset_errors);
        let stylesheets = rewriter
            .rewrite_stylesheet_links(&document, &page_url)
            .await?;
        let inline_styles = rewriter.rewrite_inline_styles(&document).await?;
        let images = rewriter.rewrite_images(&document, &page_url).await?;
        let scripts = html_parser::strip_scripts(&document);

        let path = self.store.page_path(page);
        content_store::write_file(&path, &document.to_html()?)?;
        info!(page, path = %path.display(), images, stylesheets, "page written");

        Ok(PageReport {
            path,
            stylesheets,
            inline_styles,
            images,
            scripts,
        })
    }
}
