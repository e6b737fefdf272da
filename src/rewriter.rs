//! Localizes images and stylesheets referenced by a page.
//!
//! Each reference is resolved, classified, fetched at most once per run, stored
//! under its content address and rewritten to a path relative to the file that
//! contains it. HTML references are relative to the output root; `url()`
//! references inside a stored stylesheet are relative to that stylesheet.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::AssetErrorPolicy;
use crate::content_store::{self, relative_href, AssetCategory, ContentStore};
use crate::css_rewriter;
use crate::error::{MirrorError, Result};
use crate::fetcher::Fetch;
use crate::html_parser::{self, Document};
use crate::url_resolver::{self, AssetKind, AssetReference, ResolvedAsset};

/// Decides whether a per-reference failure is swallowed (`Ok(None)`, the
/// reference stays as it was) or ends the page.
fn recover<T>(policy: AssetErrorPolicy, result: Result<T>, reference: &str) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err @ MirrorError::MalformedReference { .. }) => {
            warn!(reference, error = %err, "skipping malformed reference");
            Ok(None)
        }
        Err(err) if err.is_fetch() && policy == AssetErrorPolicy::Skip => {
            warn!(reference, error = %err, "leaving reference remote");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

pub struct AssetRewriter<'a, F: Fetch + ?Sized> {
    fetcher: &'a F,
    store: &'a mut ContentStore,
    policy: AssetErrorPolicy,
}

impl<'a, F: Fetch + ?Sized> AssetRewriter<'a, F> {
    pub fn new(fetcher: &'a F, store: &'a mut ContentStore, policy: AssetErrorPolicy) -> Self {
        Self {
            fetcher,
            store,
            policy,
        }
    }

    /// Returns the path the asset is stored at, fetching it on first use.
    async fn localize(&mut self, asset: &ResolvedAsset) -> Result<PathBuf> {
        if let Some(path) = self.store.stored_path(&asset.url) {
            return Ok(path.to_path_buf());
        }

        let category = AssetCategory::from(asset.kind);
        info!(url = %asset.url, category = category.dir_name(), "download");
        let bytes = self.fetcher.fetch(&asset.url).await?;
        self.store.put(&asset.url, category, &bytes)
    }

    /// Rewrites `<img src>` pointing at raster images.
    pub async fn rewrite_images(&mut self, document: &Document, page_url: &Url) -> Result<usize> {
        let mut rewritten = 0;
        for img in document.elements("img") {
            let Some(src) = html_parser::get_attr(&img, "src") else {
                continue;
            };
            let reference = AssetReference {
                raw_value: &src,
                container: page_url,
            };
            let Some(url) = recover(self.policy, reference.resolve(), &src)? else {
                continue;
            };
            let Some(asset) = ResolvedAsset::classify(url, AssetKind::Image) else {
                debug!(src = %src, "not a raster image, left as is");
                continue;
            };

            let outcome = self.localize(&asset).await;
            let Some(path) = recover(self.policy, outcome, &src)? else {
                continue;
            };
            html_parser::set_attr(&img, "src", &relative_href(&path, self.store.root()));
            rewritten += 1;
        }
        Ok(rewritten)
    }

    /// Rewrites `<link rel="stylesheet" href>` and localizes the images each
    /// stylesheet points at, once per run.
    pub async fn rewrite_stylesheet_links(
        &mut self,
        document: &Document,
        page_url: &Url,
    ) -> Result<usize> {
        let mut rewritten = 0;
        for link in document.elements("link") {
            let is_stylesheet = html_parser::get_attr(&link, "rel")
                .is_some_and(|rel| rel.trim().eq_ignore_ascii_case("stylesheet"));
            if !is_stylesheet {
                continue;
            }
            let Some(href) = html_parser::get_attr(&link, "href") else {
                continue;
            };
            let reference = AssetReference {
                raw_value: &href,
                container: page_url,
            };
            let Some(url) = recover(self.policy, reference.resolve(), &href)? else {
                continue;
            };
            let Some(asset) = ResolvedAsset::classify(url, AssetKind::Stylesheet) else {
                debug!(href = %href, "stylesheet scheme not fetchable, left as is");
                continue;
            };

            let outcome = self.localize(&asset).await;
            let Some(path) = recover(self.policy, outcome, &href)? else {
                continue;
            };

            // Only marked once the rewrite completes, so a page aborted halfway
            // leaves the stylesheet to be retried by the next page using it.
            if !self.store.is_rewritten(&asset.url) {
                self.rewrite_css_urls(&asset.url, &path).await?;
                self.store.mark_rewritten(&asset.url);
            }
            html_parser::set_attr(&link, "href", &relative_href(&path, self.store.root()));
            rewritten += 1;
        }
        Ok(rewritten)
    }

    /// Localizes absolute image `url()`s in a stored stylesheet and overwrites
    /// it in place.
    pub async fn rewrite_css_urls(
        &mut self,
        stylesheet_url: &Url,
        stylesheet_path: &Path,
    ) -> Result<usize> {
        let css = fs::read(stylesheet_path)
            .map_err(|e| MirrorError::storage(stylesheet_path, e))?;
        let anchor = stylesheet_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.store.root().to_path_buf());

        let (rewritten, count) = self.localize_css(&css, &anchor).await?;
        if count > 0 {
            content_store::write_file(stylesheet_path, &rewritten)?;
            debug!(url = %stylesheet_url, count, "rewrote stylesheet urls");
        }
        Ok(count)
    }

    /// Rewrites `<style>` blocks and `style` attributes. The page is written to
    /// the output root, so that is where the paths are anchored.
    pub async fn rewrite_inline_styles(&mut self, document: &Document) -> Result<usize> {
        let anchor = self.store.root().to_path_buf();
        let mut rewritten = 0;

        for style in document.elements("style") {
            for text in html_parser::text_children(&style) {
                let Some(css) = html_parser::text_of(&text) else {
                    continue;
                };
                let (out, count) = self.localize_css(css.as_bytes(), &anchor).await?;
                if count > 0 {
                    html_parser::set_text(&text, &String::from_utf8_lossy(&out));
                    rewritten += count;
                }
            }
        }

        for element in document.elements_with_attr("style") {
            let Some(css) = html_parser::get_attr(&element, "style") else {
                continue;
            };
            let (out, count) = self.localize_css(css.as_bytes(), &anchor).await?;
            if count > 0 {
                html_parser::set_attr(&element, "style", &String::from_utf8_lossy(&out));
                rewritten += count;
            }
        }
        Ok(rewritten)
    }

    /// Returns the rewritten text and how many tokens changed. Only absolute
    /// URLs with a raster extension are localized.
    async fn localize_css(&mut self, css: &[u8], anchor_dir: &Path) -> Result<(Vec<u8>, usize)> {
        let mut replacements = Vec::new();
        for found in css_rewriter::find_urls(css) {
            let Some(url) = url_resolver::parse_absolute(&found.value) else {
                debug!(reference = %found.value, "relative css url, left as is");
                continue;
            };
            let Some(asset) = ResolvedAsset::classify(url, AssetKind::Image) else {
                continue;
            };

            let outcome = self.localize(&asset).await;
            let Some(path) = recover(self.policy, outcome, &found.value)? else {
                continue;
            };
            let token = css_rewriter::url_token(&relative_href(&path, anchor_dir), found.quote);
            replacements.push((found.range, token));
        }

        let count = replacements.len();
        Ok((css_rewriter::splice(css, &replacements), count))
    }
}
