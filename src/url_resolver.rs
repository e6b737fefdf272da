//! Turns raw asset references into absolute, query-free URLs.
//!
//! References scraped from markup are frequently host-relative (`/a.jpg`),
//! protocol-relative (`//cdn/a.jpg`) or path-relative (`img/a.jpg`). They are
//! resolved against the referring page, which supplies the default scheme and
//! host the way a browser would.

use std::path::Path;
use url::Url;

use crate::error::{MirrorError, Result};

/// Raster formats worth localizing. SVG and friends are left remote.
pub const IMAGE_EXTENSIONS: [&str; 4] = [".jpg", ".gif", ".png", ".jpeg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Stylesheet,
}

/// A reference as found in markup or CSS, before resolution.
#[derive(Debug, Clone)]
pub struct AssetReference<'a> {
    pub raw_value: &'a str,
    /// URL of the document or stylesheet containing the reference.
    pub container: &'a Url,
}

impl AssetReference<'_> {
    /// Scheme and host default to the container's.
    pub fn resolve(&self) -> Result<Url> {
        resolve_against(self.raw_value, self.container)
    }
}

/// An absolute URL that passed classification and will be localized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub url: Url,
    pub kind: AssetKind,
    /// Lower-cased, dot-prefixed, possibly empty.
    pub extension: String,
}

impl ResolvedAsset {
    /// Returns `None` when the URL is not something this kind localizes.
    pub fn classify(url: Url, kind: AssetKind) -> Option<Self> {
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        let extension = extension(&url);
        if kind == AssetKind::Image && !is_image_extension(&extension) {
            return None;
        }
        Some(Self {
            url,
            kind,
            extension,
        })
    }
}

/// Resolves `raw` using only a default scheme and host.
pub fn resolve(raw: &str, default_scheme: &str, default_host: &str) -> Result<Url> {
    let base = Url::parse(&format!("{default_scheme}://{default_host}/")).map_err(|source| {
        MirrorError::MalformedReference {
            reference: raw.to_string(),
            source,
        }
    })?;
    resolve_against(raw, &base)
}

/// Resolves `raw` against the URL of the document that contains it and drops
/// the query string.
pub fn resolve_against(raw: &str, base: &Url) -> Result<Url> {
    let raw = raw.trim();
    let malformed = |source| MirrorError::MalformedReference {
        reference: raw.to_string(),
        source,
    };

    let mut url = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => base.join(raw).map_err(malformed)?,
        Err(source) => return Err(malformed(source)),
    };
    url.set_query(None);
    Ok(url)
}

/// Parses `raw` only if it is already an absolute URL, dropping the query.
pub fn parse_absolute(raw: &str) -> Option<Url> {
    let mut url = Url::parse(raw.trim()).ok()?;
    url.set_query(None);
    Some(url)
}

/// Lower-cased extension of the URL path including the leading dot, or an
/// empty string.
pub fn extension(url: &Url) -> String {
    Path::new(url.path())
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

pub fn is_image_extension(extension: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://h1/page-1.html").unwrap()
    }

    #[test]
    fn test_protocol_relative_inherits_scheme() {
        let url = resolve_against("//h2/a.jpg", &page()).unwrap();
        assert_eq!(url.as_str(), "https://h2/a.jpg");
    }

    #[test]
    fn test_host_relative_inherits_scheme_and_host() {
        let url = resolve_against("/a.jpg", &page()).unwrap();
        assert_eq!(url.as_str(), "https://h1/a.jpg");
    }

    #[test]
    fn test_path_relative_resolves_against_page_directory() {
        let base = Url::parse("https://example.com/blog/page-1.html").unwrap();
        let url = resolve_against("images/pic.jpg", &base).unwrap();
        assert_eq!(url.as_str(), "https://example.com/blog/images/pic.jpg");
    }

    #[test]
    fn test_resolve_with_defaults_only() {
        assert_eq!(
            resolve("/a.jpg", "https", "h1").unwrap().as_str(),
            "https://h1/a.jpg"
        );
        assert_eq!(
            resolve("//h2/a.jpg", "http", "h1").unwrap().as_str(),
            "http://h2/a.jpg"
        );
        assert_eq!(
            resolve("http://h3/a.jpg", "https", "h1").unwrap().as_str(),
            "http://h3/a.jpg"
        );
    }

    #[test]
    fn test_query_is_stripped() {
        let a = resolve_against("http://h/x.png?v=1", &page()).unwrap();
        let b = resolve_against("http://h/x.png?v=2", &page()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "http://h/x.png");
    }

    #[test]
    fn test_malformed_reference() {
        let err = resolve_against("http://[::1/a.png", &page()).unwrap_err();
        assert!(matches!(err, MirrorError::MalformedReference { .. }));
    }

    #[test]
    fn test_parse_absolute_rejects_relative() {
        assert!(parse_absolute("img/bg.png").is_none());
        assert!(parse_absolute("//h/bg.png").is_none());
        assert_eq!(
            parse_absolute("http://h/bg.png?x=1").unwrap().as_str(),
            "http://h/bg.png"
        );
    }

    #[test]
    fn test_extension_is_lower_cased() {
        let url = Url::parse("http://h/photo.PNG").unwrap();
        assert_eq!(extension(&url), ".png");
        let url = Url::parse("http://h/dir/").unwrap();
        assert_eq!(extension(&url), "");
    }

    #[test]
    fn test_classify_filters_images() {
        let svg = Url::parse("http://h/icon.svg").unwrap();
        assert!(ResolvedAsset::classify(svg, AssetKind::Image).is_none());

        let png = Url::parse("http://h/photo.PNG").unwrap();
        let asset = ResolvedAsset::classify(png, AssetKind::Image).unwrap();
        assert_eq!(asset.extension, ".png");

        let data = Url::parse("data:image/png;base64,AAAA").unwrap();
        assert!(ResolvedAsset::classify(data, AssetKind::Image).is_none());
    }

    #[test]
    fn test_classify_accepts_any_stylesheet_extension() {
        let css = Url::parse("https://fonts.example/css").unwrap();
        let asset = ResolvedAsset::classify(css, AssetKind::Stylesheet).unwrap();
        assert_eq!(asset.extension, "");
    }

    #[test]
    fn test_reference_defaults_come_from_container() {
        let container = page();
        let reference = AssetReference {
            raw_value: "/a.jpg",
            container: &container,
        };
        assert_eq!(reference.resolve().unwrap().as_str(), "https://h1/a.jpg");
    }
}
