//! Quoted `url(...)` references in stylesheet text.
//!
//! Only `url("...")` and `url('...')` are recognised; unquoted `url(...)` is
//! left alone. Work happens on raw bytes so stylesheets in other encodings
//! survive a rewrite untouched outside the replaced tokens.

use regex::bytes::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*(?:"([^"]*)"|'([^']*)')\s*\)"#).expect("static pattern")
});

/// One `url(...)` token found in stylesheet text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssUrl {
    /// Byte range of the whole token, `url(` through `)`.
    pub range: Range<usize>,
    pub quote: char,
    pub value: String,
}

pub fn find_urls(css: &[u8]) -> Vec<CssUrl> {
    CSS_URL
        .captures_iter(css)
        .filter_map(|caps| {
            let token = caps.get(0)?;
            let (value, quote) = match (caps.get(1), caps.get(2)) {
                (Some(value), _) => (value, '"'),
                (None, Some(value)) => (value, '\''),
                (None, None) => return None,
            };
            let value = std::str::from_utf8(value.as_bytes()).ok()?;
            Some(CssUrl {
                range: token.range(),
                quote,
                value: value.to_string(),
            })
        })
        .collect()
}

pub fn url_token(path: &str, quote: char) -> String {
    format!("url({quote}{path}{quote})")
}

/// Replaces each range with its text. Ranges must be ascending and disjoint.
pub fn splice(css: &[u8], replacements: &[(Range<usize>, String)]) -> Vec<u8> {
    let mut out = Vec::with_capacity(css.len());
    let mut cursor = 0;
    for (range, text) in replacements {
        out.extend_from_slice(&css[cursor..range.start]);
        out.extend_from_slice(text.as_bytes());
        cursor = range.end;
    }
    out.extend_from_slice(&css[cursor..]);
    out
}
