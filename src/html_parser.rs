use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{parse_document, Attribute, LocalName, Namespace, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

use crate::error::{MirrorError, Result};

/// A parsed HTML page that is rewritten in place and serialized once.
pub struct Document {
    dom: RcDom,
}

impl Document {
    /// Parses `bytes` as UTF-8 HTML. Invalid sequences are replaced.
    pub fn parse(bytes: &[u8]) -> Self {
        let html = String::from_utf8_lossy(bytes).into_owned();
        let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
        Self { dom }
    }

    /// All elements with the given local name in document order.
    ///
    /// Handles are collected up front so callers can mutate attributes and
    /// children without disturbing the walk.
    pub fn elements(&self, name: &str) -> Vec<Handle> {
        let mut found = Vec::new();
        let mut stack = vec![self.dom.document.clone()];
        while let Some(node) = stack.pop() {
            if let NodeData::Element { name: ref qual, .. } = node.data {
                if &*qual.local == name {
                    found.push(node.clone());
                }
            }
            if let Some(contents) = template_contents(&node) {
                stack.push(contents);
            }
            stack.extend(node.children.borrow().iter().rev().cloned());
        }
        found
    }

    /// Every element carrying the given attribute, in document order.
    pub fn elements_with_attr(&self, attr: &str) -> Vec<Handle> {
        let mut found = Vec::new();
        let mut stack = vec![self.dom.document.clone()];
        while let Some(node) = stack.pop() {
            if get_attr(&node, attr).is_some() {
                found.push(node.clone());
            }
            if let Some(contents) = template_contents(&node) {
                stack.push(contents);
            }
            stack.extend(node.children.borrow().iter().rev().cloned());
        }
        found
    }

    pub fn to_html(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let document: SerializableHandle = self.dom.document.clone().into();
        serialize(&mut out, &document, SerializeOpts::default())
            .map_err(|source| MirrorError::Serialize { source })?;
        Ok(out)
    }
}

fn template_contents(node: &Handle) -> Option<Handle> {
    match node.data {
        NodeData::Element {
            ref template_contents,
            ..
        } => template_contents.borrow().clone(),
        _ => None,
    }
}

pub fn get_attr(node: &Handle, name: &str) -> Option<String> {
    match node.data {
        NodeData::Element { ref attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// Replaces the attribute value, adding the attribute if it is missing.
pub fn set_attr(node: &Handle, name: &str, value: &str) {
    if let NodeData::Element { ref attrs, .. } = node.data {
        let mut attrs = attrs.borrow_mut();
        match attrs.iter_mut().find(|attr| &*attr.name.local == name) {
            Some(attr) => attr.value = StrTendril::from_slice(value),
            None => attrs.push(Attribute {
                name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
                value: StrTendril::from_slice(value),
            }),
        }
    }
}

pub fn remove_attr(node: &Handle, name: &str) {
    if let NodeData::Element { ref attrs, .. } = node.data {
        attrs
            .borrow_mut()
            .retain(|attr| &*attr.name.local != name);
    }
}

/// Text children of `node`, as handles whose contents can be replaced.
pub fn text_children(node: &Handle) -> Vec<Handle> {
    node.children
        .borrow()
        .iter()
        .filter(|child| matches!(child.data, NodeData::Text { .. }))
        .cloned()
        .collect()
}

pub fn text_of(node: &Handle) -> Option<String> {
    match node.data {
        NodeData::Text { ref contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

pub fn set_text(node: &Handle, text: &str) {
    if let NodeData::Text { ref contents } = node.data {
        *contents.borrow_mut() = StrTendril::from_slice(text);
    }
}

/// Empties every `<script>` and drops its `src`, leaving the bare tag.
pub fn strip_scripts(document: &Document) -> usize {
    let scripts = document.elements("script");
    for script in &scripts {
        for child in script.children.borrow_mut().drain(..) {
            child.parent.set(None);
        }
        remove_attr(script, "src");
    }
    scripts.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(document: &Document) -> String {
        String::from_utf8(document.to_html().unwrap()).unwrap()
    }

    #[test]
    fn test_elements_in_document_order() {
        let document = Document::parse(
            br#"<html><body><img src="a.png"><div><img src="b.png"></div><img src="c.png"></body></html>"#,
        );
        let srcs: Vec<_> = document
            .elements("img")
            .iter()
            .filter_map(|img| get_attr(img, "src"))
            .collect();
        assert_eq!(srcs, vec!["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn test_set_attr_while_iterating_siblings() {
        let document =
            Document::parse(br#"<p><img src="a.png"><img src="b.png"><img></p>"#);
        for img in document.elements("img") {
            if let Some(src) = get_attr(&img, "src") {
                set_attr(&img, "src", &format!("img/{src}"));
            }
        }
        let html = render(&document);
        assert!(html.contains(r#"<img src="img/a.png">"#));
        assert!(html.contains(r#"<img src="img/b.png">"#));
        assert!(html.contains("<img>"));
    }

    #[test]
    fn test_set_attr_adds_missing_attribute() {
        let document = Document::parse(b"<img>");
        let img = &document.elements("img")[0];
        set_attr(img, "alt", "x");
        assert_eq!(get_attr(img, "alt").as_deref(), Some("x"));
    }

    #[test]
    fn test_strip_scripts_removes_body_and_src() {
        let document = Document::parse(
            br#"<html><head><script src="http://h/a.js">alert(1)</script></head><body><script>var x = 1;</script><p>kept</p></body></html>"#,
        );
        assert_eq!(strip_scripts(&document), 2);

        let html = render(&document);
        assert!(!html.contains("alert(1)"));
        assert!(!html.contains("var x"));
        assert!(!html.contains("a.js"));
        assert!(html.contains("<script></script>"));
        assert!(html.contains("<p>kept</p>"));
    }

    #[test]
    fn test_style_text_round_trips_unescaped() {
        let document = Document::parse(
            br#"<html><head><style>.a { background: url("http://h/bg.png") }</style></head></html>"#,
        );
        let style = &document.elements("style")[0];
        let text = text_children(style);
        assert_eq!(text.len(), 1);
        let css = text_of(&text[0]).unwrap();
        set_text(&text[0], &css.replace("http://h/bg.png", "img/bg.png"));

        assert!(render(&document).contains(r#"url("img/bg.png")"#));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let document = Document::parse(b"<p>caf\xe9</p>");
        assert!(render(&document).contains("caf\u{fffd}"));
    }
}
