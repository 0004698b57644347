//! HTML → text via a parsed DOM, with a tag-stripping fallback.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Node, Selector};

/// Elements whose text never reaches the reader.
const INVISIBLE_ELEMENTS: &[&str] = &["script", "style", "template", "noscript"];

/// Return the concatenated text content of the document body.
///
/// Documents without a `<body>` (framesets) fall back to [`strip_tags`].
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let Some(body) = document.select(body_selector()).next() else {
        tracing::debug!("No <body> in parsed document, stripping tags instead");
        return strip_tags(html);
    };

    let mut text = String::with_capacity(html.len() / 2);
    for node in body.descendants() {
        if let Node::Text(t) = node.value() {
            let hidden = node.ancestors().any(|a| {
                matches!(a.value(), Node::Element(e) if INVISIBLE_ELEMENTS.contains(&e.name()))
            });
            if !hidden {
                text.push_str(t);
            }
        }
    }
    text
}

/// Remove anything that looks like a tag. Entities are left untouched.
pub fn strip_tags(html: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid regex"))
        .replace_all(html, "")
        .into_owned()
}

fn body_selector() -> &'static Selector {
    static BODY: OnceLock<Selector> = OnceLock::new();
    BODY.get_or_init(|| Selector::parse("body").expect("valid selector"))
}
