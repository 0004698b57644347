//! Allowlist sanitizer for renderer output.
//!
//! Keeps only the renderer's own vocabulary. Unknown elements are unwrapped
//! (their text survives); active content is dropped with its children.

use scraper::{ElementRef, Html, Node};

use super::inline::{escape_html, is_web_url};

/// Elements the renderer emits.
const ALLOWED_ELEMENTS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "ul", "ol", "li", "blockquote", "hr", "strong", "em", "code",
    "a",
];

/// Elements removed together with everything inside them.
const DROPPED_ELEMENTS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "template", "noscript", "svg", "math",
    "form", "textarea", "select", "title", "head",
];

/// Re-serialize `markup` keeping only allowed elements and attributes.
pub fn sanitize_html(markup: &str) -> String {
    if markup.is_empty() {
        return String::new();
    }
    let fragment = Html::parse_fragment(markup);
    let mut out = String::with_capacity(markup.len());
    write_children(fragment.root_element(), &mut out);
    out
}

fn write_children(parent: ElementRef<'_>, out: &mut String) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&escape_html(text)),
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    write_element(element, out);
                }
            }
            _ => {}
        }
    }
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if DROPPED_ELEMENTS.contains(&name) {
        return;
    }

    let href = element.value().attr("href");
    let unsafe_link = name == "a" && !href.is_some_and(is_web_url);
    if !ALLOWED_ELEMENTS.contains(&name) || unsafe_link {
        write_children(element, out);
        return;
    }

    out.push('<');
    out.push_str(name);
    for &attr in allowed_attributes(name) {
        let Some(value) = element.value().attr(attr) else {
            continue;
        };
        if attribute_allowed(name, attr, value) {
            out.push(' ');
            out.push_str(attr);
            out.push_str("=\"");
            out.push_str(&escape_html(value));
            out.push('"');
        }
    }
    out.push('>');

    if name == "hr" {
        return;
    }
    write_children(element, out);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// Attributes worth looking at, in output order.
fn allowed_attributes(element: &str) -> &'static [&'static str] {
    match element {
        "h1" | "h2" | "h3" | "h4" | "hr" => &["class"],
        "a" => &["href", "target", "rel"],
        _ => &[],
    }
}

fn attribute_allowed(element: &str, attr: &str, value: &str) -> bool {
    match (element, attr) {
        ("h1" | "h2" | "h3" | "h4", "class") => value == "summary-heading",
        ("hr", "class") => value == "summary-rule",
        ("a", "href") => is_web_url(value),
        ("a", "target") => value == "_blank",
        ("a", "rel") => true,
        _ => false,
    }
}
