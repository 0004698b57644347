//! Tree splice over an owned `html5ever` parse of the compose body.
//!
//! The tree lives only for one call. The reply is built from element and
//! text nodes, never from markup, so generated text is always inert.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, Attribute, LocalName, Namespace, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};

use super::{
    normalize_reply, SpliceStrategy, MAX_EMPTY_SIBLINGS_REMOVED, REPLY_CONTAINER_ATTR,
    REPLY_TEXT_ATTR,
};

const HTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// Void or embedded elements that have no inner markup but are still content.
const NEVER_EMPTY: &[&str] = &[
    "img", "input", "video", "audio", "iframe", "object", "embed", "canvas", "svg", "picture",
    "source", "track", "area", "wbr", "meta", "link", "base", "col", "table",
];

/// Body-level blocks that may be trimmed from either end of the document.
const TRIMMABLE_BLOCKS: &[&str] = &["p", "div"];

/// What the insertion point was found by, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    /// `.moz-signature` / `#moz-signature`.
    Signature,
    /// `.moz-cite-prefix` ("On ... wrote:").
    CitePrefix,
    /// First top-level `<blockquote>`.
    Quote,
    /// No marker found; the body's first child.
    FirstChild,
}

/// A reference to the top-level body child the reply goes above.
///
/// The anchor node itself is never modified.
#[derive(Debug, Clone)]
pub struct SpliceAnchor {
    pub kind: AnchorKind,
    node: Handle,
}

/// Splices by inserting nodes into a parsed document.
pub struct TreeSplice {
    /// Must outlive `body`: dropping the document empties every descendant.
    _document: RcDom,
    body: Handle,
}

impl TreeSplice {
    /// Parse `original` and confirm it has a `<body>` to work in.
    ///
    /// The error string says why the tree path is unavailable.
    pub fn probe(original: &str) -> Result<Self, String> {
        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut original.as_bytes())
            .map_err(|e| format!("HTML parse failed: {e}"))?;
        if !dom.errors.is_empty() {
            tracing::debug!(errors = dom.errors.len(), "HTML parsed with recoverable errors");
        }

        let body = find_descendant(&dom.document, &|n| is_element(n, "body"))
            .ok_or_else(|| "document has no <body>".to_string())?;

        Ok(Self {
            _document: dom,
            body,
        })
    }

    /// Locate the insertion point by priority search.
    ///
    /// Markers inside a quote or a cite prefix belong to the quoted
    /// message and are never used as anchors.
    pub fn find_anchor(&self) -> Option<SpliceAnchor> {
        let children = self.body.children.borrow();

        let containing = |pred: &dyn Fn(&Handle) -> bool| {
            children
                .iter()
                .find(|child| find_unquoted(child, pred).is_some())
                .cloned()
        };

        let found = children
            .iter()
            .find(|child| is_signature(child))
            .cloned()
            .or_else(|| containing(&is_signature))
            .map(|node| (AnchorKind::Signature, node))
            .or_else(|| {
                containing(&|n| has_class(n, "moz-cite-prefix"))
                    .map(|node| (AnchorKind::CitePrefix, node))
            })
            .or_else(|| {
                children
                    .iter()
                    .find(|child| is_element(child, "blockquote"))
                    .map(|node| (AnchorKind::Quote, node.clone()))
            })
            .or_else(|| children.first().map(|node| (AnchorKind::FirstChild, node.clone())));

        found.map(|(kind, node)| SpliceAnchor { kind, node })
    }

    /// The document as it stands, `<body>` children only.
    fn serialize_body(&self) -> io::Result<String> {
        let mut out = Vec::new();
        let opts = SerializeOpts {
            traversal_scope: TraversalScope::ChildrenOnly(None),
            ..Default::default()
        };
        serialize(&mut out, &SerializableHandle::from(self.body.clone()), opts)?;
        String::from_utf8(out).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn insert_reply(&self, container: &Handle) -> usize {
        let anchor = self.find_anchor();
        let mut children = self.body.children.borrow_mut();

        let index = anchor
            .as_ref()
            .and_then(|a| children.iter().position(|c| Rc::ptr_eq(c, &a.node)))
            .unwrap_or(children.len());
        tracing::debug!(anchor = ?anchor.as_ref().map(|a| a.kind), index, "Inserting reply");

        container.parent.set(Some(Rc::downgrade(&self.body)));
        children.insert(index, container.clone());
        index
    }

    /// Remove up to [`MAX_EMPTY_SIBLINGS_REMOVED`] empty siblings right above the reply.
    fn remove_empty_predecessors(&self, mut index: usize) {
        let mut children = self.body.children.borrow_mut();
        for _ in 0..MAX_EMPTY_SIBLINGS_REMOVED {
            if index == 0 || !is_effectively_empty(&children[index - 1]) {
                break;
            }
            let removed = children.remove(index - 1);
            removed.parent.set(None);
            index -= 1;
        }
    }

    /// Drop empty breaks and blocks from both ends of the body.
    fn trim_boundaries(&self) {
        let mut children = self.body.children.borrow_mut();
        while children.first().is_some_and(is_trimmable_boundary) {
            children.remove(0).parent.set(None);
        }
        while children.last().is_some_and(is_trimmable_boundary) {
            if let Some(removed) = children.pop() {
                removed.parent.set(None);
            }
        }
    }
}

impl SpliceStrategy for TreeSplice {
    fn name(&self) -> &'static str {
        "tree"
    }

    fn splice(&self, reply: &str) -> io::Result<String> {
        let container = reply_container(reply);
        let index = self.insert_reply(&container);
        self.remove_empty_predecessors(index);
        self.trim_boundaries();
        self.serialize_body()
    }
}

// ── Node construction ───────────────────────────────────────────

/// `<div data-ai-reply><span data-ai-reply-text>line<br>line</span></div>`
fn reply_container(reply: &str) -> Handle {
    let container = new_element("div", &[(REPLY_CONTAINER_ATTR, "true"), ("style", "margin:0;")]);
    let span = new_element(
        "span",
        &[(REPLY_TEXT_ATTR, ""), ("style", "display:block;margin:0;padding:0;")],
    );

    let normalized = normalize_reply(reply);
    let lines: Vec<&str> = normalized.split('\n').collect();
    for (idx, line) in lines.iter().enumerate() {
        if !line.is_empty() {
            append(&span, new_text(line));
        }
        if idx + 1 < lines.len() {
            append(&span, new_element("br", &[]));
        }
    }

    append(&container, span);
    container
}

fn new_element(tag: &str, attrs: &[(&str, &str)]) -> Handle {
    let attrs = attrs
        .iter()
        .map(|&(name, value)| Attribute {
            name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
            value: value.into(),
        })
        .collect();

    Node::new(NodeData::Element {
        name: QualName::new(None, Namespace::from(HTML_NS), LocalName::from(tag)),
        attrs: RefCell::new(attrs),
        template_contents: RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    })
}

fn new_text(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(text.into()),
    })
}

fn append(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

// ── Node inspection ─────────────────────────────────────────────

fn tag_name(node: &Handle) -> Option<&str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(&*name.local),
        _ => None,
    }
}

fn is_element(node: &Handle, tag: &str) -> bool {
    tag_name(node).is_some_and(|t| t.eq_ignore_ascii_case(tag))
}

fn attr_value(node: &Handle, attr: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.as_ref().eq_ignore_ascii_case(attr))
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

fn has_class(node: &Handle, class: &str) -> bool {
    attr_value(node, "class").is_some_and(|v| v.split_ascii_whitespace().any(|c| c == class))
}

fn is_signature(node: &Handle) -> bool {
    has_class(node, "moz-signature") || attr_value(node, "id").is_some_and(|id| id == "moz-signature")
}

/// Pre-order search, `root` included.
fn find_descendant(root: &Handle, pred: &dyn Fn(&Handle) -> bool) -> Option<Handle> {
    if pred(root) {
        return Some(root.clone());
    }
    root.children
        .borrow()
        .iter()
        .find_map(|child| find_descendant(child, pred))
}

fn is_quote_boundary(node: &Handle) -> bool {
    is_element(node, "blockquote") || has_class(node, "moz-cite-prefix")
}

/// Like [`find_descendant`], but never descends into a quote or cite prefix.
fn find_unquoted(root: &Handle, pred: &dyn Fn(&Handle) -> bool) -> Option<Handle> {
    if pred(root) {
        return Some(root.clone());
    }
    if is_quote_boundary(root) {
        return None;
    }
    root.children
        .borrow()
        .iter()
        .find_map(|child| find_unquoted(child, pred))
}

fn is_blank(text: &str) -> bool {
    text.chars().all(|c| c.is_whitespace() || c == '\u{a0}')
}

/// Whitespace text, `<br>`/`<hr>`, or an element holding nothing but
/// whitespace, `&nbsp;`, `<br>` and comments.
pub(crate) fn is_effectively_empty(node: &Handle) -> bool {
    match &node.data {
        NodeData::Text { contents } => is_blank(&contents.borrow()),
        NodeData::Element { name, .. } => {
            let tag: &str = &name.local;
            if tag == "br" || tag == "hr" {
                return true;
            }
            if NEVER_EMPTY.contains(&tag) {
                return false;
            }
            node.children.borrow().iter().all(|child| match &child.data {
                NodeData::Text { contents } => is_blank(&contents.borrow()),
                NodeData::Comment { .. } => true,
                NodeData::Element { .. } => is_element(child, "br"),
                _ => false,
            })
        }
        _ => false,
    }
}

fn is_trimmable_boundary(node: &Handle) -> bool {
    match &node.data {
        NodeData::Text { contents } => is_blank(&contents.borrow()),
        NodeData::Element { name, .. } => {
            let tag: &str = &name.local;
            tag == "br" || tag == "hr" || (TRIMMABLE_BLOCKS.contains(&tag) && is_effectively_empty(node))
        }
        _ => false,
    }
}
