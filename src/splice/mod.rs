//! Insert a generated reply into an existing compose body.
//!
//! HTML bodies go through one of two [`SpliceStrategy`] implementations:
//! [`TreeSplice`] when the document parses into a tree with a `<body>`,
//! otherwise [`StringSplice`]. The choice is made by probing the input up
//! front; the caller only sees a [`Spliced`] value and an optional warning.

pub mod string;
pub mod tree;

use std::io;

use crate::error::ParseFallbackWarning;
use crate::model::body::EmailBody;

pub use string::StringSplice;
pub use tree::{AnchorKind, SpliceAnchor, TreeSplice};

/// Marks the element wrapping our inserted reply.
pub const REPLY_CONTAINER_ATTR: &str = "data-ai-reply";
/// Marks the element holding the reply's lines.
pub const REPLY_TEXT_ATTR: &str = "data-ai-reply-text";

/// How many empty siblings directly above the reply may be removed.
pub const MAX_EMPTY_SIBLINGS_REMOVED: usize = 3;

/// One way of splicing a reply into an HTML body.
pub trait SpliceStrategy {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Return the new body markup with `reply` inserted.
    fn splice(&self, reply: &str) -> io::Result<String>;
}

/// Result of an HTML splice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spliced {
    /// New body markup.
    pub body: String,
    /// Set when the string fallback was used.
    pub warning: Option<ParseFallbackWarning>,
}

/// Splice `generated` into whichever representation `body` is.
pub fn splice_body(body: &EmailBody, generated: &str) -> (EmailBody, Option<ParseFallbackWarning>) {
    match body {
        EmailBody::PlainText(text) => (EmailBody::PlainText(splice_text(text, generated)), None),
        EmailBody::Html(html) => {
            let spliced = splice_html(html, generated);
            (EmailBody::Html(spliced.body), spliced.warning)
        }
    }
}

/// Plain-text mode: reply, one newline, then the original body.
pub fn splice_text(compose_body: &str, generated: &str) -> String {
    format!("{}\n{}", generated.trim(), compose_body.trim_start())
}

/// HTML mode: insert the reply above the signature/quote of `original`.
pub fn splice_html(original: &str, generated: &str) -> Spliced {
    let fallback = |reason: String| {
        tracing::warn!(%reason, "Falling back to string splice");
        Spliced {
            body: StringSplice::new(original).splice_infallible(generated),
            warning: Some(ParseFallbackWarning { reason }),
        }
    };

    let tree = match TreeSplice::probe(original) {
        Ok(tree) => tree,
        Err(reason) => return fallback(reason),
    };

    match tree.splice(generated) {
        Ok(body) => {
            tracing::debug!(strategy = tree.name(), "Reply spliced");
            Spliced {
                body,
                warning: None,
            }
        }
        Err(e) => fallback(format!("serialization failed: {e}")),
    }
}

/// CRLF → LF, then trim.
pub(crate) fn normalize_reply(text: &str) -> String {
    text.replace("\r\n", "\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splice_text() {
        assert_eq!(
            splice_text("\n\n> quoted\nSig", "  Thanks!\n\n"),
            "Thanks!\n> quoted\nSig"
        );
    }

    #[test]
    fn test_splice_text_empty_body() {
        assert_eq!(splice_text("", "Hi"), "Hi\n");
    }

    #[test]
    fn test_splice_body_dispatches_on_mode() {
        let (plain, warning) = splice_body(&EmailBody::PlainText("orig".into()), "new");
        assert_eq!(plain, EmailBody::PlainText("new\norig".into()));
        assert!(warning.is_none());

        let (html, _) = splice_body(&EmailBody::Html("<p>orig</p>".into()), "new");
        assert!(matches!(html, EmailBody::Html(ref s) if s.contains(REPLY_CONTAINER_ATTR)));
    }

    #[test]
    fn test_frameset_uses_string_fallback() {
        let original = "<frameset><frame src=\"a.html\"></frameset>";
        let spliced = splice_html(original, "Hello");
        assert!(spliced.warning.is_some());
        assert!(spliced.body.contains("Hello"));
        assert!(spliced.body.ends_with(original));
    }

    #[test]
    fn test_normalize_reply() {
        assert_eq!(normalize_reply("\r\n a\r\nb \r\n"), "a\nb");
    }
}
