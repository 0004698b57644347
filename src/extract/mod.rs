//! Plain-text extraction from HTML bodies and MIME trees, for prompting.
//!
//! Extraction never fails: malformed input degrades to best-effort text and,
//! as a last resort, to an empty string.

pub mod html;
pub mod mime;

use crate::model::body::{EmailBody, MimePart};

pub use html::html_to_text;
pub use mime::{extract_message_text, parse_mime_tree};

/// Anything that can be flattened into prompt text.
pub trait PlainTextSource {
    /// Flatten into plain text.
    fn plain_text(&self) -> String;
}

impl PlainTextSource for EmailBody {
    fn plain_text(&self) -> String {
        match self {
            EmailBody::PlainText(text) => text.clone(),
            EmailBody::Html(html) => html_to_text(html),
        }
    }
}

impl PlainTextSource for MimePart {
    /// Text leaves answer directly; containers join their non-empty
    /// children with a blank line. Children are only visited when the
    /// part itself carries no body.
    fn plain_text(&self) -> String {
        if let Some(body) = &self.body {
            if self.is_plain_text() {
                return body.clone();
            }
            if self.is_html() {
                return html_to_text(body);
            }
            return String::new();
        }

        self.children
            .iter()
            .map(PlainTextSource::plain_text)
            .filter(|text| !text.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Flatten an [`EmailBody`] or [`MimePart`] into plain text.
pub fn extract_plain_text<S: PlainTextSource + ?Sized>(source: &S) -> String {
    source.plain_text()
}

/// Decode bytes read from disk: UTF-8 (BOM stripped), else Windows-1252.
pub fn decode_text_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_body_passes_through() {
        let body = EmailBody::PlainText("  Hello <b>there</b>\n".into());
        assert_eq!(extract_plain_text(&body), "  Hello <b>there</b>\n");
    }

    #[test]
    fn test_html_body_is_stripped() {
        let body = EmailBody::Html("<div><p>Hello <b>there</b></p></div>".into());
        assert_eq!(extract_plain_text(&body), "Hello there");
    }

    #[test]
    fn test_multipart_joins_children_with_blank_line() {
        let tree = MimePart::container(
            "multipart/mixed",
            vec![
                MimePart::leaf("text/plain", "First"),
                MimePart::leaf("text/html", "<p>Second</p>"),
            ],
        );
        assert_eq!(extract_plain_text(&tree), "First\n\nSecond");
    }

    #[test]
    fn test_skips_binary_and_empty_children() {
        let tree = MimePart::container(
            "multipart/mixed",
            vec![
                MimePart::container("image/png", Vec::new()),
                MimePart::leaf("text/plain", "   "),
                MimePart::leaf("application/pdf", "%PDF"),
                MimePart::leaf("text/plain", "Body"),
            ],
        );
        assert_eq!(extract_plain_text(&tree), "Body");
    }

    #[test]
    fn test_leaf_body_shadows_children() {
        let part = MimePart {
            mime_type: "text/plain".into(),
            body: Some("leaf".into()),
            children: vec![MimePart::leaf("text/plain", "child")],
        };
        assert_eq!(extract_plain_text(&part), "leaf");
    }

    #[test]
    fn test_nested_multipart() {
        let tree = MimePart::container(
            "multipart/mixed",
            vec![MimePart::container(
                "multipart/alternative",
                vec![MimePart::leaf("text/plain", "inner")],
            )],
        );
        assert_eq!(extract_plain_text(&tree), "inner");
    }

    #[test]
    fn test_decode_text_bytes_windows_1252() {
        assert_eq!(decode_text_bytes(b"M\xfcller"), "Müller");
        assert_eq!(decode_text_bytes(b"\xEF\xBB\xBFplain"), "plain");
    }
}
