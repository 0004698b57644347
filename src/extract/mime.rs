//! Raw RFC 5322 message → [`MimePart`] tree, via `mail-parser`.

use mail_parser::{Message, MessageParser, MimeHeaders, PartType};

use crate::error::{Result, ScribeError};
use crate::model::body::MimePart;

use super::PlainTextSource;

/// Maximum depth for recursive multipart descent (adversarial nesting guard).
const MAX_DEPTH: usize = 10;

/// Parse a complete raw message (headers + body) into a MIME tree.
///
/// Returns `None` when `mail-parser` cannot make sense of the input.
pub fn parse_mime_tree(raw_message: &[u8]) -> Option<MimePart> {
    let message_bytes = skip_from_line(raw_message);
    let parsed = MessageParser::default().parse(message_bytes)?;
    Some(part_tree(&parsed, 0, 0))
}

impl MimePart {
    /// See [`parse_mime_tree`].
    pub fn from_raw_message(raw_message: &[u8]) -> Option<Self> {
        parse_mime_tree(raw_message)
    }
}

/// Extract prompt text from a raw message.
///
/// Tries the MIME tree first, then everything after the header block.
/// Fails with [`ScribeError::ContentUnavailable`] when both are empty.
pub fn extract_message_text(raw_message: &[u8]) -> Result<String> {
    if let Some(tree) = parse_mime_tree(raw_message) {
        let text = tree.plain_text();
        if !text.trim().is_empty() {
            return Ok(text);
        }
        tracing::debug!(mime_type = %tree.mime_type, "MIME tree yielded no text");
    }

    let fallback = extract_body_fallback(skip_from_line(raw_message));
    if fallback.trim().is_empty() {
        return Err(ScribeError::ContentUnavailable(
            "no text/plain or text/html part found".to_string(),
        ));
    }
    tracing::warn!("Using raw body fallback for message text");
    Ok(fallback)
}

/// Build the subtree rooted at part `id` of `msg`.
fn part_tree(msg: &Message<'_>, id: usize, depth: usize) -> MimePart {
    let Some(part) = msg.parts.get(id) else {
        return MimePart::default();
    };

    let declared = part.content_type().map(|ct| match ct.subtype() {
        Some(sub) => format!("{}/{}", ct.ctype(), sub).to_ascii_lowercase(),
        None => ct.ctype().to_ascii_lowercase(),
    });

    match &part.body {
        PartType::Text(text) => {
            MimePart::leaf(declared.unwrap_or_else(|| "text/plain".into()), text.to_string())
        }
        PartType::Html(html) => {
            MimePart::leaf(declared.unwrap_or_else(|| "text/html".into()), html.to_string())
        }
        PartType::Binary(_) | PartType::InlineBinary(_) => MimePart {
            mime_type: declared.unwrap_or_else(|| "application/octet-stream".into()),
            body: None,
            children: Vec::new(),
        },
        PartType::Message(inner) => {
            let children = if depth < MAX_DEPTH {
                vec![part_tree(inner, 0, depth + 1)]
            } else {
                Vec::new()
            };
            MimePart::container(declared.unwrap_or_else(|| "message/rfc822".into()), children)
        }
        PartType::Multipart(ids) => {
            let children = if depth < MAX_DEPTH {
                ids.iter()
                    .map(|&child| part_tree(msg, child, depth + 1))
                    .collect()
            } else {
                tracing::warn!(depth, "MIME nesting too deep, ignoring children");
                Vec::new()
            };
            MimePart::container(declared.unwrap_or_else(|| "multipart/mixed".into()), children)
        }
    }
}

/// Skip a UTF-8 BOM and the mbox `From ` separator line, if present.
fn skip_from_line(data: &[u8]) -> &[u8] {
    let data = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data);

    if data.starts_with(b"From ") {
        if let Some(pos) = data.iter().position(|&b| b == b'\n') {
            return &data[pos + 1..];
        }
    }
    data
}

/// Everything after the first blank line, when `mail-parser` gave up.
fn extract_body_fallback(data: &[u8]) -> String {
    let text = String::from_utf8_lossy(data);
    if let Some(pos) = text.find("\r\n\r\n") {
        text[pos + 4..].to_string()
    } else if let Some(pos) = text.find("\n\n") {
        text[pos + 2..].to_string()
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALTERNATIVE: &[u8] = b"From: alice@example.com\r\n\
Subject: Lunch\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
\r\n\
--b1\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Lunch at noon?\r\n\
--b1\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<p>Lunch at <b>noon</b>?</p>\r\n\
--b1--\r\n";

    #[test]
    fn test_skip_from_line() {
        let data = b"From user@example.com Thu Jan 01 00:00:00 2024\nSubject: Test\n\nBody\n";
        assert!(skip_from_line(data).starts_with(b"Subject:"));
    }

    #[test]
    fn test_skip_from_line_no_from() {
        let data = b"Subject: Test\n\nBody\n";
        assert_eq!(skip_from_line(data), data);
    }

    #[test]
    fn test_parse_mime_tree_alternative() {
        let tree = MimePart::from_raw_message(ALTERNATIVE).expect("parsed");
        assert_eq!(tree.mime_type, "multipart/alternative");
        assert_eq!(tree.children.len(), 2);
        assert!(tree.children[0].is_plain_text());
        assert!(tree.children[1].is_html());
    }

    #[test]
    fn test_extract_message_text_joins_alternatives() {
        let text = extract_message_text(ALTERNATIVE).expect("text");
        assert!(text.contains("Lunch at noon?"));
        assert!(text.contains("\n\n"));
        assert!(!text.contains("<b>"));
    }

    #[test]
    fn test_single_part_plain_message() {
        let raw = b"Subject: Hi\nContent-Type: text/plain\n\nJust text\n";
        let text = extract_message_text(raw).expect("text");
        assert_eq!(text.trim(), "Just text");
    }

    #[test]
    fn test_extract_body_fallback() {
        assert_eq!(extract_body_fallback(b"A: b\n\nrest"), "rest");
        assert_eq!(extract_body_fallback(b"no blank line"), "");
    }
}
