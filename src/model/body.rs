//! Email body representations consumed by extraction and splicing.

/// The authoritative content of a compose editor or message.
///
/// Exactly one representation is current at a time, matching the editor mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailBody {
    /// Plain-text editor mode.
    PlainText(String),
    /// HTML editor mode.
    Html(String),
}

impl EmailBody {
    /// `true` when the editor is in plain-text mode.
    pub fn is_plain_text(&self) -> bool {
        matches!(self, Self::PlainText(_))
    }

    /// Raw content regardless of mode.
    pub fn content(&self) -> &str {
        match self {
            Self::PlainText(s) | Self::Html(s) => s,
        }
    }
}

/// A read-only view over one node of a fetched message's MIME tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MimePart {
    /// Lowercase `type/subtype`, e.g. `"text/plain"` or `"multipart/alternative"`.
    pub mime_type: String,

    /// Decoded body for leaf text parts; `None` for containers and binary parts.
    pub body: Option<String>,

    /// Child parts, in message order.
    pub children: Vec<MimePart>,
}

impl MimePart {
    /// A leaf part with a decoded body.
    pub fn leaf(mime_type: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            body: Some(body.into()),
            children: Vec::new(),
        }
    }

    /// A container part (multipart or embedded message).
    pub fn container(mime_type: impl Into<String>, children: Vec<MimePart>) -> Self {
        Self {
            mime_type: mime_type.into(),
            body: None,
            children,
        }
    }

    /// `true` for `text/plain`.
    pub fn is_plain_text(&self) -> bool {
        self.mime_type.eq_ignore_ascii_case("text/plain")
    }

    /// `true` for `text/html`.
    pub fn is_html(&self) -> bool {
        self.mime_type.eq_ignore_ascii_case("text/html")
    }
}
