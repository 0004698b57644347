//! String splice: used when the compose body cannot be handled as a tree.
//!
//! The reply is escaped and prepended; empty markup at either end of the
//! result is trimmed with patterns instead of node inspection.

use std::io;
use std::sync::OnceLock;

use regex::Regex;

use crate::render::escape_html;

use super::{normalize_reply, SpliceStrategy, REPLY_CONTAINER_ATTR, REPLY_TEXT_ATTR};

/// Leading `<br>` / `<hr>` runs.
fn leading_breaks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*(?:<(?:br|hr)\b[^>]*>\s*)+").expect("valid regex"))
}

/// Leading `<p>` / `<div>` holding only whitespace, `&nbsp;`, `<br>` or comments.
fn leading_empty_blocks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?is)^\s*(?:<(p|div)\b[^>]*>(?:\s|&nbsp;|<br\s*/?>|<!--.*?-->)*</(?:p|div)>\s*)+",
        )
        .expect("valid regex")
    })
}

fn trailing_breaks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(?:\s*<(?:br|hr)\b[^>]*>)+\s*$").expect("valid regex"))
}

fn trailing_empty_blocks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?is)(?:\s*<(?:p|div)\b[^>]*>(?:\s|&nbsp;|<br\s*/?>|<!--.*?-->)*</(?:p|div)>)+\s*$",
        )
        .expect("valid regex")
    })
}

/// Splices by concatenating escaped reply markup with the original body.
pub struct StringSplice<'a> {
    original: &'a str,
}

impl<'a> StringSplice<'a> {
    pub fn new(original: &'a str) -> Self {
        Self { original }
    }

    /// Never fails; this is the last resort.
    pub fn splice_infallible(&self, reply: &str) -> String {
        let combined = format!("{}{}", reply_markup(reply), self.original);
        trim_empty_markup(&combined)
    }
}

impl SpliceStrategy for StringSplice<'_> {
    fn name(&self) -> &'static str {
        "string"
    }

    fn splice(&self, reply: &str) -> io::Result<String> {
        Ok(self.splice_infallible(reply))
    }
}

/// Same container the tree path builds, written out as escaped markup.
fn reply_markup(reply: &str) -> String {
    let lines: Vec<String> = normalize_reply(reply)
        .split('\n')
        .map(escape_html)
        .collect();
    format!(
        "<div {REPLY_CONTAINER_ATTR}=\"true\" style=\"margin:0;\">\
<span {REPLY_TEXT_ATTR}=\"\" style=\"display:block;margin:0;padding:0;\">{}</span></div>",
        lines.join("<br>")
    )
}

/// Strip empty breaks and blocks from both ends until nothing changes.
fn trim_empty_markup(html: &str) -> String {
    let mut current = html.to_string();
    loop {
        let next = [
            leading_breaks(),
            leading_empty_blocks(),
            trailing_breaks(),
            trailing_empty_blocks(),
        ]
        .iter()
        .fold(current.clone(), |acc, re| re.replace(&acc, "").into_owned());

        if next == current {
            return current;
        }
        current = next;
    }
}
