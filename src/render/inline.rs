//! Inline formatting: code spans, links, bold and italics.
//!
//! The pass order is fixed. Escaping runs first so nothing from the model can
//! become markup; code spans and finished anchors are parked behind
//! placeholders so later rules cannot reach into them.

use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Placeholder delimiters from the Private Use Area. Stripped from input, so
/// they never collide with model text or with the `__bold__` rule.
const PH_OPEN: char = '\u{E000}';
const PH_CLOSE: char = '\u{E001}';

/// Escape the HTML-significant characters `& < > " '`.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 8);
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            PH_OPEN | PH_CLOSE => {}
            _ => out.push(ch),
        }
    }
    out
}

/// Escape raw block text, then apply the inline rules.
pub fn format_inline(text: &str) -> String {
    let escaped = escape_html(text);

    let mut codes: Vec<String> = Vec::new();
    let parked = code_span_re().replace_all(&escaped, |caps: &Captures<'_>| {
        codes.push(caps[1].to_string());
        placeholder('C', codes.len() - 1)
    });

    let mut anchors: Vec<String> = Vec::new();
    let linked = link_re().replace_all(&parked, |caps: &Captures<'_>| {
        let label = format_emphasis(&caps[1]);
        let url = restore(caps[2].trim(), 'C', &codes, |code| format!("`{code}`"));
        if !is_web_url(&url) {
            return label;
        }
        anchors.push(format!(
            "<a href=\"{url}\" target=\"_blank\" rel=\"noreferrer noopener\">{label}</a>"
        ));
        placeholder('A', anchors.len() - 1)
    });

    let formatted = format_emphasis(&linked);
    let formatted = restore(&formatted, 'A', &anchors, |a| a.to_string());
    restore(&formatted, 'C', &codes, |code| format!("<code>{code}</code>"))
}

/// `true` when the URL scheme is literally `http://` or `https://`.
pub fn is_web_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Bold (`**x**`, `__x__`) then single-star italics.
fn format_emphasis(input: &str) -> String {
    let bolded = bold_star_re().replace_all(input, "<strong>$1</strong>");
    let bolded = bold_underscore_re().replace_all(&bolded, "<strong>$1</strong>");
    apply_italics(&bolded)
}

/// `*text*` where neither delimiter touches another `*` and the body holds
/// no `*` or newline.
fn apply_italics(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 16);
    let mut i = 0;

    while i < chars.len() {
        let opens = chars[i] == '*'
            && (i == 0 || chars[i - 1] != '*')
            && chars.get(i + 1).is_some_and(|&c| c != '*' && c != '\n');

        if opens {
            let close = chars[i + 1..]
                .iter()
                .position(|&c| c == '*' || c == '\n')
                .map(|offset| i + 1 + offset);
            if let Some(j) = close {
                if chars[j] == '*' && chars.get(j + 1) != Some(&'*') {
                    out.push_str("<em>");
                    out.extend(&chars[i + 1..j]);
                    out.push_str("</em>");
                    i = j + 1;
                    continue;
                }
            }
        }

        out.push(chars[i]);
        i += 1;
    }
    out
}

fn placeholder(kind: char, index: usize) -> String {
    format!("{PH_OPEN}{kind}{index}{PH_CLOSE}")
}

/// Swap every `kind` placeholder back, rendering the stored value with `render`.
fn restore(input: &str, kind: char, stored: &[String], render: impl Fn(&str) -> String) -> String {
    if stored.is_empty() {
        return input.to_string();
    }
    let mut out = input.to_string();
    for (index, value) in stored.iter().enumerate() {
        out = out.replace(&placeholder(kind, index), &render(value));
    }
    out
}

// ── Patterns ────────────────────────────────────────────────────

fn code_span_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"`([^`]+?)`").expect("valid regex"))
}

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid regex"))
}

fn bold_star_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid regex"))
}

fn bold_underscore_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"__(.+?)__").expect("valid regex"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_italic_code() {
        assert_eq!(
            format_inline("**bold** and *italic* and `code`"),
            "<strong>bold</strong> and <em>italic</em> and <code>code</code>"
        );
    }

    #[test]
    fn test_underscore_bold() {
        assert_eq!(format_inline("__x__ y"), "<strong>x</strong> y");
    }

    #[test]
    fn test_escapes_markup() {
        assert_eq!(
            format_inline("<script>alert(\"x\")</script> & 'q'"),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#39;q&#39;"
        );
    }

    #[test]
    fn test_code_span_protects_emphasis() {
        assert_eq!(
            format_inline("`**not bold**` and `<b>`"),
            "<code>**not bold**</code> and <code>&lt;b&gt;</code>"
        );
    }

    #[test]
    fn test_https_link() {
        assert_eq!(
            format_inline("see [the **docs**](https://example.com/a?b=1&c=2)"),
            "see <a href=\"https://example.com/a?b=1&amp;c=2\" target=\"_blank\" \
             rel=\"noreferrer noopener\">the <strong>docs</strong></a>"
        );
    }

    #[test]
    fn test_link_url_is_not_emphasized() {
        let html = format_inline("[x](https://example.com/__init__/*a*)");
        assert!(html.contains("href=\"https://example.com/__init__/*a*\""));
    }

    #[test]
    fn test_non_web_links_keep_label_only() {
        // The target ends at the first `)`, so the second one stays as text.
        assert_eq!(format_inline("[click](javascript:alert(1))"), "click)");
        assert_eq!(format_inline("[img](data:text/html;base64,xx)"), "img");
        assert_eq!(format_inline("[rel](/relative/path)"), "rel");
    }

    #[test]
    fn test_uppercase_scheme_accepted() {
        assert!(format_inline("[a](HTTPS://EXAMPLE.COM)").starts_with("<a href=\"HTTPS://EXAMPLE.COM\""));
    }

    #[test]
    fn test_italics_not_confused_with_stars() {
        assert_eq!(apply_italics("a * b * c"), "a <em> b </em> c");
        assert_eq!(apply_italics("*a**"), "*a**");
        assert_eq!(apply_italics("2*3"), "2*3");
        assert_eq!(apply_italics("*x*y*"), "<em>x</em>y*");
    }

    #[test]
    fn test_placeholder_chars_in_input_are_dropped() {
        assert_eq!(format_inline("a\u{E000}C0\u{E001}b `c`"), "aC0b <code>c</code>");
    }
}
