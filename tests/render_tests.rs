//! Integration tests for summary rendering.

use std::path::Path;

use pretty_assertions::assert_eq;

use mailscribe::render::{parse_blocks, render, MarkdownBlock};

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture(name)).unwrap()
}

// ─── Full summary document ──────────────────────────────────────────

#[test]
fn test_render_summary_fixture() {
    let html = render(&read_fixture("summary.md"));

    assert!(html.starts_with("<h2 class=\"summary-heading\">Key points</h2><ul>"));
    assert!(html.contains("<li>Lunch is <strong>Friday</strong> at noon</li>"));
    assert!(html.contains("<li>Reply by <em>Thursday</em></li>"));
    assert!(html.contains(
        "<a href=\"https://example.com/agenda\" target=\"_blank\" rel=\"noreferrer noopener\">doc</a>"
    ));
    assert!(html.contains("<ol><li>Book a table</li><li>Confirm with <code>Carol</code></li></ol>"));
    assert!(html.contains("<blockquote>Please don&#39;t be late</blockquote>"));
    assert!(html.contains("<hr class=\"summary-rule\">"));
    assert!(html.ends_with("<p>Thanks &lt;script&gt;alert(1)&lt;/script&gt;</p>"));
}

#[test]
fn test_render_summary_fixture_blocks() {
    let blocks = parse_blocks(&read_fixture("summary.md"));
    assert_eq!(
        blocks.first(),
        Some(&MarkdownBlock::Heading {
            level: 2,
            text: "Key points".into()
        })
    );
    assert_eq!(
        blocks
            .iter()
            .filter(|b| matches!(b, MarkdownBlock::ListItem { .. }))
            .count(),
        5
    );
    assert!(blocks.contains(&MarkdownBlock::Rule));
}

// ─── Link safety ────────────────────────────────────────────────────

#[test]
fn test_no_anchor_without_web_scheme() {
    let inputs = [
        "[x](javascript:alert(1))",
        "[x](JAVASCRIPT:alert(1))",
        "[x](data:text/html;base64,PHNjcmlwdD4=)",
        "[x](vbscript:msgbox)",
        "[x](//evil.example.com)",
        "[x](ftp://example.com)",
        "[**x**](mailto:a@example.com)",
        "<a href=\"javascript:alert(1)\">x</a>",
    ];
    for input in inputs {
        let html = render(input);
        assert!(!html.contains("<a "), "{input} -> {html}");
    }
}

#[test]
fn test_web_anchor_case_insensitive_scheme() {
    let html = render("see [site](HTTPS://Example.com/a_b__c__d)");
    assert_eq!(
        html,
        "<p>see <a href=\"HTTPS://Example.com/a_b__c__d\" target=\"_blank\" rel=\"noreferrer noopener\">site</a></p>"
    );
}

// ─── Escaping ───────────────────────────────────────────────────────

#[test]
fn test_raw_html_never_executes() {
    for input in [
        "<script>alert(1)</script>",
        "- <img src=x onerror=alert(1)>",
        "# <iframe src=\"https://evil\"></iframe>",
        "`<script>`",
        "**<b onclick=\"x()\">hi</b>**",
    ] {
        let html = render(input);
        assert!(!html.contains("<script"), "{input} -> {html}");
        assert!(!html.contains("<img"), "{input} -> {html}");
        assert!(!html.contains("<iframe"), "{input} -> {html}");
        assert!(!html.contains("<b "), "{input} -> {html}");
    }
}

#[test]
fn test_code_span_keeps_literal_markup() {
    assert_eq!(
        render("run `a **b** <c>`"),
        "<p>run <code>a **b** &lt;c&gt;</code></p>"
    );
}

// ─── Block structure ────────────────────────────────────────────────

#[test]
fn test_paragraph_lines_joined_with_space() {
    assert_eq!(render("one\ntwo\r\nthree"), "<p>one two three</p>");
}

#[test]
fn test_deep_heading_clamped() {
    assert_eq!(
        render("###### Small"),
        "<h4 class=\"summary-heading\">Small</h4>"
    );
}

#[test]
fn test_list_kind_switch_closes_list() {
    assert_eq!(
        render("- a\n1. b\n- c"),
        "<ul><li>a</li></ul><ol><li>b</li></ol><ul><li>c</li></ul>"
    );
}
