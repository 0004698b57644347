//! Markdown-subset → sanitized HTML, for on-screen summaries.
//!
//! Two stages: [`block::parse_blocks`] decides block structure line by line,
//! then [`inline::format_inline`] formats each block's text. The assembled
//! markup goes through [`sanitize::sanitize_html`] before it is returned.

pub mod block;
pub mod inline;
pub mod sanitize;

pub use block::{parse_blocks, MarkdownBlock};
pub use inline::{escape_html, format_inline};
pub use sanitize::sanitize_html;

/// Render model output as sanitized HTML.
pub fn render(markdown: &str) -> String {
    if markdown.trim().is_empty() {
        return String::new();
    }
    let blocks = parse_blocks(markdown);
    tracing::debug!(blocks = blocks.len(), "Parsed summary markdown");
    sanitize_html(&blocks_to_html(&blocks))
}

/// Assemble blocks into markup, wrapping runs of list items in one list.
pub fn blocks_to_html(blocks: &[MarkdownBlock]) -> String {
    let mut html = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in blocks {
        if let MarkdownBlock::ListItem {
            ordered,
            text,
            opens_list,
        } = block
        {
            let tag = if *ordered { "ol" } else { "ul" };
            if *opens_list || open_list != Some(tag) {
                close_list(&mut html, &mut open_list);
                html.push_str(&format!("<{tag}>"));
                open_list = Some(tag);
            }
            html.push_str(&format!("<li>{}</li>", format_inline(text)));
            continue;
        }

        close_list(&mut html, &mut open_list);
        match block {
            MarkdownBlock::Heading { level, text } => {
                let level = (*level).clamp(1, 4);
                html.push_str(&format!(
                    "<h{level} class=\"summary-heading\">{}</h{level}>",
                    format_inline(text)
                ));
            }
            MarkdownBlock::Paragraph(text) => {
                html.push_str(&format!("<p>{}</p>", format_inline(text)));
            }
            MarkdownBlock::Blockquote(text) => {
                html.push_str(&format!("<blockquote>{}</blockquote>", format_inline(text)));
            }
            MarkdownBlock::Rule => html.push_str("<hr class=\"summary-rule\">"),
            MarkdownBlock::ListItem { .. } => {}
        }
    }

    close_list(&mut html, &mut open_list);
    html
}

fn close_list(html: &mut String, open_list: &mut Option<&'static str>) {
    if let Some(tag) = open_list.take() {
        html.push_str(&format!("</{tag}>"));
    }
}
