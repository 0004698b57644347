//! Line-oriented block scan for the markdown subset models emit.
//!
//! Block structure is decided on whole lines before any inline formatting
//! runs, so list/heading/quote detection never needs lookahead.

/// One block of a rendered summary, in document order. Blocks never nest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkdownBlock {
    /// `#`..`######` heading; level is capped at 4.
    Heading { level: u8, text: String },
    /// Consecutive text lines joined with single spaces.
    Paragraph(String),
    /// A bullet (`-`, `*`, `+`) or numbered (`1.`) item.
    ///
    /// `opens_list` is set when the item cannot continue the previous list:
    /// the list kind changed, or a blank line or other block intervened.
    ListItem {
        ordered: bool,
        text: String,
        opens_list: bool,
    },
    /// A `>` line.
    Blockquote(String),
    /// `---`, `***` or `___` (three or more).
    Rule,
}

/// Scan `markdown` into blocks. CRLF is normalized first.
pub fn parse_blocks(markdown: &str) -> Vec<MarkdownBlock> {
    let normalized = markdown.replace("\r\n", "\n");
    let mut scanner = BlockScanner::default();
    for line in normalized.split('\n') {
        scanner.push_line(line);
    }
    scanner.finish()
}

#[derive(Default)]
struct BlockScanner {
    blocks: Vec<MarkdownBlock>,
    paragraph: Vec<String>,
    /// Kind of the list currently open (`Some(ordered)`), if any.
    open_list: Option<bool>,
}

impl BlockScanner {
    fn push_line(&mut self, raw: &str) {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.flush_paragraph();
            self.open_list = None;
            return;
        }

        if let Some((level, text)) = heading(raw) {
            self.close_all();
            self.blocks.push(MarkdownBlock::Heading {
                level: level.min(4),
                text: text.trim().to_string(),
            });
        } else if is_rule(trimmed) {
            self.close_all();
            self.blocks.push(MarkdownBlock::Rule);
        } else if let Some(text) = blockquote(raw) {
            self.close_all();
            self.blocks.push(MarkdownBlock::Blockquote(text.trim().to_string()));
        } else if let Some(text) = bullet_item(raw) {
            self.push_item(false, text);
        } else if let Some(text) = numbered_item(raw) {
            self.push_item(true, text);
        } else {
            self.open_list = None;
            self.paragraph.push(trimmed.to_string());
        }
    }

    fn push_item(&mut self, ordered: bool, text: &str) {
        self.flush_paragraph();
        let opens_list = self.open_list != Some(ordered);
        self.open_list = Some(ordered);
        self.blocks.push(MarkdownBlock::ListItem {
            ordered,
            text: text.trim().to_string(),
            opens_list,
        });
    }

    fn close_all(&mut self) {
        self.flush_paragraph();
        self.open_list = None;
    }

    fn flush_paragraph(&mut self) {
        if self.paragraph.is_empty() {
            return;
        }
        let combined = self.paragraph.join(" ");
        let combined = combined.trim();
        if !combined.is_empty() {
            self.blocks.push(MarkdownBlock::Paragraph(combined.to_string()));
        }
        self.paragraph.clear();
    }

    fn finish(mut self) -> Vec<MarkdownBlock> {
        self.close_all();
        self.blocks
    }
}

// ── Line classifiers ────────────────────────────────────────────

/// `^\s*#{1,6}\s+(.*)$`
fn heading(raw: &str) -> Option<(u8, &str)> {
    let line = raw.trim_start();
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some((hashes as u8, rest.trim_start()))
}

/// Three or more of the same rule character and nothing else.
fn is_rule(trimmed: &str) -> bool {
    let Some(first) = trimmed.chars().next() else {
        return false;
    };
    matches!(first, '-' | '*' | '_')
        && trimmed.chars().count() >= 3
        && trimmed.chars().all(|c| c == first)
}

/// `^\s*>\s?(.*)$`
fn blockquote(raw: &str) -> Option<&str> {
    let rest = raw.trim_start().strip_prefix('>')?;
    Some(rest.strip_prefix(char::is_whitespace).unwrap_or(rest))
}

/// `^\s*[-*+]\s+(.*)$`
fn bullet_item(raw: &str) -> Option<&str> {
    let rest = raw.trim_start().strip_prefix(['-', '*', '+'])?;
    rest.starts_with(char::is_whitespace).then(|| rest.trim_start())
}

/// `^\s*\d+\.\s+(.*)$`
fn numbered_item(raw: &str) -> Option<&str> {
    let line = raw.trim_start();
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix('.')?;
    rest.starts_with(char::is_whitespace).then(|| rest.trim_start())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(ordered: bool, text: &str, opens_list: bool) -> MarkdownBlock {
        MarkdownBlock::ListItem {
            ordered,
            text: text.to_string(),
            opens_list,
        }
    }

    #[test]
    fn test_paragraph_lines_joined_with_space() {
        let blocks = parse_blocks("first line\n  second line  \n\nnext");
        assert_eq!(
            blocks,
            vec![
                MarkdownBlock::Paragraph("first line second line".into()),
                MarkdownBlock::Paragraph("next".into()),
            ]
        );
    }

    #[test]
    fn test_heading_levels_capped_at_four() {
        let blocks = parse_blocks("# One\n###### Six\n####### Seven");
        assert_eq!(
            blocks,
            vec![
                MarkdownBlock::Heading { level: 1, text: "One".into() },
                MarkdownBlock::Heading { level: 4, text: "Six".into() },
                MarkdownBlock::Paragraph("####### Seven".into()),
            ]
        );
    }

    #[test]
    fn test_heading_requires_space() {
        assert_eq!(
            parse_blocks("#hashtag"),
            vec![MarkdownBlock::Paragraph("#hashtag".into())]
        );
    }

    #[test]
    fn test_rules() {
        let blocks = parse_blocks("---\n***\n___\n-- \n- - -");
        assert_eq!(blocks[0], MarkdownBlock::Rule);
        assert_eq!(blocks[1], MarkdownBlock::Rule);
        assert_eq!(blocks[2], MarkdownBlock::Rule);
        assert_eq!(blocks[3], MarkdownBlock::Paragraph("--".into()));
        assert_eq!(blocks[4], item(false, "- -", true));
    }

    #[test]
    fn test_blockquote_strips_marker() {
        assert_eq!(
            parse_blocks(">quoted\n>  spaced "),
            vec![
                MarkdownBlock::Blockquote("quoted".into()),
                MarkdownBlock::Blockquote("spaced".into()),
            ]
        );
    }

    #[test]
    fn test_list_grouping_and_kind_switch() {
        let blocks = parse_blocks("- a\n- b\n\n1. c\n2. d");
        assert_eq!(
            blocks,
            vec![
                item(false, "a", true),
                item(false, "b", false),
                item(true, "c", true),
                item(true, "d", false),
            ]
        );
    }

    #[test]
    fn test_blank_line_closes_list() {
        let blocks = parse_blocks("* a\n\n+ b");
        assert_eq!(blocks, vec![item(false, "a", true), item(false, "b", true)]);
    }

    #[test]
    fn test_paragraph_between_items_closes_list() {
        let blocks = parse_blocks("- a\ntext\n- b");
        assert_eq!(
            blocks,
            vec![
                item(false, "a", true),
                MarkdownBlock::Paragraph("text".into()),
                item(false, "b", true),
            ]
        );
    }

    #[test]
    fn test_crlf_normalized() {
        assert_eq!(
            parse_blocks("# T\r\nbody\r\n"),
            vec![
                MarkdownBlock::Heading { level: 1, text: "T".into() },
                MarkdownBlock::Paragraph("body".into()),
            ]
        );
    }

    #[test]
    fn test_numbered_needs_dot_and_space() {
        assert_eq!(
            parse_blocks("2024 was good\n3.5 stars"),
            vec![MarkdownBlock::Paragraph("2024 was good 3.5 stars".into())]
        );
    }
}
