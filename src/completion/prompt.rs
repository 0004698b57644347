//! Conversation construction for the two tasks.
//!
//! The system message always comes first.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::chat::ChatMessage;

use super::language::language_directive;

const REPLY_SYSTEM_PROMPT: &str = "You are a helpful email assistant. \
Draft a clear, polite, and concise reply. \
Use the same language as the original email. \
Write only the reply text. \
Do not include quoted text, signatures, or placeholders, \
and do not end with generic offers of further help.";

const SUMMARY_SYSTEM_PROMPT: &str = "You are a helpful email assistant. \
Summarize the email as a short list of bullet points covering the key facts, \
requests, decisions and deadlines. Do not invent details. \
Use markdown only for headings, lists, emphasis, code and links.";

/// How the summary should read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStyle {
    #[default]
    Balanced,
    Concise,
    Detailed,
    Outline,
}

impl SummaryStyle {
    pub const ALL: &'static [SummaryStyle] = &[
        SummaryStyle::Balanced,
        SummaryStyle::Concise,
        SummaryStyle::Detailed,
        SummaryStyle::Outline,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Concise => "concise",
            Self::Detailed => "detailed",
            Self::Outline => "outline",
        }
    }

    /// Instruction fragment appended to the summary system prompt.
    pub fn instruction(self) -> &'static str {
        match self {
            Self::Balanced => "Keep it balanced: three to six bullets, one sentence each.",
            Self::Concise => "Be very concise: at most three short bullets.",
            Self::Detailed => {
                "Be thorough: include every relevant detail, names, dates and figures, \
                 grouped under short headings when helpful."
            }
            Self::Outline => {
                "Write a structured outline with headings for each topic and nested points \
                 as separate bullets."
            }
        }
    }
}

impl fmt::Display for SummaryStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummaryStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|style| style.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown summary style '{s}'"))
    }
}

fn instruction_prefix(instruction: Option<&str>) -> String {
    match instruction.map(str::trim) {
        Some(p) if !p.is_empty() => format!("Instruction: {p}\n\n"),
        _ => String::new(),
    }
}

/// System + user messages for drafting a reply to `original_text`.
pub fn reply_messages(instruction: Option<&str>, original_text: &str) -> Vec<ChatMessage> {
    let user = format!(
        "{}Original email content (quoted below in the compose editor):\n\n{}",
        instruction_prefix(instruction),
        original_text
    );
    vec![ChatMessage::system(REPLY_SYSTEM_PROMPT), ChatMessage::user(user)]
}

/// System + user messages for summarizing `content`.
pub fn summary_messages(
    instruction: Option<&str>,
    content: &str,
    language: &str,
    style: SummaryStyle,
) -> Vec<ChatMessage> {
    let system = format!(
        "{SUMMARY_SYSTEM_PROMPT} {} {}",
        style.instruction(),
        language_directive(language)
    );
    let user = format!(
        "{}Email content:\n\n{}",
        instruction_prefix(instruction),
        normalize_input(content)
    );
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// CRLF → LF, runs of blank lines collapsed to one, outer whitespace trimmed.
pub fn normalize_input(text: &str) -> String {
    static BLANK_RUNS: OnceLock<Regex> = OnceLock::new();
    let re = BLANK_RUNS.get_or_init(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("valid regex"));

    let unix = text.replace("\r\n", "\n");
    re.replace_all(&unix, "\n\n").trim().to_string()
}
