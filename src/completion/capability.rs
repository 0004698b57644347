//! Which sampling parameters a model family accepts.
//!
//! Families are rows in [`FAMILIES`]; a model that matches no row accepts
//! every parameter. Adding a restricted family means adding a row.

use std::sync::OnceLock;

use regex::Regex;

/// An optional field of the completion payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingParam {
    Temperature,
    TopP,
    MaxTokens,
    PresencePenalty,
    FrequencyPenalty,
}

impl SamplingParam {
    pub const ALL: &'static [SamplingParam] = &[
        SamplingParam::Temperature,
        SamplingParam::TopP,
        SamplingParam::MaxTokens,
        SamplingParam::PresencePenalty,
        SamplingParam::FrequencyPenalty,
    ];
}

/// One row of the capability table.
#[derive(Debug)]
pub struct ModelFamily {
    /// Name for logs.
    pub name: &'static str,
    /// Case-insensitive pattern over the model identifier.
    pub pattern: &'static str,
    /// Parameters the family accepts.
    pub supported: &'static [SamplingParam],
}

/// Restricted families: only default sampling plus `max_tokens`.
pub static FAMILIES: &[ModelFamily] = &[ModelFamily {
    name: "gpt-5",
    pattern: r"(?i)(^|\b)gpt-5(\b|$)",
    supported: &[SamplingParam::MaxTokens],
}];

fn compiled_families() -> &'static [(Regex, &'static ModelFamily)] {
    static COMPILED: OnceLock<Vec<(Regex, &'static ModelFamily)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        FAMILIES
            .iter()
            .map(|family| (Regex::new(family.pattern).expect("valid regex"), family))
            .collect()
    })
}

/// Resolved capabilities for a single model identifier.
#[derive(Debug, Clone, Copy)]
pub struct ModelCapabilities {
    family: Option<&'static ModelFamily>,
}

impl ModelCapabilities {
    /// Look `model` up in the table. First matching row wins.
    pub fn for_model(model: &str) -> Self {
        let family = compiled_families()
            .iter()
            .find(|(re, _)| re.is_match(model))
            .map(|&(_, family)| family);
        Self { family }
    }

    pub fn supports(&self, param: SamplingParam) -> bool {
        match self.family {
            Some(family) => family.supported.contains(&param),
            None => true,
        }
    }

    /// True when at least one sampling parameter is refused.
    pub fn is_restricted(&self) -> bool {
        SamplingParam::ALL.iter().any(|&p| !self.supports(p))
    }

    pub fn family_name(&self) -> Option<&'static str> {
        self.family.map(|f| f.name)
    }
}
