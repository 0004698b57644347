//! Payload assembly.

use serde::{Deserialize, Serialize};

use crate::model::chat::{ChatMessage, CompletionPayload};

use super::capability::{ModelCapabilities, SamplingParam};

/// Sampling values resolved for one request.
///
/// `None` and non-finite values are left out of the payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<u32>,
    pub presence_penalty: Option<f64>,
    pub frequency_penalty: Option<f64>,
}

/// Build the request body, keeping only the sampling fields `model` accepts.
pub fn build_payload(
    model: &str,
    messages: Vec<ChatMessage>,
    sampling: &SamplingConfig,
) -> CompletionPayload {
    let caps = ModelCapabilities::for_model(model);
    if let Some(family) = caps.family_name() {
        tracing::debug!(model, family, "Restricted model family, dropping sampling overrides");
    }

    let float = |param: SamplingParam, value: Option<f64>| {
        value.filter(|v| v.is_finite() && caps.supports(param))
    };

    CompletionPayload {
        model: model.to_string(),
        messages,
        temperature: float(SamplingParam::Temperature, sampling.temperature),
        top_p: float(SamplingParam::TopP, sampling.top_p),
        max_tokens: sampling
            .max_tokens
            .filter(|_| caps.supports(SamplingParam::MaxTokens)),
        presence_penalty: float(SamplingParam::PresencePenalty, sampling.presence_penalty),
        frequency_penalty: float(SamplingParam::FrequencyPenalty, sampling.frequency_penalty),
    }
}
