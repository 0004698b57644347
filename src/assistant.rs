//! Request orchestration: resolve a target, build the prompt, call the
//! model and hand the answer to the splicer or the renderer.

use crate::completion::{
    build_payload, reply_messages, summary_messages, CompletionClient, SummaryStyle,
};
use crate::config::Config;
use crate::error::{ParseFallbackWarning, Result, ScribeError};
use crate::extract::{extract_message_text, extract_plain_text};
use crate::host::{MailHost, TargetId};
use crate::model::body::EmailBody;
use crate::render;
use crate::splice::splice_body;

/// A reply that has been written back to the compose target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyOutcome {
    pub target: TargetId,
    /// The generated reply text, before splicing.
    pub reply: String,
    /// The compose body as written.
    pub body: EmailBody,
    /// Set when the HTML had to be spliced as a string.
    pub warning: Option<ParseFallbackWarning>,
}

/// Drafts replies and summaries with one configuration.
pub struct Assistant {
    config: Config,
    client: CompletionClient,
}

impl Assistant {
    /// Build the HTTP client from `config`. The API key is resolved now.
    pub fn new(config: Config) -> Result<Self> {
        let client = CompletionClient::new(
            config.api.base_url.clone(),
            config.api_key(),
            config.timeout(),
        )?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: Config, client: CompletionClient) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &CompletionClient {
        &self.client
    }

    /// Explicit instruction, else the remembered one, else none.
    fn instruction<'a>(&'a self, instruction: Option<&'a str>) -> Option<&'a str> {
        instruction
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .or_else(|| Some(self.config.general.last_prompt.trim()).filter(|p| !p.is_empty()))
    }

    /// Draft a reply for the compose window and splice it into the body.
    ///
    /// `target` defaults to the host's active compose window.
    pub async fn generate_reply<H: MailHost + ?Sized>(
        &self,
        host: &H,
        target: Option<&TargetId>,
        instruction: Option<&str>,
    ) -> Result<ReplyOutcome> {
        self.client.ensure_key()?;

        let target = match target {
            Some(t) => t.clone(),
            None => host
                .active_compose_target()
                .await?
                .ok_or_else(|| ScribeError::NoActiveTarget("no compose window is active".into()))?,
        };

        let body = host.compose_body(&target).await?;
        let original_text = extract_plain_text(&body);
        tracing::debug!(
            %target,
            plain_text = body.is_plain_text(),
            chars = original_text.len(),
            "Drafting reply"
        );

        let messages = reply_messages(self.instruction(instruction), &original_text);
        let payload = build_payload(&self.config.model.name, messages, &self.config.model.sampling());
        let reply = self.client.complete(&payload).await?;

        let (spliced, warning) = splice_body(&body, &reply);
        if let Some(ref w) = warning {
            tracing::warn!(%target, %w, "Reply spliced without an HTML tree");
        }
        host.set_compose_body(&target, spliced.clone()).await?;

        Ok(ReplyOutcome {
            target,
            reply,
            body: spliced,
            warning,
        })
    }

    /// Summarize explicit content. `None` preferences fall back to the config.
    pub async fn summarize(
        &self,
        content: &str,
        instruction: Option<&str>,
        language: Option<&str>,
        style: Option<SummaryStyle>,
    ) -> Result<String> {
        self.client.ensure_key()?;
        if content.trim().is_empty() {
            return Err(ScribeError::ContentUnavailable("nothing to summarize".into()));
        }

        let language = language.unwrap_or(&self.config.summary.language);
        let style = style.unwrap_or(self.config.summary.style);
        tracing::debug!(language, %style, chars = content.len(), "Summarizing");

        let messages = summary_messages(self.instruction(instruction), content, language, style);
        let payload = build_payload(&self.config.model.name, messages, &self.config.model.sampling());
        self.client.complete(&payload).await
    }

    /// Summarize the displayed message. Requires `summary.display_summaries`.
    pub async fn summarize_displayed<H: MailHost + ?Sized>(
        &self,
        host: &H,
        target: Option<&TargetId>,
        instruction: Option<&str>,
    ) -> Result<String> {
        if !self.config.summary.display_summaries {
            return Err(ScribeError::SummariesDisabled);
        }
        self.client.ensure_key()?;

        let target = match target {
            Some(t) => t.clone(),
            None => host
                .active_display_target()
                .await?
                .ok_or_else(|| ScribeError::NoActiveTarget("no message is displayed".into()))?,
        };

        let raw = host.message_raw(&target).await?;
        let text = extract_message_text(&raw)?;
        self.summarize(&text, instruction, None, None).await
    }

    /// Sanitized HTML for showing a summary.
    pub fn render_summary_for_display(&self, summary: &str) -> String {
        render::render(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ComposeSink, FileHost};

    fn offline(config: Config) -> Assistant {
        let client = CompletionClient::new("http://127.0.0.1:9", "", None).expect("client");
        Assistant::with_client(config, client)
    }

    #[tokio::test]
    async fn test_reply_without_key_is_configuration_error() {
        let assistant = offline(Config::default());
        let host = FileHost::new(None, None, ComposeSink::Discard);
        let err = assistant
            .generate_reply(&host, None, None)
            .await
            .expect_err("no key");
        assert!(matches!(err, ScribeError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_display_summaries_are_opt_in() {
        let assistant = offline(Config::default());
        let host = FileHost::new(None, None, ComposeSink::Discard);
        let err = assistant
            .summarize_displayed(&host, None, None)
            .await
            .expect_err("disabled");
        assert!(matches!(err, ScribeError::SummariesDisabled));
    }

    #[tokio::test]
    async fn test_displayed_summary_without_key_skips_host() {
        let mut config = Config::default();
        config.summary.display_summaries = true;
        let assistant = offline(config);
        let host = FileHost::new(None, None, ComposeSink::Discard);
        let err = assistant
            .summarize_displayed(&host, None, None)
            .await
            .expect_err("no key");
        assert!(matches!(err, ScribeError::Configuration(_)), "{err:?}");
    }

    #[test]
    fn test_instruction_falls_back_to_last_prompt() {
        let mut config = Config::default();
        config.general.last_prompt = "be brief".into();
        let assistant = offline(config);
        assert_eq!(assistant.instruction(None), Some("be brief"));
        assert_eq!(assistant.instruction(Some("  ")), Some("be brief"));
        assert_eq!(assistant.instruction(Some("say no")), Some("say no"));
    }

    #[test]
    fn test_render_summary_for_display() {
        let assistant = offline(Config::default());
        assert_eq!(
            assistant.render_summary_for_display("- a\n- b"),
            "<ul><li>a</li><li>b</li></ul>"
        );
    }
}
