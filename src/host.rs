//! Access to the mail client that owns compose windows and messages.
//!
//! [`MailHost`] is the seam the orchestration talks through; [`FileHost`]
//! backs it with local files for the command line.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{Result, ScribeError};
use crate::extract::decode_text_bytes;
use crate::model::body::EmailBody;

/// Opaque handle to a compose window or displayed message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetId(pub String);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Operations the core needs from the mail client.
///
/// Callers serialize requests per target; implementations need no locking
/// against overlapping calls on the same document.
#[async_trait]
pub trait MailHost: Send + Sync {
    /// The compose window replies should go into, if any.
    async fn active_compose_target(&self) -> Result<Option<TargetId>>;

    /// The message currently on display, if any.
    async fn active_display_target(&self) -> Result<Option<TargetId>>;

    /// Current compose body in the editor's current mode.
    async fn compose_body(&self, target: &TargetId) -> Result<EmailBody>;

    /// Replace the compose body. The mode of `body` becomes the editor's mode.
    async fn set_compose_body(&self, target: &TargetId, body: EmailBody) -> Result<()>;

    /// Full RFC 5322 source of a message.
    async fn message_raw(&self, target: &TargetId) -> Result<Vec<u8>>;
}

/// Where [`FileHost`] writes a new compose body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeSink {
    /// Overwrite the compose file.
    InPlace,
    /// Write to another file.
    File(PathBuf),
    /// Write nothing; the caller prints the result.
    Discard,
}

/// A [`MailHost`] over local files.
///
/// The compose file is HTML when its extension is `.html` or `.htm`,
/// plain text otherwise.
#[derive(Debug, Clone)]
pub struct FileHost {
    compose: Option<PathBuf>,
    message: Option<PathBuf>,
    sink: ComposeSink,
}

impl FileHost {
    pub fn new(compose: Option<PathBuf>, message: Option<PathBuf>, sink: ComposeSink) -> Self {
        Self {
            compose,
            message,
            sink,
        }
    }

    /// A host with only a compose file.
    pub fn compose(path: impl Into<PathBuf>, sink: ComposeSink) -> Self {
        Self::new(Some(path.into()), None, sink)
    }

    /// A host with only a displayed message.
    pub fn message(path: impl Into<PathBuf>) -> Self {
        Self::new(None, Some(path.into()), ComposeSink::Discard)
    }
}

/// `.html` / `.htm`, case-insensitive.
pub fn is_html_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
}

fn target_of(path: &Option<PathBuf>) -> Option<TargetId> {
    path.as_ref().map(|p| TargetId(p.display().to_string()))
}

#[async_trait]
impl MailHost for FileHost {
    async fn active_compose_target(&self) -> Result<Option<TargetId>> {
        Ok(target_of(&self.compose))
    }

    async fn active_display_target(&self) -> Result<Option<TargetId>> {
        Ok(target_of(&self.message))
    }

    async fn compose_body(&self, target: &TargetId) -> Result<EmailBody> {
        let path = PathBuf::from(&target.0);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| ScribeError::io(&path, e))?;
        let text = decode_text_bytes(&bytes);

        Ok(if is_html_path(&path) {
            EmailBody::Html(text)
        } else {
            EmailBody::PlainText(text)
        })
    }

    async fn set_compose_body(&self, target: &TargetId, body: EmailBody) -> Result<()> {
        let path = match &self.sink {
            ComposeSink::InPlace => PathBuf::from(&target.0),
            ComposeSink::File(path) => path.clone(),
            ComposeSink::Discard => return Ok(()),
        };
        tokio::fs::write(&path, body.content())
            .await
            .map_err(|e| ScribeError::io(&path, e))?;
        tracing::info!(path = %path.display(), "Compose body written");
        Ok(())
    }

    async fn message_raw(&self, target: &TargetId) -> Result<Vec<u8>> {
        let path = PathBuf::from(&target.0);
        tokio::fs::read(&path)
            .await
            .map_err(|e| ScribeError::io(&path, e))
    }
}
