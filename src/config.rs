//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MAILSCRIBE_CONFIG` (environment variable)
//! 2. `~/.config/mailscribe/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailscribe\config.toml` (Windows)
//! 3. Built-in defaults
//!
//! The API key can also come from `$OPENAI_API_KEY`, which wins over the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::completion::{SamplingConfig, SummaryStyle, DEFAULT_BASE_URL};

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Remote API access.
    pub api: ApiConfig,
    /// Model and sampling settings.
    pub model: ModelConfig,
    /// Summary preferences.
    pub summary: SummaryConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Instruction reused when none is given on the command line.
    pub last_prompt: String,
}

/// Remote API access.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Bearer key. Prefer `$OPENAI_API_KEY` over storing it here.
    pub api_key: String,
    /// API root, without the `/chat/completions` suffix.
    pub base_url: String,
    /// Request timeout. Unset means wait indefinitely.
    pub timeout_secs: Option<u64>,
}

/// Model and sampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model identifier, e.g. "gpt-4o-mini".
    pub name: String,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: Option<u32>,
    pub presence_penalty: f64,
    pub frequency_penalty: f64,
}

/// Summary preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Language code, or "auto" to match the source.
    pub language: String,
    pub style: SummaryStyle,
    /// Allow summarizing the message currently on display.
    pub display_summaries: bool,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            cache_dir: None,
            last_prompt: String::new(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            top_p: 1.0,
            max_tokens: None,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            language: "auto".to_string(),
            style: SummaryStyle::Balanced,
            display_summaries: false,
        }
    }
}

// ── Accessors ───────────────────────────────────────────────────

impl Config {
    /// The key to send, `$OPENAI_API_KEY` first. Empty when neither is set.
    pub fn api_key(&self) -> String {
        std::env::var(API_KEY_ENV)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| self.api.api_key.trim().to_string())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.api.timeout_secs.map(Duration::from_secs)
    }
}

impl ModelConfig {
    /// Sampling values for a request, after clamping.
    pub fn sampling(&self) -> SamplingConfig {
        let clamped = self.clone().clamped();
        SamplingConfig {
            temperature: Some(clamped.temperature),
            top_p: Some(clamped.top_p),
            max_tokens: clamped.max_tokens,
            presence_penalty: Some(clamped.presence_penalty),
            frequency_penalty: Some(clamped.frequency_penalty),
        }
    }

    /// Pull values into their accepted ranges.
    ///
    /// Non-finite values pass through untouched; the payload builder drops them.
    pub fn clamped(mut self) -> Self {
        self.temperature = clamp_finite(self.temperature, 0.0, 2.0);
        self.top_p = clamp_finite(self.top_p, 0.0, 1.0);
        self.max_tokens = self.max_tokens.map(|n| n.max(1));
        self.presence_penalty = clamp_finite(self.presence_penalty, -2.0, 2.0);
        self.frequency_penalty = clamp_finite(self.frequency_penalty, -2.0, 2.0);
        self
    }

    /// Recommended sampling for a known model; `None` for unknown names.
    pub fn recommended_for(model: &str) -> Option<Self> {
        let temperature = match model.trim().to_ascii_lowercase().as_str() {
            "gpt-5" => 1.0,
            "gpt-4o-mini" | "gpt-4o" => 0.4,
            "gpt-4.1-mini" | "gpt-4.1" => 0.5,
            "gpt-3.5-turbo" => 0.7,
            _ => return None,
        };
        Some(Self {
            name: model.trim().to_string(),
            temperature,
            top_p: 1.0,
            max_tokens: None,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
        })
    }
}

fn clamp_finite(value: f64, min: f64, max: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        value
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
/// Use [`try_load_config`] when the result may be written back.
pub fn load_config() -> Config {
    match try_load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "Failed to load config, using defaults");
            Config::default()
        }
    }
}

/// Load configuration, failing if an existing file cannot be read or parsed.
///
/// A missing file yields the defaults.
pub fn try_load_config() -> anyhow::Result<Config> {
    match config_file_path() {
        Some(path) if path.exists() => load_config_from(&path),
        _ => Ok(Config::default()),
    }
}

/// Read and parse one config file.
pub fn load_config_from(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let cfg = toml::from_str::<Config>(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    tracing::info!(path = %path.display(), "Loaded config");
    Ok(cfg)
}

/// Write configuration to `path`, creating parent directories.
pub fn save_config_to(path: &Path, config: &Config) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(())
}

/// Re-read the file at `path`, apply `edit` and write it back.
///
/// Refuses to write when the existing file does not parse, so a broken
/// file is never replaced by defaults.
pub fn update_config_at(path: &Path, edit: impl FnOnce(&mut Config)) -> anyhow::Result<Config> {
    let mut cfg = if path.exists() {
        load_config_from(path).context("Refusing to overwrite the config file")?
    } else {
        Config::default()
    };
    edit(&mut cfg);
    save_config_to(path, &cfg)?;
    Ok(cfg)
}

/// [`update_config_at`] on the standard location.
pub fn update_config(edit: impl FnOnce(&mut Config)) -> anyhow::Result<Config> {
    let path = config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;
    update_config_at(&path, edit)
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MAILSCRIBE_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("mailscribe").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailscribe")
}

/// Return the log file path.
pub fn log_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("mailscribe.log")
}
