//! Data models and structures
//!
//! Defines the request-scoped values that flow through generation (cards,
//! options, media settings) and the process-wide configuration read from the
//! environment.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// One generated flashcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPair {
    pub question: String,
    pub answer: String,
}

impl CardPair {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Cards parsed from a single sampled completion choice.
pub type ChoiceResult = Vec<CardPair>;

/// Supported completion backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    OpenAi,
    Ollama,
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiProvider::OpenAi => write!(f, "OpenAI"),
            AiProvider::Ollama => write!(f, "Ollama"),
        }
    }
}

impl FromStr for AiProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(AiProvider::OpenAi),
            "ollama" => Ok(AiProvider::Ollama),
            other => Err(Error::Configuration(format!(
                "Unknown provider '{}'. Expected 'openai' or 'ollama'",
                other
            ))),
        }
    }
}

/// Provider selection plus credentials and model names.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: AiProvider,
    pub api_key: Option<String>,
    /// Alternate base URL (without the `/v1` suffix).
    pub endpoint: Option<String>,
    /// Default text model; falls back to the provider default when unset.
    pub model: Option<String>,
    pub vision_model: Option<String>,
}

impl ProviderConfig {
    pub fn new(provider: AiProvider) -> Self {
        Self {
            provider,
            api_key: None,
            endpoint: None,
            model: None,
            vision_model: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_vision_model(mut self, model: impl Into<String>) -> Self {
        self.vision_model = Some(model.into());
        self
    }

    /// Checks that the selected provider has what it needs before any
    /// network activity happens.
    pub fn validate(&self) -> Result<()> {
        if self.provider.requires_api_key() && non_blank(&self.api_key).is_none() {
            return Err(Error::Configuration(format!(
                "{} requires an API key",
                self.provider
            )));
        }

        if self.provider.default_endpoint().is_none() && non_blank(&self.endpoint).is_none() {
            return Err(Error::Configuration(format!(
                "{} requires an endpoint URL",
                self.provider
            )));
        }

        Ok(())
    }

    /// Base URL for requests: the configured endpoint or the provider default.
    pub fn base_url(&self) -> Result<String> {
        non_blank(&self.endpoint)
            .map(str::to_string)
            .or_else(|| self.provider.default_endpoint().map(str::to_string))
            .map(|url| url.trim_end_matches('/').to_string())
            .ok_or_else(|| {
                Error::Configuration(format!("{} requires an endpoint URL", self.provider))
            })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Per-call sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub max_tokens_per_question: u32,
    /// Extra instructions appended to the system prompt.
    pub additional_prompt: Option<String>,
    /// Overrides the configured text model for this call only.
    pub model_override: Option<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            max_tokens_per_question: 100,
            additional_prompt: None,
            model_override: None,
        }
    }
}

impl GenerationOptions {
    /// Response token budget for a request asking for `question_count` cards.
    pub fn max_tokens(&self, question_count: usize) -> u32 {
        let count = u32::try_from(question_count).unwrap_or(u32::MAX);
        self.max_tokens_per_question.saturating_mul(count)
    }
}

/// Limits applied to embedded media.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSettings {
    pub enabled: bool,
    pub max_size_kb: u64,
    /// Accepted extensions, lowercase, without the leading dot.
    pub supported_formats: Vec<String>,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size_kb: 5000,
            supported_formats: ["jpg", "jpeg", "png", "gif", "bmp", "webp", "pdf"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl MediaSettings {
    pub fn accepts_extension(&self, extension: &str) -> bool {
        let extension = extension.trim_start_matches('.');
        self.supported_formats
            .iter()
            .any(|f| f.trim_start_matches('.').eq_ignore_ascii_case(extension))
    }
}

/// Default counts for one invocation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationDefaults {
    pub question_count: usize,
    pub alternatives: usize,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderConfig,
    pub options: GenerationOptions,
    pub media: MediaSettings,
    pub selection: InvocationDefaults,
    pub file: InvocationDefaults,
    pub vault_root: PathBuf,
    pub active_file: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match var("FLASHCARDS_PROVIDER") {
            Some(value) => value.parse()?,
            None => AiProvider::OpenAi,
        };

        let defaults = GenerationOptions::default();
        let options = GenerationOptions {
            temperature: parse_var(&var, "FLASHCARDS_TEMPERATURE", defaults.temperature)?,
            top_p: parse_var(&var, "FLASHCARDS_TOP_P", defaults.top_p)?,
            frequency_penalty: parse_var(
                &var,
                "FLASHCARDS_FREQUENCY_PENALTY",
                defaults.frequency_penalty,
            )?,
            presence_penalty: parse_var(
                &var,
                "FLASHCARDS_PRESENCE_PENALTY",
                defaults.presence_penalty,
            )?,
            max_tokens_per_question: parse_var(
                &var,
                "FLASHCARDS_MAX_TOKENS_PER_QUESTION",
                defaults.max_tokens_per_question,
            )?,
            additional_prompt: var("FLASHCARDS_ADDITIONAL_PROMPT"),
            model_override: None,
        };

        let media_defaults = MediaSettings::default();
        let media = MediaSettings {
            enabled: parse_bool(&var, "FLASHCARDS_MEDIA_ENABLED", media_defaults.enabled)?,
            max_size_kb: parse_var(
                &var,
                "FLASHCARDS_MAX_MEDIA_SIZE_KB",
                media_defaults.max_size_kb,
            )?,
            supported_formats: match var("FLASHCARDS_MEDIA_FORMATS") {
                Some(list) => list
                    .split(',')
                    .map(|f| f.trim().trim_start_matches('.').to_ascii_lowercase())
                    .filter(|f| !f.is_empty())
                    .collect(),
                None => media_defaults.supported_formats,
            },
        };

        let selection = InvocationDefaults {
            question_count: parse_count(&var, "FLASHCARDS_SELECTION_QUESTIONS", 3)?,
            alternatives: parse_count(&var, "FLASHCARDS_SELECTION_ALTERNATIVES", 3)?,
        };
        let file = InvocationDefaults {
            question_count: parse_count(&var, "FLASHCARDS_FILE_QUESTIONS", 10)?,
            alternatives: parse_count(&var, "FLASHCARDS_FILE_ALTERNATIVES", 1)?,
        };

        Ok(Self {
            provider: ProviderConfig {
                provider,
                api_key: var("FLASHCARDS_API_KEY").or_else(|| var("OPENAI_API_KEY")),
                endpoint: var("FLASHCARDS_ENDPOINT"),
                model: var("FLASHCARDS_MODEL"),
                vision_model: var("FLASHCARDS_VISION_MODEL"),
            },
            options,
            media,
            selection,
            file,
            vault_root: PathBuf::from(var("FLASHCARDS_VAULT").unwrap_or_else(|| ".".to_string())),
            active_file: var("FLASHCARDS_ACTIVE_FILE"),
        })
    }
}

fn parse_var<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Configuration(format!("{} has invalid value '{}'", key, raw))),
        None => Ok(default),
    }
}

fn parse_bool<F>(var: &F, key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key).map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(v) => Err(Error::Configuration(format!(
            "{} has invalid boolean value '{}'",
            key, v
        ))),
        None => Ok(default),
    }
}

fn parse_count<F>(var: &F, key: &str, default: usize) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let count: usize = parse_var(var, key, default)?;
    if count == 0 {
        return Err(Error::Configuration(format!("{} must be at least 1", key)));
    }
    Ok(count)
}
