//! Error handling and custom error types
//!
//! Provides unified error handling across the generator using thiserror.
//! Per-choice parse failures get their own type because they never abort a
//! request; they only drop the offending choice.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Could not reach {provider}: {message}")]
    Connectivity { provider: String, message: String },

    #[error("{provider} API error (status {status}): {message}")]
    Provider {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Media error: {0}")]
    Media(String),

    #[error("Generic error: {0}")]
    Generic(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why a single completion choice could not be turned into cards.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("choice has no text content")]
    EmptyContent,

    #[error("JSON object has no questions_answers array")]
    MissingQuestions,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("no fenced code block contained usable JSON")]
    NoFencedBlock,
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        ParseError::InvalidJson(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_message_includes_status() {
        let err = Error::Provider {
            provider: "OpenAI".to_string(),
            status: 429,
            message: "rate limited".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "OpenAI API error (status 429): rate limited"
        );
    }

    #[test]
    fn test_connectivity_error_names_provider() {
        let err = Error::Connectivity {
            provider: "Ollama".to_string(),
            message: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("Ollama"));
    }
}
