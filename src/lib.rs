//! LLM-backed flashcard generation for markdown note vaults
//!
//! Turns note text, optionally with embedded images and PDFs, or a single
//! standalone media file into question/answer cards by prompting an
//! OpenAI-compatible chat completions endpoint (OpenAI or Ollama) and
//! reconciling the sampled choices.

pub mod ai;
pub mod error;
pub mod flashcards;
pub mod media;
pub mod models;
pub mod prompts;

pub use error::{Error, ParseError, Result};
