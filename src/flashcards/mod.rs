//! Flashcard generation
//!
//! Builds few-shot prompts from notes or files, sends them through the
//! provider dispatcher, and reconciles the sampled choices into cards.

pub mod generator;
pub mod prompt;
pub mod reconcile;
pub mod render;

pub use generator::FlashcardGenerator;
pub use prompt::{ContentSegment, MessageContent, PromptMessage};
pub use reconcile::{parse_choice, reconcile_choices};
