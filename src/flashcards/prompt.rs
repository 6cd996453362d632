//! Few-shot prompt assembly.
//!
//! Every prompt has the same shape: one system message, a worked example
//! (user note, assistant answer), then the real user message. The example
//! answer always has exactly as many cards as the real request asks for.

use crate::media::{MediaItem, MimeType};
use crate::models::CardPair;
use crate::prompts;
use serde::Serialize;

/// A unit of user message content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSegment {
    Text(String),
    Media { mime_type: MimeType, encoded: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text(String),
    Segments(Vec<ContentSegment>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptMessage {
    System(String),
    User(MessageContent),
    Assistant(String),
}

impl PromptMessage {
    pub fn role(&self) -> &'static str {
        match self {
            PromptMessage::System(_) => "system",
            PromptMessage::User(_) => "user",
            PromptMessage::Assistant(_) => "assistant",
        }
    }
}

impl From<&MediaItem> for ContentSegment {
    fn from(item: &MediaItem) -> Self {
        ContentSegment::Media {
            mime_type: item.mime_type,
            encoded: item.encoded_content.clone(),
        }
    }
}

/// The canonical example cards, repeated cyclically or truncated to `count`.
pub fn example_cards(count: usize) -> Vec<CardPair> {
    prompts::EXAMPLE_CARDS
        .iter()
        .cycle()
        .take(count)
        .map(|(q, a)| CardPair::new(*q, *a))
        .collect()
}

#[derive(Serialize)]
struct OutputPair<'a> {
    q: &'a str,
    a: &'a str,
}

#[derive(Serialize)]
struct Output<'a> {
    questions_answers: Vec<OutputPair<'a>>,
}

/// Serializes cards in the same shape the model is asked to answer with.
pub fn cards_to_output_json(cards: &[CardPair]) -> String {
    let output = Output {
        questions_answers: cards
            .iter()
            .map(|card| OutputPair {
                q: &card.question,
                a: &card.answer,
            })
            .collect(),
    };
    // Plain string fields cannot fail to serialize.
    serde_json::to_string(&output).unwrap_or_default()
}

fn system_message(base: &str, additional_prompt: Option<&str>) -> PromptMessage {
    match additional_prompt.map(str::trim).filter(|p| !p.is_empty()) {
        Some(extra) => PromptMessage::System(format!("{}\n{}", base.trim_end(), extra)),
        None => PromptMessage::System(base.to_string()),
    }
}

fn note_request_text(notes: &str, count: usize) -> String {
    prompts::render(
        prompts::NOTE_USER,
        &[("count", &count.to_string()), ("notes", notes)],
    )
}

fn example_exchange(count: usize) -> [PromptMessage; 2] {
    [
        PromptMessage::User(MessageContent::Text(note_request_text(
            prompts::EXAMPLE_NOTE,
            count,
        ))),
        PromptMessage::Assistant(cards_to_output_json(&example_cards(count))),
    ]
}

/// Builds the prompt for cards drawn from note text and its attached media.
///
/// Without media the user content is a single string; with media it is the
/// text segment followed by one media segment per item, in order.
pub fn build_note_prompt(
    notes: &str,
    count: usize,
    media: &[MediaItem],
    additional_prompt: Option<&str>,
) -> Vec<PromptMessage> {
    let base = if media.is_empty() {
        prompts::NOTE_SYSTEM
    } else {
        prompts::NOTE_MEDIA_SYSTEM
    };

    let text = note_request_text(notes, count);
    let user = if media.is_empty() {
        MessageContent::Text(text)
    } else {
        let mut segments = Vec::with_capacity(media.len() + 1);
        segments.push(ContentSegment::Text(text));
        segments.extend(media.iter().map(ContentSegment::from));
        MessageContent::Segments(segments)
    };

    let [example_user, example_answer] = example_exchange(count);
    vec![
        system_message(base, additional_prompt),
        example_user,
        example_answer,
        PromptMessage::User(user),
    ]
}

/// Builds the prompt for cards drawn from a single standalone file.
pub fn build_file_prompt(
    file: &MediaItem,
    count: usize,
    additional_prompt: Option<&str>,
) -> Vec<PromptMessage> {
    let preamble = prompts::render(
        prompts::FILE_USER,
        &[
            ("file_name", file.file_name()),
            ("count", &count.to_string()),
        ],
    );

    let [example_user, example_answer] = example_exchange(count);
    vec![
        system_message(prompts::FILE_SYSTEM, additional_prompt),
        example_user,
        example_answer,
        PromptMessage::User(MessageContent::Segments(vec![
            ContentSegment::Text(preamble),
            ContentSegment::from(file),
        ])),
    ]
}
