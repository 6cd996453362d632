//! Turns raw completion choices into cards.
//!
//! Models do not reliably return bare JSON even when told to; they wrap it
//! in prose or code fences. Each choice is tried as JSON first and then via
//! its fenced blocks. A choice that fails both is dropped on its own.

use crate::error::ParseError;
use crate::models::{CardPair, ChoiceResult};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct CardsPayload {
    questions_answers: Option<Vec<RawCard>>,
}

#[derive(Debug, Deserialize)]
struct RawCard {
    #[serde(default, alias = "question")]
    q: String,
    #[serde(default, alias = "answer")]
    a: String,
}

fn fenced_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"```[A-Za-z0-9_+.\-]*[ \t]*\r?\n?([\s\S]*?)```")
            .expect("valid fenced block pattern")
    })
}

/// Parses `content` as a JSON object carrying `questions_answers`.
pub fn parse_json(content: &str) -> Result<ChoiceResult, ParseError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ParseError::EmptyContent);
    }
    if !trimmed.starts_with('{') {
        return Err(ParseError::InvalidJson(
            "expected a JSON object".to_string(),
        ));
    }

    let payload: CardsPayload = serde_json::from_str(trimmed)?;
    let cards = payload
        .questions_answers
        .ok_or(ParseError::MissingQuestions)?;

    Ok(cards
        .into_iter()
        .map(|card| CardPair::new(card.q, card.a))
        .collect())
}

/// Parses the first fenced code block whose body is valid card JSON.
pub fn parse_fenced(content: &str) -> Result<ChoiceResult, ParseError> {
    let mut first_error = None;

    for caps in fenced_block().captures_iter(content) {
        let body = caps.get(1).map_or("", |m| m.as_str());
        match parse_json(body) {
            Ok(cards) => return Ok(cards),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    Err(first_error.unwrap_or(ParseError::NoFencedBlock))
}

/// Parses one choice: direct JSON, falling back to fenced blocks.
pub fn parse_choice(content: &str) -> Result<ChoiceResult, ParseError> {
    parse_json(content).or_else(|direct| {
        debug!("Direct JSON parse failed ({}), trying fenced blocks", direct);
        parse_fenced(content)
    })
}

/// Parses every choice, dropping the ones that cannot be parsed.
///
/// The output may be shorter than the input; there are no placeholders.
pub fn reconcile_choices(choices: &[Option<String>]) -> Vec<ChoiceResult> {
    let mut results = Vec::with_capacity(choices.len());

    for (index, choice) in choices.iter().enumerate() {
        let parsed = match choice.as_deref() {
            Some(content) => parse_choice(content),
            None => Err(ParseError::EmptyContent),
        };

        match parsed {
            Ok(cards) => {
                if cards.is_empty() {
                    warn!("Choice {} parsed but contained no cards", index);
                } else if cards
                    .iter()
                    .any(|c| c.question.trim().is_empty() || c.answer.trim().is_empty())
                {
                    warn!("Choice {} contains cards with empty fields", index);
                }
                results.push(cards);
            }
            Err(e) => {
                warn!(
                    "Dropping choice {}: {}. Raw content: {}",
                    index,
                    e,
                    choice.as_deref().unwrap_or("<none>")
                );
            }
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAYLOAD: &str = r#"{"questions_answers":[{"q":"X","a":"Y"}]}"#;

    fn xy() -> ChoiceResult {
        vec![CardPair::new("X", "Y")]
    }

    #[test]
    fn test_parses_plain_json() {
        assert_eq!(parse_choice(PAYLOAD).unwrap(), xy());
    }

    #[test]
    fn test_parses_fenced_json_with_language_tag() {
        let content = format!("```json\n{}\n```", PAYLOAD);
        assert_eq!(parse_choice(&content).unwrap(), xy());
    }

    #[test]
    fn test_parses_fence_without_tag_inside_prose() {
        let content = format!(
            "Here are your flashcards:\n\n```\n{}\n```\nLet me know if you need more.",
            PAYLOAD
        );
        assert_eq!(parse_choice(&content).unwrap(), xy());
    }

    #[test]
    fn test_parses_single_line_fence() {
        let content = format!("```{}```", PAYLOAD);
        assert_eq!(parse_choice(&content).unwrap(), xy());
    }

    #[test]
    fn test_skips_fenced_blocks_that_are_not_cards() {
        let content = format!("```text\nnot json\n```\nand\n```json\n{}\n```", PAYLOAD);
        assert_eq!(parse_choice(&content).unwrap(), xy());
    }

    #[test]
    fn test_accepts_long_field_names_and_missing_fields() {
        let content = r#"{"questions_answers":[{"question":"Q1","answer":"A1"},{"q":"Q2"}]}"#;
        assert_eq!(
            parse_choice(content).unwrap(),
            vec![CardPair::new("Q1", "A1"), CardPair::new("Q2", "")]
        );
    }

    #[test]
    fn test_missing_key_is_an_error() {
        assert_eq!(
            parse_json(r#"{"cards":[]}"#).unwrap_err(),
            ParseError::MissingQuestions
        );
    }

    #[test]
    fn test_prose_is_an_error() {
        assert_eq!(
            parse_choice("I cannot help with that.").unwrap_err(),
            ParseError::NoFencedBlock
        );
        assert_eq!(parse_choice("   ").unwrap_err(), ParseError::NoFencedBlock);
        assert!(matches!(
            parse_json("{not json"),
            Err(ParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_reconcile_drops_only_bad_choices() {
        let fenced = format!("```json\n{}\n```", PAYLOAD);
        let choices = vec![
            Some(PAYLOAD.to_string()),
            Some("Sorry, here is some prose.".to_string()),
            None,
            Some(fenced),
        ];

        let results = reconcile_choices(&choices);
        assert_eq!(results, vec![xy(), xy()]);
    }

    #[test]
    fn test_reconcile_keeps_empty_card_lists() {
        let results = reconcile_choices(&[Some(r#"{"questions_answers":[]}"#.to_string())]);
        assert_eq!(results, vec![Vec::<CardPair>::new()]);
    }
}
