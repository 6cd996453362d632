use crate::models::{CardPair, ChoiceResult};
use crate::Result;

pub const FLASHCARDS_TAG: &str = "#flashcards";
pub const INLINE_SEPARATOR: &str = "::";

fn single_line(s: &str) -> String {
    s.trim().lines().map(str::trim_end).collect::<Vec<_>>().join("<br>")
}

/// Renders cards as a markdown block: the tag line, then one
/// `question :: answer` line per card.
pub fn render_markdown(cards: &[CardPair]) -> String {
    let mut out = String::from(FLASHCARDS_TAG);
    out.push('\n');
    for card in cards {
        out.push_str(&format!(
            "{} {} {}\n",
            single_line(&card.question),
            INLINE_SEPARATOR,
            single_line(&card.answer)
        ));
    }
    out
}

/// Renders each alternative as its own markdown block, separated by a rule.
pub fn render_alternatives_markdown(results: &[ChoiceResult]) -> String {
    results
        .iter()
        .map(|cards| render_markdown(cards))
        .collect::<Vec<_>>()
        .join("\n---\n\n")
}

pub fn render_json(results: &[ChoiceResult]) -> Result<String> {
    Ok(serde_json::to_string_pretty(results)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_markdown() {
        let cards = vec![
            CardPair::new("What is ATP?", "The cell's energy currency"),
            CardPair::new("Two lines?\nYes", " first\nsecond "),
        ];
        assert_eq!(
            render_markdown(&cards),
            "#flashcards\nWhat is ATP? :: The cell's energy currency\nTwo lines?<br>Yes :: first<br>second\n"
        );
    }

    #[test]
    fn test_render_alternatives_markdown() {
        let results = vec![vec![CardPair::new("A", "1")], vec![CardPair::new("B", "2")]];
        assert_eq!(
            render_alternatives_markdown(&results),
            "#flashcards\nA :: 1\n\n---\n\n#flashcards\nB :: 2\n"
        );
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&[vec![CardPair::new("Q", "A")]]).unwrap();
        let parsed: Vec<Vec<CardPair>> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vec![vec![CardPair::new("Q", "A")]]);
    }
}
