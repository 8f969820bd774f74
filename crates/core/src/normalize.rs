use serde::{Deserialize, Serialize};

/// Canonical comparison form of a piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedText {
    pub text: String,
    pub tokens: Vec<String>,
}

impl NormalizedText {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Lowercases, drops everything that is neither alphanumeric nor whitespace
/// and splits on whitespace.
pub fn normalize(raw: &str) -> NormalizedText {
    let text: String = raw
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_alphanumeric() || ch.is_whitespace())
        .collect();

    let tokens = text.split_whitespace().map(str::to_string).collect();

    NormalizedText { text, tokens }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_and_case_are_removed() {
        let normalized = normalize("What's the Capital of France?");
        assert_eq!(normalized.text, "whats the capital of france");
        assert_eq!(
            normalized.tokens,
            vec!["whats", "the", "capital", "of", "france"]
        );
    }

    #[test]
    fn whitespace_runs_do_not_produce_empty_tokens() {
        let normalized = normalize("  a \t\n b  ");
        assert_eq!(normalized.tokens, vec!["a", "b"]);
        assert_eq!(normalized.text, "  a \t\n b  ");
    }

    #[test]
    fn empty_input_is_empty() {
        let normalized = normalize("");
        assert!(normalized.is_empty());
        assert!(normalized.tokens.is_empty());
    }

    #[test]
    fn punctuation_only_input_is_empty() {
        let normalized = normalize("?!...");
        assert!(normalized.is_empty());
        assert!(normalized.tokens.is_empty());
    }

    #[test]
    fn non_ascii_letters_survive() {
        let normalized = normalize("Où est la Gare?");
        assert_eq!(normalized.tokens, vec!["où", "est", "la", "gare"]);
    }
}
