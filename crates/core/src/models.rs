use serde::{Deserialize, Serialize};

use crate::error::MatchError;

/// Answer returned when nothing in the corpus matches.
pub const NO_MATCH_ANSWER: &str = "No similar questions found in the knowledge base.";

/// Answer returned when the pipeline fails internally.
pub const PIPELINE_ERROR_ANSWER: &str = "Error processing question. Please try again.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KnowledgeEntry {
    pub id: i64,
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl KnowledgeEntry {
    pub fn new(id: i64, question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id,
            question: question.into(),
            answer: answer.into(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Entries with a blank question or answer never enter a snapshot.
    pub fn is_usable(&self) -> bool {
        !self.question.trim().is_empty() && !self.answer.trim().is_empty()
    }

    /// Category comparison ignores surrounding whitespace and Unicode case.
    pub fn in_category(&self, category: &str) -> bool {
        self.category
            .as_deref()
            .is_some_and(|value| value.trim().to_lowercase() == category.trim().to_lowercase())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub entry_id: i64,
    pub question: String,
    pub answer: String,
    pub similarity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessResult {
    pub question: String,
    pub answer: String,
    pub confidence: f64,
    pub is_synthesized: bool,
    pub candidates: Vec<Candidate>,
}

impl ProcessResult {
    pub fn no_match(question: &str, candidates: Vec<Candidate>) -> Self {
        Self {
            question: question.to_string(),
            answer: NO_MATCH_ANSWER.to_string(),
            confidence: 0.0,
            is_synthesized: false,
            candidates,
        }
    }

    pub fn pipeline_error(question: &str) -> Self {
        Self {
            question: question.to_string(),
            answer: PIPELINE_ERROR_ANSWER.to_string(),
            confidence: 0.0,
            is_synthesized: false,
            candidates: Vec::new(),
        }
    }

    /// False for both the no-match sentinel and the pipeline error result.
    pub fn is_match(&self) -> bool {
        self.answer != NO_MATCH_ANSWER && self.answer != PIPELINE_ERROR_ANSWER
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SignalWeights {
    pub jaccard: f64,
    pub sequence: f64,
    pub word_order: f64,
    pub word_sim: f64,
}

impl SignalWeights {
    pub fn total(&self) -> f64 {
        self.jaccard + self.sequence + self.word_order + self.word_sim
    }
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            jaccard: 0.3,
            sequence: 0.3,
            word_order: 0.2,
            word_sim: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchOptions {
    pub exact_threshold: f64,
    pub synthesis_threshold: f64,
    pub default_top_k: usize,
    pub duplicate_threshold: f64,
    pub related_qualifier_threshold: f64,
    pub qualifier_cutoff: f64,
    pub low_confidence_threshold: f64,
    pub weights: SignalWeights,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            exact_threshold: 0.95,
            synthesis_threshold: 0.2,
            default_top_k: 5,
            duplicate_threshold: 0.6,
            related_qualifier_threshold: 0.5,
            qualifier_cutoff: 0.8,
            low_confidence_threshold: 0.5,
            weights: SignalWeights::default(),
        }
    }
}

impl MatchOptions {
    pub fn validate(&self) -> Result<(), MatchError> {
        let weights = [
            ("jaccard", self.weights.jaccard),
            ("sequence", self.weights.sequence),
            ("word_order", self.weights.word_order),
            ("word_sim", self.weights.word_sim),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(MatchError::InvalidOptions(format!(
                    "weight {name} must be a non-negative number, got {weight}"
                )));
            }
        }
        if (self.weights.total() - 1.0).abs() > 1e-6 {
            return Err(MatchError::InvalidOptions(format!(
                "signal weights must sum to 1.0, got {}",
                self.weights.total()
            )));
        }

        let thresholds = [
            ("exact_threshold", self.exact_threshold),
            ("synthesis_threshold", self.synthesis_threshold),
            ("duplicate_threshold", self.duplicate_threshold),
            ("related_qualifier_threshold", self.related_qualifier_threshold),
            ("qualifier_cutoff", self.qualifier_cutoff),
            ("low_confidence_threshold", self.low_confidence_threshold),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(MatchError::InvalidOptions(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        if self.synthesis_threshold >= self.exact_threshold {
            return Err(MatchError::InvalidOptions(format!(
                "synthesis_threshold {} must be below exact_threshold {}",
                self.synthesis_threshold, self.exact_threshold
            )));
        }
        if self.default_top_k == 0 {
            return Err(MatchError::InvalidOptions(
                "default_top_k must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
