use std::collections::HashSet;

use crate::error::MatchError;
use crate::models::SignalWeights;
use crate::normalize::{normalize, NormalizedText};

/// Text prepared once for repeated comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedText {
    pub lowered: String,
    pub normalized: NormalizedText,
    pub chars: Vec<char>,
}

impl PreparedText {
    pub fn new(raw: &str) -> Self {
        let normalized = normalize(raw);
        Self {
            lowered: raw.to_lowercase(),
            chars: normalized.text.chars().collect(),
            normalized,
        }
    }
}

/// Raw values of the four similarity signals, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SignalBreakdown {
    pub jaccard: f64,
    pub sequence: f64,
    pub word_order: f64,
    pub word_sim: f64,
}

impl SignalBreakdown {
    pub fn compute(left: &PreparedText, right: &PreparedText) -> Self {
        let (left_tokens, right_tokens) = (&left.normalized.tokens, &right.normalized.tokens);
        let left_set: HashSet<&str> = left_tokens.iter().map(String::as_str).collect();
        let right_set: HashSet<&str> = right_tokens.iter().map(String::as_str).collect();
        let shared = left_set.intersection(&right_set).count();
        let union = left_set.union(&right_set).count();

        let jaccard = if union == 0 {
            0.0
        } else {
            shared as f64 / union as f64
        };

        let set_total = left_set.len() + right_set.len();
        let word_sim = if set_total == 0 {
            0.0
        } else {
            2.0 * shared as f64 / set_total as f64
        };

        Self {
            jaccard,
            sequence: match_ratio(&left.chars, &right.chars),
            word_order: match_ratio(left_tokens, right_tokens),
            word_sim,
        }
    }

    pub fn combine(&self, weights: &SignalWeights) -> f64 {
        weights.jaccard * self.jaccard
            + weights.sequence * self.sequence
            + weights.word_order * self.word_order
            + weights.word_sim * self.word_sim
    }
}

/// `2 * M / T` where `M` is the longest common subsequence length and `T`
/// the combined length of both sequences. Zero when both are empty.
pub fn match_ratio<T: PartialEq>(left: &[T], right: &[T]) -> f64 {
    let total = left.len() + right.len();
    if total == 0 {
        return 0.0;
    }
    2.0 * lcs_len(left, right) as f64 / total as f64
}

fn lcs_len<T: PartialEq>(left: &[T], right: &[T]) -> usize {
    let (outer, inner) = if left.len() >= right.len() {
        (left, right)
    } else {
        (right, left)
    };
    if inner.is_empty() {
        return 0;
    }

    let mut previous = vec![0usize; inner.len() + 1];
    let mut current = vec![0usize; inner.len() + 1];

    for outer_item in outer {
        for (column, inner_item) in inner.iter().enumerate() {
            current[column + 1] = if outer_item == inner_item {
                previous[column] + 1
            } else {
                previous[column + 1].max(current[column])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[inner.len()]
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityScorer {
    weights: SignalWeights,
}

impl SimilarityScorer {
    pub fn new(weights: SignalWeights) -> Self {
        Self { weights }
    }

    /// Similarity in `[0, 1]`. Failures score `0.0`.
    pub fn score(&self, left: &str, right: &str) -> f64 {
        match self.try_score(left, right) {
            Ok(score) => score,
            Err(error) => {
                tracing::warn!(%error, "similarity scoring failed, treating as 0.0");
                0.0
            }
        }
    }

    pub fn try_score(&self, left: &str, right: &str) -> Result<f64, MatchError> {
        self.try_score_prepared(&PreparedText::new(left), &PreparedText::new(right))
    }

    pub fn try_score_prepared(
        &self,
        left: &PreparedText,
        right: &PreparedText,
    ) -> Result<f64, MatchError> {
        if left.lowered == right.lowered {
            return Ok(1.0);
        }

        // Strings made only of punctuation normalize to "" and must not count as equal.
        if !left.normalized.is_empty() && left.normalized.text == right.normalized.text {
            return Ok(1.0);
        }

        let signals = SignalBreakdown::compute(left, right);
        let combined = signals.combine(&self.weights);
        if !combined.is_finite() {
            return Err(MatchError::Scoring(format!(
                "combined score is not finite: {signals:?}"
            )));
        }

        Ok(combined.clamp(0.0, 1.0))
    }
}
