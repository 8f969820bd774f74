//! Maps the best candidate's similarity to a handling strategy.
//!
//! | Band            | Best similarity `s`                  |
//! |-----------------|--------------------------------------|
//! | `Exact`         | `s >= exact_threshold` (0.95)        |
//! | `Synthesizable` | `synthesis_threshold < s < exact`    |
//! | `Weak`          | `0 < s <= synthesis_threshold` (0.2) |
//! | `None`          | no candidates, or `s <= 0`           |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{Candidate, MatchOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    /// Reuse the best answer verbatim.
    Exact,
    /// Combine every candidate above the synthesis threshold.
    Synthesizable,
    /// Fall back to the best answer, marked as synthesized.
    Weak,
    /// Nothing usable matched.
    None,
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Exact => "exact",
            Self::Synthesizable => "synthesizable",
            Self::Weak => "weak",
            Self::None => "none",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceClassifier {
    exact_threshold: f64,
    synthesis_threshold: f64,
}

impl ConfidenceClassifier {
    pub fn new(exact_threshold: f64, synthesis_threshold: f64) -> Self {
        Self {
            exact_threshold,
            synthesis_threshold,
        }
    }

    pub fn from_options(options: &MatchOptions) -> Self {
        Self::new(options.exact_threshold, options.synthesis_threshold)
    }

    /// `candidates` must be sorted best first.
    pub fn classify(&self, candidates: &[Candidate]) -> ConfidenceBand {
        match candidates.first() {
            Some(best) => self.classify_score(best.similarity),
            None => ConfidenceBand::None,
        }
    }

    pub fn classify_score(&self, similarity: f64) -> ConfidenceBand {
        if similarity >= self.exact_threshold {
            ConfidenceBand::Exact
        } else if similarity > self.synthesis_threshold {
            ConfidenceBand::Synthesizable
        } else if similarity > 0.0 {
            ConfidenceBand::Weak
        } else {
            ConfidenceBand::None
        }
    }

    /// Candidates eligible for synthesis, preserving their order.
    pub fn eligible<'a>(&self, candidates: &'a [Candidate]) -> Vec<&'a Candidate> {
        candidates
            .iter()
            .filter(|candidate| candidate.similarity > self.synthesis_threshold)
            .collect()
    }
}

impl Default for ConfidenceClassifier {
    fn default() -> Self {
        Self::from_options(&MatchOptions::default())
    }
}
