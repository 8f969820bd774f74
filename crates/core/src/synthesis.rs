use std::collections::HashMap;

use crate::models::{Candidate, MatchOptions};

pub const PARTIAL_ANSWER: &str = "Partially - depends on specific requirements and context";

const MULTIPLE_QUALIFIER: &str = " (Based on multiple similar questions)";
const RELATED_QUALIFIER: &str = " (Based on closely related questions)";

#[derive(Debug, Clone, PartialEq)]
struct AnswerGroup {
    key: String,
    answer: String,
    weight: f64,
}

/// Similarity-weighted vote over candidate answers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnswerSynthesizer {
    vote_ratio: f64,
}

impl Default for AnswerSynthesizer {
    fn default() -> Self {
        Self { vote_ratio: 0.6 }
    }
}

impl AnswerSynthesizer {
    /// Returns `None` when there is nothing to vote on.
    pub fn synthesize<'a, I>(&self, candidates: I) -> Option<String>
    where
        I: IntoIterator<Item = &'a Candidate>,
    {
        let groups = group_answers(candidates);
        if groups.is_empty() {
            return None;
        }

        let total_weight: f64 = groups.iter().map(|group| group.weight).sum();
        let weight_of = |key: &str| {
            groups
                .iter()
                .find(|group| group.key == key)
                .map(|group| group.weight)
        };

        let yes_weight = weight_of("yes");
        let no_weight = weight_of("no");

        if yes_weight.is_some() || no_weight.is_some() {
            // Denominator covers every group, not just yes and no.
            let yes_ratio = ratio(yes_weight.unwrap_or(0.0), total_weight);
            let no_ratio = ratio(no_weight.unwrap_or(0.0), total_weight);

            tracing::trace!(yes_ratio, no_ratio, groups = groups.len(), "yes/no vote");

            return Some(if yes_ratio > self.vote_ratio {
                "Yes".to_string()
            } else if no_ratio > self.vote_ratio {
                "No".to_string()
            } else {
                PARTIAL_ANSWER.to_string()
            });
        }

        let mut best: Option<&AnswerGroup> = None;
        for group in &groups {
            if best.map_or(true, |current| group.weight > current.weight) {
                best = Some(group);
            }
        }
        best.map(|group| group.answer.clone())
    }
}

fn ratio(weight: f64, total: f64) -> f64 {
    if total > 0.0 {
        weight / total
    } else {
        0.0
    }
}

fn group_answers<'a, I>(candidates: I) -> Vec<AnswerGroup>
where
    I: IntoIterator<Item = &'a Candidate>,
{
    let mut groups: Vec<AnswerGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for candidate in candidates {
        let trimmed = candidate.answer.trim();
        let key = trimmed.to_lowercase();

        match index.get(&key) {
            Some(&position) => groups[position].weight += candidate.similarity,
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(AnswerGroup {
                    key,
                    answer: trimmed.to_string(),
                    weight: candidate.similarity,
                });
            }
        }
    }

    groups
}

/// Appends a provenance note to answers that are not high confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceQualifier {
    related_threshold: f64,
    cutoff: f64,
}

impl ConfidenceQualifier {
    pub fn new(related_threshold: f64, cutoff: f64) -> Self {
        Self {
            related_threshold,
            cutoff,
        }
    }

    pub fn from_options(options: &MatchOptions) -> Self {
        Self::new(options.related_qualifier_threshold, options.qualifier_cutoff)
    }

    pub fn apply(&self, answer: &str, confidence: f64) -> String {
        if confidence >= self.cutoff {
            return answer.to_string();
        }
        let qualifier = if confidence >= self.related_threshold {
            RELATED_QUALIFIER
        } else {
            MULTIPLE_QUALIFIER
        };

        let body = answer.trim_end();
        match body.chars().last() {
            Some(mark @ ('.' | '!' | '?')) => {
                let stem = &body[..body.len() - mark.len_utf8()];
                format!("{stem}{qualifier}{mark}")
            }
            _ => format!("{body}{qualifier}."),
        }
    }
}

impl Default for ConfidenceQualifier {
    fn default() -> Self {
        Self::from_options(&MatchOptions::default())
    }
}
