use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::LoadError;
use crate::models::ProcessResult;
use crate::processor::QuestionProcessor;

/// One row of an incoming questionnaire.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionnaireRow {
    pub question: String,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowMatch {
    pub answer: String,
    pub comment: Option<String>,
    pub similarity: f64,
    pub is_synthesized: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowOutcome {
    pub index: usize,
    pub question: String,
    pub best_match: Option<RowMatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionnaireReport {
    pub outcomes: Vec<RowOutcome>,
    pub skipped_rows: usize,
    /// Indices into `outcomes` whose similarity is below the review threshold.
    pub low_confidence: Vec<usize>,
    pub success_rate: u8,
}

impl RowOutcome {
    /// Rows that already carry an answer bypass matching entirely.
    pub fn prefilled(index: usize, row: &QuestionnaireRow) -> Option<Self> {
        let answer = row.answer.as_deref().map(str::trim).filter(|answer| !answer.is_empty())?;
        Some(Self {
            index,
            question: row.question.trim().to_string(),
            best_match: Some(RowMatch {
                answer: answer.to_string(),
                comment: row.comment.clone(),
                similarity: 1.0,
                is_synthesized: false,
            }),
        })
    }

    pub fn from_result(index: usize, result: ProcessResult) -> Self {
        let best_match = result.is_match().then(|| RowMatch {
            comment: Some(format!("Confidence: {:.2}%", result.confidence * 100.0)),
            answer: result.answer,
            similarity: result.confidence,
            is_synthesized: result.is_synthesized,
        });

        Self {
            index,
            question: result.question,
            best_match,
        }
    }
}

/// Rows with a question worth matching, paired with their input index.
pub fn answerable_rows(rows: &[QuestionnaireRow]) -> Vec<(usize, &QuestionnaireRow)> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| !row.question.trim().is_empty())
        .collect()
}

pub fn process_row(processor: &QuestionProcessor, index: usize, row: &QuestionnaireRow) -> RowOutcome {
    RowOutcome::prefilled(index, row)
        .unwrap_or_else(|| RowOutcome::from_result(index, processor.process(row.question.trim())))
}

/// Assembles the report; `outcomes` must be in input order.
pub fn summarize(
    outcomes: Vec<RowOutcome>,
    total_rows: usize,
    low_confidence_threshold: f64,
) -> QuestionnaireReport {
    let low_confidence = outcomes
        .iter()
        .enumerate()
        .filter_map(|(position, outcome)| {
            outcome
                .best_match
                .as_ref()
                .filter(|matched| matched.similarity < low_confidence_threshold)
                .map(|_| position)
        })
        .collect();

    let matched = outcomes
        .iter()
        .filter(|outcome| outcome.best_match.is_some())
        .count();
    let success_rate = if outcomes.is_empty() {
        0
    } else {
        (matched * 100 / outcomes.len()) as u8
    };

    QuestionnaireReport {
        skipped_rows: total_rows.saturating_sub(outcomes.len()),
        outcomes,
        low_confidence,
        success_rate,
    }
}

pub fn process_questionnaire(
    processor: &QuestionProcessor,
    rows: &[QuestionnaireRow],
) -> QuestionnaireReport {
    let outcomes = answerable_rows(rows)
        .into_iter()
        .map(|(index, row)| process_row(processor, index, row))
        .collect();

    summarize(
        outcomes,
        rows.len(),
        processor.options().low_confidence_threshold,
    )
}

pub async fn load_rows(path: &Path) -> Result<Vec<QuestionnaireRow>, LoadError> {
    if !path.is_file() {
        return Err(LoadError::InvalidArgument(format!(
            "questionnaire file not found: {}",
            path.display()
        )));
    }
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::KnowledgeEntry;
    use std::fs;
    use tempfile::tempdir;

    fn row(question: &str, answer: Option<&str>) -> QuestionnaireRow {
        QuestionnaireRow {
            question: question.to_string(),
            answer: answer.map(str::to_string),
            comment: None,
        }
    }

    fn processor() -> QuestionProcessor {
        QuestionProcessor::from_entries(vec![
            KnowledgeEntry::new(1, "Do you perform background checks?", "Yes"),
            KnowledgeEntry::new(2, "Is customer data encrypted at rest?", "Yes, AES-256."),
        ])
        .expect("default options are valid")
    }

    #[test]
    fn prefilled_rows_pass_through() {
        let rows = vec![QuestionnaireRow {
            question: "Anything".to_string(),
            answer: Some(" Already answered ".to_string()),
            comment: Some("from last year".to_string()),
        }];
        let report = process_questionnaire(&processor(), &rows);

        let matched = report.outcomes[0].best_match.as_ref().expect("prefilled row matches");
        assert_eq!(matched.answer, "Already answered");
        assert_eq!(matched.similarity, 1.0);
        assert!(!matched.is_synthesized);
        assert_eq!(matched.comment.as_deref(), Some("from last year"));
    }

    #[test]
    fn blank_questions_are_skipped() {
        let rows = vec![row("", None), row("   ", Some("x")), row("Do you perform background checks?", None)];
        let report = process_questionnaire(&processor(), &rows);

        assert_eq!(report.skipped_rows, 2);
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].index, 2);
        assert_eq!(report.success_rate, 100);
    }

    #[test]
    fn matched_rows_carry_confidence_comment() {
        let report = process_questionnaire(&processor(), &[row("do you perform background checks", None)]);
        let matched = report.outcomes[0].best_match.as_ref().expect("exact question matches");

        assert_eq!(matched.answer, "Yes");
        assert_eq!(matched.comment.as_deref(), Some("Confidence: 100.00%"));
        assert!(report.low_confidence.is_empty());
    }

    #[test]
    fn unmatched_rows_lower_success_rate() {
        let empty = QuestionProcessor::from_entries(Vec::new()).expect("default options are valid");
        let rows = vec![row("Do you perform background checks?", None), row("Who is your DPO?", Some("Jane Doe"))];
        let report = process_questionnaire(&empty, &rows);

        assert!(report.outcomes[0].best_match.is_none());
        assert!(report.outcomes[1].best_match.is_some());
        assert_eq!(report.success_rate, 50);
    }

    #[test]
    fn low_confidence_rows_are_flagged() {
        let outcomes = vec![
            RowOutcome {
                index: 0,
                question: "a".to_string(),
                best_match: Some(RowMatch {
                    answer: "x".to_string(),
                    comment: None,
                    similarity: 0.3,
                    is_synthesized: true,
                }),
            },
            RowOutcome {
                index: 1,
                question: "b".to_string(),
                best_match: None,
            },
        ];
        let report = summarize(outcomes, 2, 0.5);
        assert_eq!(report.low_confidence, vec![0]);
        assert_eq!(report.success_rate, 50);
    }

    #[tokio::test]
    async fn rows_load_from_json() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("rows.json");
        fs::write(
            &path,
            r#"[{"question": "Do you have a DPO?"}, {"question": "SOC 2?", "answer": "Yes", "comment": "2024"}]"#,
        )?;

        let rows = load_rows(&path).await?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].answer, None);
        assert_eq!(rows[1].comment.as_deref(), Some("2024"));
        Ok(())
    }
}
