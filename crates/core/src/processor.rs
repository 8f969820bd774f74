use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::confidence::{ConfidenceBand, ConfidenceClassifier};
use crate::corpus::CorpusSnapshot;
use crate::error::{LoadError, MatchError};
use crate::models::{Candidate, KnowledgeEntry, MatchOptions, ProcessResult};
use crate::observer::{MatchObserver, TracingObserver};
use crate::retriever::Retriever;
use crate::similarity::SimilarityScorer;
use crate::synthesis::{AnswerSynthesizer, ConfidenceQualifier};
use crate::traits::KnowledgeSource;

/// Public entry point: turns a free-text question into a [`ProcessResult`].
pub struct QuestionProcessor {
    retriever: Retriever,
    classifier: ConfidenceClassifier,
    synthesizer: AnswerSynthesizer,
    qualifier: ConfidenceQualifier,
    options: MatchOptions,
    observer: Arc<dyn MatchObserver>,
}

impl QuestionProcessor {
    pub fn new(snapshot: CorpusSnapshot, options: MatchOptions) -> Result<Self, MatchError> {
        Self::with_observer(snapshot, options, Arc::new(TracingObserver))
    }

    pub fn with_observer(
        snapshot: CorpusSnapshot,
        options: MatchOptions,
        observer: Arc<dyn MatchObserver>,
    ) -> Result<Self, MatchError> {
        options.validate()?;
        observer.on_corpus_loaded(&snapshot);

        Ok(Self {
            retriever: Retriever::new(
                snapshot,
                SimilarityScorer::new(options.weights),
                Arc::clone(&observer),
            ),
            classifier: ConfidenceClassifier::from_options(&options),
            synthesizer: AnswerSynthesizer::default(),
            qualifier: ConfidenceQualifier::from_options(&options),
            options,
            observer,
        })
    }

    pub fn from_entries(entries: Vec<KnowledgeEntry>) -> Result<Self, MatchError> {
        Self::new(CorpusSnapshot::from_entries(entries), MatchOptions::default())
    }

    pub async fn from_source(
        source: &dyn KnowledgeSource,
        options: MatchOptions,
    ) -> Result<Self, LoadError> {
        let snapshot = load_snapshot(source).await?;
        Ok(Self::new(snapshot, options)?)
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Reloads the corpus from `source` and swaps it in. Calls already in
    /// flight finish against the snapshot they started with.
    pub async fn reload(&self, source: &dyn KnowledgeSource) -> Result<Arc<CorpusSnapshot>, LoadError> {
        let snapshot = load_snapshot(source).await?;
        self.observer.on_corpus_loaded(&snapshot);
        self.retriever.replace_snapshot(snapshot)?;
        Ok(self.retriever.snapshot()?)
    }

    pub fn process(&self, question: &str) -> ProcessResult {
        self.process_where(question, |_| true)
    }

    pub fn process_in_category(&self, question: &str, category: &str) -> ProcessResult {
        self.process_where(question, |entry| entry.in_category(category))
    }

    /// Never fails: retrieval errors and panics become the fixed error result.
    pub fn process_where<P>(&self, question: &str, predicate: P) -> ProcessResult
    where
        P: Fn(&KnowledgeEntry) -> bool,
    {
        if question.trim().is_empty() {
            return ProcessResult::no_match(question, Vec::new());
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let top_k = self.options.default_top_k;
            let candidates = self.retriever.retrieve_where(question, top_k, &predicate)?;
            Ok::<_, MatchError>(self.resolve(question, candidates))
        }))
        .unwrap_or_else(|panic| Err(MatchError::Pipeline(panic_message(panic.as_ref()))));

        match outcome {
            Ok(result) => result,
            Err(error) => {
                self.observer.on_pipeline_failure(question, &error);
                ProcessResult::pipeline_error(question)
            }
        }
    }

    pub fn find_duplicate(&self, question: &str) -> Result<Option<(KnowledgeEntry, f64)>, MatchError> {
        self.retriever
            .find_duplicate(question, self.options.duplicate_threshold)
    }

    fn resolve(&self, question: &str, candidates: Vec<Candidate>) -> ProcessResult {
        self.observer.on_candidates(question, &candidates);

        let band = self.classifier.classify(&candidates);
        let confidence = candidates.first().map_or(0.0, |best| best.similarity);
        self.observer.on_decision(question, band, confidence);

        let Some(best) = candidates.first() else {
            return ProcessResult::no_match(question, candidates);
        };

        let (answer, is_synthesized) = match band {
            ConfidenceBand::None => return ProcessResult::no_match(question, candidates),
            ConfidenceBand::Exact => (best.answer.clone(), false),
            ConfidenceBand::Synthesizable => {
                let eligible = self.classifier.eligible(&candidates);
                // A lone candidate is only reused verbatim when it is close
                // enough to count as a paraphrase.
                if eligible.len() == 1 && best.similarity >= self.options.duplicate_threshold {
                    (best.answer.clone(), false)
                } else {
                    let synthesized = self.synthesized_answer(question, &eligible, best);
                    (self.qualifier.apply(&synthesized, confidence), true)
                }
            }
            ConfidenceBand::Weak => (self.qualifier.apply(&best.answer, confidence), true),
        };

        ProcessResult {
            question: question.to_string(),
            answer,
            confidence,
            is_synthesized,
            candidates,
        }
    }

    fn synthesized_answer(
        &self,
        question: &str,
        eligible: &[&Candidate],
        best: &Candidate,
    ) -> String {
        match self.synthesizer.synthesize(eligible.iter().copied()) {
            Some(answer) => answer,
            None => {
                let error = MatchError::Synthesis("no answer groups formed".to_string());
                self.observer.on_synthesis_fallback(question, &error);
                best.answer.clone()
            }
        }
    }
}

async fn load_snapshot(source: &dyn KnowledgeSource) -> Result<CorpusSnapshot, LoadError> {
    let entries = source.load_entries().await?;
    let received = entries.len();
    let snapshot = CorpusSnapshot::from_entries(entries);

    if received > 0 && snapshot.is_empty() {
        return Err(LoadError::EmptyCorpus(source.describe()));
    }
    Ok(snapshot)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic during question processing".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NO_MATCH_ANSWER, PIPELINE_ERROR_ANSWER};
    use crate::observer::NoopObserver;
    use crate::sources::StaticSource;
    use crate::synthesis::PARTIAL_ANSWER;
    use std::sync::Mutex;

    fn processor(entries: Vec<KnowledgeEntry>) -> QuestionProcessor {
        QuestionProcessor::with_observer(
            CorpusSnapshot::from_entries(entries),
            MatchOptions::default(),
            Arc::new(NoopObserver),
        )
        .expect("default options are valid")
    }

    #[test]
    fn empty_question_is_no_match() {
        let result = processor(vec![KnowledgeEntry::new(1, "q", "a")]).process("   ");
        assert_eq!(result.answer, NO_MATCH_ANSWER);
        assert_eq!(result.confidence, 0.0);
        assert!(result.candidates.is_empty());
    }

    #[test]
    fn exact_match_reuses_answer() {
        let result = processor(vec![
            KnowledgeEntry::new(1, "Do you support SSO?", "Yes, via SAML 2.0."),
            KnowledgeEntry::new(2, "Do you support SCIM?", "No"),
        ])
        .process("do you support sso");

        assert_eq!(result.answer, "Yes, via SAML 2.0.");
        assert_eq!(result.confidence, 1.0);
        assert!(!result.is_synthesized);
        assert_eq!(result.candidates[0].entry_id, 1);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let options = MatchOptions {
            default_top_k: 0,
            ..MatchOptions::default()
        };
        assert!(QuestionProcessor::new(CorpusSnapshot::empty(), options).is_err());
    }

    #[test]
    fn split_yes_no_vote_yields_partial_with_qualifier() {
        let result = processor(vec![
            KnowledgeEntry::new(1, "Do you encrypt laptops?", "Yes"),
            KnowledgeEntry::new(2, "Do you encrypt phones?", "No"),
        ])
        .process("Do you encrypt tablets?");

        assert!(result.is_synthesized);
        assert!(result.confidence > 0.2 && result.confidence < 0.95);
        assert!(result.answer.starts_with("Partially - depends on specific requirements and context"));
        assert!(result.answer.contains("(Based on"));
        assert_ne!(result.answer, PARTIAL_ANSWER);
    }

    #[test]
    fn loosely_related_single_candidate_is_synthesized() {
        let result = processor(vec![
            KnowledgeEntry::new(1, "Do you rotate encryption keys", "Yes"),
            KnowledgeEntry::new(2, "zzzz qqqq", "No"),
        ])
        .process("keys policy");

        assert!(
            result.confidence > 0.2 && result.confidence < 0.6,
            "confidence was {}",
            result.confidence
        );
        assert!(result.is_synthesized);
        assert_eq!(result.answer, "Yes (Based on multiple similar questions).");
    }

    #[test]
    fn weak_match_falls_back_to_best_answer() {
        let result = processor(vec![KnowledgeEntry::new(
            1,
            "Describe your incident response plan",
            "We follow NIST 800-61.",
        )])
        .process("xyz");

        // only the "y" of "your" is shared
        assert!(result.confidence > 0.0 && result.confidence <= 0.2);
        assert!(result.is_synthesized);
        assert_eq!(
            result.answer,
            "We follow NIST 800-61 (Based on multiple similar questions)."
        );
    }

    #[test]
    fn zero_similarity_everywhere_is_no_match() {
        let result = processor(vec![KnowledgeEntry::new(1, "aaa", "answer")]).process("zzz");
        assert_eq!(result.answer, NO_MATCH_ANSWER);
        assert!(!result.is_synthesized);
        assert_eq!(result.candidates.len(), 1);
    }

    struct PanickingObserver;

    impl MatchObserver for PanickingObserver {
        fn on_candidates(&self, _query: &str, _candidates: &[Candidate]) {
            panic!("observer exploded");
        }
    }

    #[test]
    fn panics_become_error_results() {
        let processor = QuestionProcessor::with_observer(
            CorpusSnapshot::from_entries(vec![KnowledgeEntry::new(1, "q", "a")]),
            MatchOptions::default(),
            Arc::new(PanickingObserver),
        )
        .expect("default options are valid");

        let result = processor.process("q");
        assert_eq!(result.answer, PIPELINE_ERROR_ANSWER);
        assert_eq!(result.confidence, 0.0);
        assert!(!result.is_synthesized);
    }

    #[derive(Default)]
    struct RecordingObserver {
        bands: Mutex<Vec<ConfidenceBand>>,
    }

    impl MatchObserver for RecordingObserver {
        fn on_decision(&self, _query: &str, band: ConfidenceBand, _confidence: f64) {
            if let Ok(mut bands) = self.bands.lock() {
                bands.push(band);
            }
        }
    }

    #[derive(Default)]
    struct FallbackObserver {
        fallbacks: Mutex<Vec<String>>,
    }

    impl MatchObserver for FallbackObserver {
        fn on_synthesis_fallback(&self, query: &str, error: &MatchError) {
            if let Ok(mut fallbacks) = self.fallbacks.lock() {
                fallbacks.push(format!("{query}: {error}"));
            }
        }
    }

    #[test]
    fn synthesis_fallback_is_reported_to_observer() {
        let observer = Arc::new(FallbackObserver::default());
        let processor = QuestionProcessor::with_observer(
            CorpusSnapshot::empty(),
            MatchOptions::default(),
            observer.clone(),
        )
        .expect("default options are valid");
        let best = Candidate {
            entry_id: 3,
            question: "Do you log access?".to_string(),
            answer: "Yes, for 90 days.".to_string(),
            similarity: 0.4,
        };

        let answer = processor.synthesized_answer("access logs", &[], &best);

        assert_eq!(answer, "Yes, for 90 days.");
        let fallbacks = observer.fallbacks.lock().expect("lock is not poisoned");
        assert_eq!(fallbacks.len(), 1);
        assert!(fallbacks[0].starts_with("access logs: "));
    }

    #[test]
    fn observer_sees_each_decision() {
        let observer = Arc::new(RecordingObserver::default());
        let processor = QuestionProcessor::with_observer(
            CorpusSnapshot::from_entries(vec![KnowledgeEntry::new(1, "Is MFA required?", "Yes")]),
            MatchOptions::default(),
            observer.clone(),
        )
        .expect("default options are valid");

        processor.process("is mfa required");
        processor.process("");

        let bands = observer.bands.lock().expect("lock is not poisoned");
        assert_eq!(*bands, vec![ConfidenceBand::Exact]);
    }

    #[tokio::test]
    async fn reload_swaps_corpus() -> Result<(), Box<dyn std::error::Error>> {
        let processor = processor(Vec::new());
        assert_eq!(processor.process("Where are you based?").answer, NO_MATCH_ANSWER);

        let source = StaticSource::new(vec![KnowledgeEntry::new(
            7,
            "Where are you based?",
            "Berlin",
        )]);
        let snapshot = processor.reload(&source).await?;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(processor.process("Where are you based?").answer, "Berlin");
        Ok(())
    }

    #[tokio::test]
    async fn reload_rejects_all_blank_sources() {
        let processor = processor(vec![KnowledgeEntry::new(1, "q", "a")]);
        let source = StaticSource::new(vec![KnowledgeEntry::new(2, " ", " ")]);

        let result = processor.reload(&source).await;
        assert!(matches!(result, Err(LoadError::EmptyCorpus(_))));
        assert_eq!(processor.process("q").answer, "a");
    }
}
