use tracing::{debug, info, warn};

use crate::confidence::ConfidenceBand;
use crate::corpus::CorpusSnapshot;
use crate::error::MatchError;
use crate::models::Candidate;

/// Receives structured events from the matching pipeline.
///
/// Implementations must not affect matching; every callback has an empty
/// default so observers only override what they care about.
pub trait MatchObserver: Send + Sync {
    fn on_candidates(&self, _query: &str, _candidates: &[Candidate]) {}

    fn on_decision(&self, _query: &str, _band: ConfidenceBand, _confidence: f64) {}

    fn on_scoring_failure(&self, _entry_id: i64, _error: &MatchError) {}

    fn on_synthesis_fallback(&self, _query: &str, _error: &MatchError) {}

    fn on_pipeline_failure(&self, _query: &str, _error: &MatchError) {}

    fn on_corpus_loaded(&self, _snapshot: &CorpusSnapshot) {}
}

/// Emits every pipeline event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl MatchObserver for TracingObserver {
    fn on_candidates(&self, query: &str, candidates: &[Candidate]) {
        debug!(
            query_len = query.len(),
            candidate_count = candidates.len(),
            best_similarity = candidates.first().map_or(0.0, |candidate| candidate.similarity),
            best_entry = ?candidates.first().map(|candidate| candidate.entry_id),
            "retrieved candidates"
        );
    }

    fn on_decision(&self, query: &str, band: ConfidenceBand, confidence: f64) {
        debug!(query_len = query.len(), band = %band, confidence, "confidence band chosen");
    }

    fn on_scoring_failure(&self, entry_id: i64, error: &MatchError) {
        warn!(entry_id, %error, "similarity scoring failed, scored as 0.0");
    }

    fn on_synthesis_fallback(&self, query: &str, error: &MatchError) {
        debug!(query_len = query.len(), %error, "synthesis failed, using best candidate answer");
    }

    fn on_pipeline_failure(&self, query: &str, error: &MatchError) {
        warn!(query_len = query.len(), %error, "question processing failed");
    }

    fn on_corpus_loaded(&self, snapshot: &CorpusSnapshot) {
        info!(
            entries = snapshot.len(),
            dropped = snapshot.dropped(),
            checksum = snapshot.checksum(),
            loaded_at = %snapshot.loaded_at().to_rfc3339(),
            "corpus snapshot loaded"
        );
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl MatchObserver for NoopObserver {}
