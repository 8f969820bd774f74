use std::sync::Arc;

use crate::corpus::{CorpusSnapshot, IndexedEntry, SharedCorpus};
use crate::error::MatchError;
use crate::models::{Candidate, KnowledgeEntry};
use crate::observer::MatchObserver;
use crate::similarity::{PreparedText, SimilarityScorer};

/// Scores a query against every corpus entry and ranks the results.
pub struct Retriever {
    corpus: SharedCorpus,
    scorer: SimilarityScorer,
    observer: Arc<dyn MatchObserver>,
}

impl Retriever {
    pub fn new(
        snapshot: CorpusSnapshot,
        scorer: SimilarityScorer,
        observer: Arc<dyn MatchObserver>,
    ) -> Self {
        Self {
            corpus: SharedCorpus::new(snapshot),
            scorer,
            observer,
        }
    }

    pub fn snapshot(&self) -> Result<Arc<CorpusSnapshot>, MatchError> {
        self.corpus.current()
    }

    pub fn replace_snapshot(
        &self,
        snapshot: CorpusSnapshot,
    ) -> Result<Arc<CorpusSnapshot>, MatchError> {
        self.corpus.replace(snapshot)
    }

    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Candidate>, MatchError> {
        self.retrieve_where(query, k, |_| true)
    }

    pub fn retrieve_in_category(
        &self,
        query: &str,
        k: usize,
        category: &str,
    ) -> Result<Vec<Candidate>, MatchError> {
        self.retrieve_where(query, k, |entry| entry.in_category(category))
    }

    /// Top `k` entries passing `predicate`, best first. No minimum score is
    /// applied; equal scores keep corpus order.
    pub fn retrieve_where<P>(
        &self,
        query: &str,
        k: usize,
        predicate: P,
    ) -> Result<Vec<Candidate>, MatchError>
    where
        P: Fn(&KnowledgeEntry) -> bool,
    {
        let snapshot = self.corpus.current()?;
        let mut scored = self.score_all(&snapshot, query, predicate);

        scored.sort_by(|left, right| right.1.total_cmp(&left.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(item, similarity)| Candidate {
                entry_id: item.entry.id,
                question: item.entry.question.clone(),
                answer: item.entry.answer.clone(),
                similarity,
            })
            .collect())
    }

    /// Best entry scoring at least `threshold` against `question`.
    pub fn find_duplicate(
        &self,
        question: &str,
        threshold: f64,
    ) -> Result<Option<(KnowledgeEntry, f64)>, MatchError> {
        let snapshot = self.corpus.current()?;
        let mut best: Option<(&IndexedEntry, f64)> = None;

        for (item, similarity) in self.score_all(&snapshot, question, |_| true) {
            if best.map_or(true, |(_, top)| similarity > top) {
                best = Some((item, similarity));
            }
        }

        Ok(best
            .filter(|(_, similarity)| *similarity >= threshold)
            .map(|(item, similarity)| (item.entry.clone(), similarity)))
    }

    fn score_all<'a, P>(
        &self,
        snapshot: &'a CorpusSnapshot,
        query: &str,
        predicate: P,
    ) -> Vec<(&'a IndexedEntry, f64)>
    where
        P: Fn(&KnowledgeEntry) -> bool,
    {
        let prepared_query = PreparedText::new(query);

        snapshot
            .entries()
            .iter()
            .filter(|item| predicate(&item.entry))
            .map(|item| {
                let similarity = match self.scorer.try_score_prepared(&prepared_query, &item.prepared) {
                    Ok(similarity) => similarity,
                    Err(error) => {
                        self.observer.on_scoring_failure(item.entry.id, &error);
                        0.0
                    }
                };
                (item, similarity)
            })
            .collect()
    }
}
