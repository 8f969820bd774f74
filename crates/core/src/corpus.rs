use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::error::MatchError;
use crate::models::KnowledgeEntry;
use crate::similarity::PreparedText;

/// A corpus entry together with its precomputed comparison form.
#[derive(Debug, Clone)]
pub struct IndexedEntry {
    pub entry: KnowledgeEntry,
    pub prepared: PreparedText,
}

/// Immutable view of the knowledge base used for matching.
#[derive(Debug)]
pub struct CorpusSnapshot {
    entries: Arc<[IndexedEntry]>,
    dropped: usize,
    checksum: String,
    loaded_at: DateTime<Utc>,
}

impl CorpusSnapshot {
    pub fn empty() -> Self {
        Self::from_entries(Vec::new())
    }

    /// Builds a snapshot, dropping entries whose question or answer is blank.
    pub fn from_entries(entries: Vec<KnowledgeEntry>) -> Self {
        let total = entries.len();
        let indexed: Vec<IndexedEntry> = entries
            .into_iter()
            .filter(KnowledgeEntry::is_usable)
            .map(|entry| IndexedEntry {
                prepared: PreparedText::new(&entry.question),
                entry,
            })
            .collect();

        let dropped = total - indexed.len();
        let checksum = checksum_entries(&indexed);

        Self {
            entries: indexed.into(),
            dropped,
            checksum,
            loaded_at: Utc::now(),
        }
    }

    pub fn entries(&self) -> &[IndexedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

fn checksum_entries(entries: &[IndexedEntry]) -> String {
    let mut hasher = Sha256::new();
    for IndexedEntry { entry, .. } in entries {
        hasher.update(entry.id.to_le_bytes());
        hasher.update(entry.question.as_bytes());
        hasher.update([0u8]);
        hasher.update(entry.answer.as_bytes());
        hasher.update([0u8]);
        if let Some(category) = &entry.category {
            hasher.update(category.as_bytes());
        }
        hasher.update([0xffu8]);
    }
    format!("{:x}", hasher.finalize())
}

/// Shared handle to the current snapshot; reloads swap the whole `Arc`.
#[derive(Debug)]
pub struct SharedCorpus {
    current: RwLock<Arc<CorpusSnapshot>>,
}

impl SharedCorpus {
    pub fn new(snapshot: CorpusSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn current(&self) -> Result<Arc<CorpusSnapshot>, MatchError> {
        self.current
            .read()
            .map(|guard| Arc::clone(&guard))
            .map_err(|_| MatchError::CorpusLock)
    }

    /// Installs `snapshot` and returns the one it replaced.
    pub fn replace(&self, snapshot: CorpusSnapshot) -> Result<Arc<CorpusSnapshot>, MatchError> {
        let mut guard = self.current.write().map_err(|_| MatchError::CorpusLock)?;
        Ok(std::mem::replace(&mut *guard, Arc::new(snapshot)))
    }
}

impl Default for SharedCorpus {
    fn default() -> Self {
        Self::new(CorpusSnapshot::empty())
    }
}
