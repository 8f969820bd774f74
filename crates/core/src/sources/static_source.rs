use crate::traits::KnowledgeSource;
use crate::{KnowledgeEntry, LoadError};
use async_trait::async_trait;

/// Serves a fixed, in-memory list of entries.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    entries: Vec<KnowledgeEntry>,
}

impl StaticSource {
    pub fn new(entries: Vec<KnowledgeEntry>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl KnowledgeSource for StaticSource {
    fn describe(&self) -> String {
        format!("static({} entries)", self.entries.len())
    }

    async fn load_entries(&self) -> Result<Vec<KnowledgeEntry>, LoadError> {
        Ok(self.entries.clone())
    }
}
