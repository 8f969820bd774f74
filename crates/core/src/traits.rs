use crate::{KnowledgeEntry, LoadError};
use async_trait::async_trait;

/// Supplies the corpus the engine matches against.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Short label used in logs and errors.
    fn describe(&self) -> String;

    async fn load_entries(&self) -> Result<Vec<KnowledgeEntry>, LoadError>;
}
