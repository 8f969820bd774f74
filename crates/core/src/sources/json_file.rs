use crate::traits::KnowledgeSource;
use crate::{KnowledgeEntry, LoadError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Reads a JSON array of `{id, question, answer, category?}` objects.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl KnowledgeSource for JsonFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load_entries(&self) -> Result<Vec<KnowledgeEntry>, LoadError> {
        if !self.path.is_file() {
            return Err(LoadError::InvalidArgument(format!(
                "corpus file not found: {}",
                self.path.display()
            )));
        }

        let bytes = tokio::fs::read(&self.path).await?;
        let entries: Vec<KnowledgeEntry> = serde_json::from_slice(&bytes)?;
        Ok(entries)
    }
}
