use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("similarity scoring failed: {0}")]
    Scoring(String),

    #[error("answer synthesis failed: {0}")]
    Synthesis(String),

    #[error("pipeline failure: {0}")]
    Pipeline(String),

    #[error("invalid match options: {0}")]
    InvalidOptions(String),

    #[error("corpus snapshot lock was poisoned")]
    CorpusLock,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no usable entries in {0}")]
    EmptyCorpus(String),

    #[error(transparent)]
    Match(#[from] MatchError),
}

pub type Result<T, E = MatchError> = std::result::Result<T, E>;
