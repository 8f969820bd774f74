pub mod confidence;
pub mod corpus;
pub mod error;
pub mod models;
pub mod normalize;
pub mod observer;
pub mod processor;
pub mod questionnaire;
pub mod retriever;
pub mod similarity;
pub mod sources;
pub mod synthesis;
pub mod traits;

pub use confidence::{ConfidenceBand, ConfidenceClassifier};
pub use corpus::{CorpusSnapshot, IndexedEntry, SharedCorpus};
pub use error::{LoadError, MatchError};
pub use models::{
    Candidate, KnowledgeEntry, MatchOptions, ProcessResult, SignalWeights, NO_MATCH_ANSWER,
    PIPELINE_ERROR_ANSWER,
};
pub use normalize::{normalize, NormalizedText};
pub use observer::{MatchObserver, NoopObserver, TracingObserver};
pub use processor::QuestionProcessor;
pub use questionnaire::{
    answerable_rows, load_rows, process_questionnaire, process_row, summarize,
    QuestionnaireReport, QuestionnaireRow, RowMatch, RowOutcome,
};
pub use retriever::Retriever;
pub use similarity::{match_ratio, PreparedText, SignalBreakdown, SimilarityScorer};
pub use sources::{JsonFileSource, StaticSource};
pub use synthesis::{AnswerSynthesizer, ConfidenceQualifier, PARTIAL_ANSWER};
pub use traits::KnowledgeSource;
