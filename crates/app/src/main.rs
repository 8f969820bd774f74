use chrono::Utc;
use clap::{Parser, Subcommand};
use qa_match_core::{
    answerable_rows, load_rows, process_row, summarize, JsonFileSource, MatchOptions,
    QuestionProcessor, RowOutcome,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "qa-match", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON file holding the question/answer corpus
    #[arg(long, env = "QA_MATCH_CORPUS", default_value = "corpus.json")]
    corpus: String,

    /// Number of candidates retrieved per question
    #[arg(long, env = "QA_MATCH_TOP_K", default_value = "5")]
    top_k: usize,

    /// Best similarity at or above which an answer is reused verbatim
    #[arg(long, env = "QA_MATCH_EXACT_THRESHOLD", default_value = "0.95")]
    exact_threshold: f64,

    /// Similarity a candidate must exceed to take part in synthesis
    #[arg(long, env = "QA_MATCH_SYNTHESIS_THRESHOLD", default_value = "0.2")]
    synthesis_threshold: f64,
}

#[derive(Subcommand)]
enum Command {
    /// Answer one question from the corpus.
    Ask {
        #[arg(long)]
        question: String,
        /// Only match entries in this category.
        #[arg(long)]
        category: Option<String>,
    },
    /// List the closest corpus entries for a question.
    Similar {
        #[arg(long)]
        question: String,
    },
    /// Check whether a question already exists in the corpus.
    CheckDuplicate {
        #[arg(long)]
        question: String,
        /// Minimum similarity that counts as a duplicate.
        #[arg(long, env = "QA_MATCH_DUPLICATE_THRESHOLD", default_value = "0.6")]
        threshold: f64,
    },
    /// Answer every row of a questionnaire JSON file.
    Questionnaire {
        #[arg(long)]
        input: String,
        /// Rows processed at the same time.
        #[arg(long, default_value = "4")]
        concurrency: usize,
    },
}

impl Cli {
    fn match_options(&self) -> MatchOptions {
        let mut options = MatchOptions {
            default_top_k: self.top_k,
            exact_threshold: self.exact_threshold,
            synthesis_threshold: self.synthesis_threshold,
            ..MatchOptions::default()
        };
        if let Command::CheckDuplicate { threshold, .. } = &self.command {
            options.duplicate_threshold = *threshold;
        }
        options
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        corpus = %cli.corpus,
        "qa-match boot"
    );

    let source = JsonFileSource::new(&cli.corpus);
    let processor = QuestionProcessor::from_source(&source, cli.match_options())
        .await
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;
    let processor = Arc::new(processor);

    match cli.command {
        Command::Ask { question, category } => {
            let result = match category.as_deref() {
                Some(category) => processor.process_in_category(&question, category),
                None => processor.process(&question),
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Similar { question } => {
            let candidates = processor
                .retriever()
                .retrieve(&question, processor.options().default_top_k)
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            println!("query: {question}");
            for candidate in candidates {
                println!(
                    "[{}] similarity={:.4} question={}",
                    candidate.entry_id, candidate.similarity, candidate.question
                );
                println!("  answer={}", candidate.answer);
            }
        }
        Command::CheckDuplicate { question, .. } => {
            match processor
                .find_duplicate(&question)
                .map_err(|error| anyhow::anyhow!(error.to_string()))?
            {
                Some((entry, similarity)) => {
                    println!(
                        "duplicate: id={} similarity={similarity:.4} question={}",
                        entry.id, entry.question
                    );
                }
                None => println!("no duplicate found"),
            }
        }
        Command::Questionnaire { input, concurrency } => {
            let rows = load_rows(Path::new(&input))
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            let rows = Arc::new(rows);
            let indices: Vec<usize> = answerable_rows(&rows)
                .into_iter()
                .map(|(index, _)| index)
                .collect();

            info!(input = %input, rows = rows.len(), answerable = indices.len(), "processing questionnaire");

            let mut outcomes: Vec<RowOutcome> = Vec::with_capacity(indices.len());
            for batch in indices.chunks(concurrency.max(1)) {
                let handles: Vec<_> = batch
                    .iter()
                    .map(|&index| {
                        let processor = Arc::clone(&processor);
                        let rows = Arc::clone(&rows);
                        tokio::task::spawn_blocking(move || {
                            process_row(&processor, index, &rows[index])
                        })
                    })
                    .collect();

                for handle in handles {
                    outcomes.push(handle.await?);
                }
            }

            let report = summarize(
                outcomes,
                rows.len(),
                processor.options().low_confidence_threshold,
            );
            if !report.low_confidence.is_empty() {
                warn!(
                    "low_confidence_rows={} for input={}",
                    report.low_confidence.len(),
                    input
                );
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
