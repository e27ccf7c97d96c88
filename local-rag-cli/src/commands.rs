//! Subcommand handlers.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use local_rag::document::META_CHUNK_INDEX;
use local_rag::ollama::{OllamaEmbeddingProvider, OllamaGenerationProvider};
use local_rag::{Answer, DocumentKind, RagPipeline, RawDocument, RetrievedChunk};
use serde::Serialize;
use tracing::{error, info};

use crate::cli::{Commands, OutputFormat, Settings};

/// Open the pipeline described by `settings` against the Ollama server.
pub async fn open_pipeline(settings: &Settings) -> Result<RagPipeline> {
    let config = settings.to_config().context("invalid configuration")?;
    let embedder = OllamaEmbeddingProvider::new(&config.embedding_model)
        .with_base_url(&settings.ollama_url);
    let generator = OllamaGenerationProvider::new(&config.generation_model)
        .with_base_url(&settings.ollama_url);

    RagPipeline::builder()
        .config(config)
        .embedding_provider(Arc::new(embedder))
        .generation_provider(Arc::new(generator))
        .build()
        .await
        .with_context(|| {
            format!("failed to open collection in {}", settings.storage_path.display())
        })
}

pub async fn run(settings: &Settings, command: Commands) -> Result<()> {
    let pipeline = open_pipeline(settings).await?;
    match command {
        Commands::Ingest { files, kind } => ingest(&pipeline, &files, kind.map(Into::into)).await,
        Commands::Ask { question, format } => {
            let answer = pipeline.ask(&question).await;
            print_answer(&answer, format)
        }
        Commands::Chat => crate::chat::run(&pipeline).await,
        Commands::Stats { format } => stats(&pipeline, format).await,
        Commands::Reset { yes } => reset(&pipeline, yes).await,
    }
}

/// Read a file into a [`RawDocument`], inferring its kind unless one is forced.
pub fn load_document(path: &Path, kind: Option<DocumentKind>) -> Result<RawDocument> {
    let kind = match kind {
        Some(kind) => kind,
        None => DocumentKind::from_path(path)
            .with_context(|| format!("cannot tell the type of {}; pass --type", path.display()))?,
    };
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let name = path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    );
    Ok(RawDocument::new(name, bytes, kind.as_str()))
}

async fn ingest(
    pipeline: &RagPipeline,
    files: &[PathBuf],
    kind: Option<DocumentKind>,
) -> Result<()> {
    let mut failed = 0usize;
    for path in files {
        let outcome = match load_document(path, kind) {
            Ok(document) => pipeline.ingest_document(document).await.map_err(anyhow::Error::from),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(report) => println!(
                "Ingested {} ({}): {} chunks from {} characters",
                report.document, report.kind, report.chunk_count, report.extracted_chars
            ),
            Err(e) => {
                failed += 1;
                error!(path = %path.display(), error = %e, "ingestion failed");
                eprintln!("Failed to ingest {}: {e:#}", path.display());
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} files could not be ingested", files.len());
    }
    Ok(())
}

/// Shorten `text` to at most `max` characters for display.
pub fn truncate(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let cut: String = flat.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}

pub fn print_sources(sources: &[RetrievedChunk]) {
    for (i, source) in sources.iter().enumerate() {
        let chunk = source.metadata.get(META_CHUNK_INDEX).map_or("?", String::as_str);
        println!(
            "{}. {} (chunk {chunk}, score {:.3})",
            i + 1,
            source.source().unwrap_or("unknown"),
            source.score
        );
        println!("   {}", truncate(&source.text, 100));
    }
}

fn print_answer(answer: &Answer, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(answer)?),
        OutputFormat::Text => {
            println!("{}", answer.text);
            if !answer.sources.is_empty() {
                println!("\nSources:");
                print_sources(&answer.sources);
            }
            if let Some(e) = &answer.error {
                eprintln!("warning: {e}");
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct StatsOutput<'a> {
    collection: &'a str,
    storage_path: String,
    record_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

async fn stats(pipeline: &RagPipeline, format: OutputFormat) -> Result<()> {
    let stats = pipeline.store_stats().await;
    let config = pipeline.config();
    let output = StatsOutput {
        collection: &config.collection_name,
        storage_path: config.storage_path.display().to_string(),
        record_count: stats.record_count,
        dimensions: stats.dimensions,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Text => {
            println!("Collection: {}", output.collection);
            println!("  Path:       {}", output.storage_path);
            println!("  Records:    {}", output.record_count);
            if let Some(dimensions) = output.dimensions {
                println!("  Dimensions: {dimensions}");
            }
        }
    }
    Ok(())
}

/// Whether a confirmation reply means yes.
pub fn is_affirmative(reply: &str) -> bool {
    matches!(reply.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

async fn reset(pipeline: &RagPipeline, yes: bool) -> Result<()> {
    let record_count = pipeline.store_stats().await.record_count;
    let collection = &pipeline.config().collection_name;

    if !yes {
        print!("Permanently delete {record_count} records from '{collection}'? [y/N] ");
        std::io::stdout().flush()?;
        let mut reply = String::new();
        std::io::stdin().lock().read_line(&mut reply)?;
        if !is_affirmative(&reply) {
            println!("Aborted.");
            return Ok(());
        }
    }

    pipeline.reset_store().await.context("failed to reset the collection")?;
    info!(collection = %collection, record_count, "collection reset from cli");
    println!("Deleted {record_count} records from '{collection}'.");
    Ok(())
}
