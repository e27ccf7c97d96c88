//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use local_rag::config::{DEFAULT_COLLECTION, DEFAULT_MODEL, DEFAULT_STORAGE_PATH};
use local_rag::ollama::DEFAULT_OLLAMA_URL;
use local_rag::{ChunkingStrategy, DEFAULT_TOP_K, DocumentKind, RagConfig};

#[derive(Parser, Debug)]
#[command(name = "lrag")]
#[command(about = "Ask questions about your own documents using local models")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add text or PDF files to the collection
    Ingest {
        /// Files to ingest
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Treat every file as this type instead of inferring it from the extension
        #[arg(long = "type", value_enum)]
        kind: Option<KindArg>,
    },

    /// Answer one question from the collection
    Ask {
        /// The question
        question: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Interactive question-answer session
    Chat,

    /// Show collection statistics
    Stats {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete every record in the collection
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Text,
    Pdf,
}

impl From<KindArg> for DocumentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Text => DocumentKind::Text,
            KindArg::Pdf => DocumentKind::Pdf,
        }
    }
}

/// Pipeline settings shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Directory holding the persisted collection
    #[arg(long, global = true, env = "LRAG_STORAGE_PATH", default_value = DEFAULT_STORAGE_PATH)]
    pub storage_path: PathBuf,

    /// Collection name
    #[arg(long, global = true, env = "LRAG_COLLECTION", default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    /// Ollama model used for embeddings
    #[arg(long, global = true, env = "LRAG_EMBEDDING_MODEL", default_value = DEFAULT_MODEL)]
    pub embedding_model: String,

    /// Ollama model used for answers
    #[arg(long, global = true, env = "LRAG_GENERATION_MODEL", default_value = DEFAULT_MODEL)]
    pub generation_model: String,

    /// Base URL of the Ollama server
    #[arg(long, global = true, env = "LRAG_OLLAMA_URL", default_value = DEFAULT_OLLAMA_URL)]
    pub ollama_url: String,

    /// Maximum chunk size in characters
    #[arg(long, global = true, env = "LRAG_CHUNK_SIZE", default_value_t = 1000)]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(long, global = true, env = "LRAG_CHUNK_OVERLAP", default_value_t = 200)]
    pub chunk_overlap: usize,

    /// Chunks retrieved per question
    #[arg(long, global = true, env = "LRAG_TOP_K", default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Chunking strategy (recursive or fixed)
    #[arg(long, global = true, env = "LRAG_CHUNKING", default_value = "recursive")]
    pub chunking: ChunkingStrategy,
}

impl Settings {
    /// Build and validate the pipeline configuration.
    pub fn to_config(&self) -> local_rag::Result<RagConfig> {
        RagConfig::builder()
            .storage_path(&self.storage_path)
            .collection_name(&self.collection)
            .embedding_model(&self.embedding_model)
            .generation_model(&self.generation_model)
            .chunk_size(self.chunk_size)
            .chunk_overlap(self.chunk_overlap)
            .top_k(self.top_k)
            .chunking(self.chunking)
            .build()
    }
}
