//! Configuration for the RAG pipeline.
//!
//! Everything the pipeline needs is passed in through a [`RagConfig`] at
//! construction time. The library never reads process-wide state.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Model used for both embeddings and generation unless overridden.
pub const DEFAULT_MODEL: &str = "llama2";

/// Directory that holds the persisted collection.
pub const DEFAULT_STORAGE_PATH: &str = "llama_rag_db";

/// Name of the single collection per deployment.
pub const DEFAULT_COLLECTION: &str = "user_documents";

/// Which [`Chunker`](crate::Chunker) splits extracted text.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChunkingStrategy {
    /// Prefer paragraph, line and word boundaries before hard cuts.
    #[default]
    Recursive,
    /// Exact character windows.
    FixedSize,
}

impl std::str::FromStr for ChunkingStrategy {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recursive" => Ok(Self::Recursive),
            "fixed" | "fixed_size" | "fixed-size" => Ok(Self::FixedSize),
            other => Err(RagError::ConfigError(format!("unknown chunking strategy '{other}'"))),
        }
    }
}

/// Configuration parameters for the RAG pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Model name passed to the embedding provider.
    pub embedding_model: String,
    /// Model name passed to the generation provider.
    pub generation_model: String,
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Directory holding the persisted collection.
    pub storage_path: PathBuf,
    /// Name of the persisted collection.
    pub collection_name: String,
    /// Chunking strategy used during ingestion.
    #[serde(default)]
    pub chunking: ChunkingStrategy,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            embedding_model: DEFAULT_MODEL.to_string(),
            generation_model: DEFAULT_MODEL.to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: crate::retrieval::DEFAULT_TOP_K,
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            collection_name: DEFAULT_COLLECTION.to_string(),
            chunking: ChunkingStrategy::default(),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0` or `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - a model name or the collection name is empty
    /// - the collection name contains a path separator
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if self.embedding_model.trim().is_empty() {
            return Err(RagError::ConfigError("embedding_model must not be empty".to_string()));
        }
        if self.generation_model.trim().is_empty() {
            return Err(RagError::ConfigError("generation_model must not be empty".to_string()));
        }
        let name = self.collection_name.trim();
        if name.is_empty() {
            return Err(RagError::ConfigError("collection_name must not be empty".to_string()));
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(RagError::ConfigError(format!(
                "collection_name '{name}' must be a plain file name"
            )));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the embedding model name.
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.config.embedding_model = model.into();
        self
    }

    /// Set the generation model name.
    pub fn generation_model(mut self, model: impl Into<String>) -> Self {
        self.config.generation_model = model.into();
        self
    }

    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of chunks retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the directory holding the persisted collection.
    pub fn storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage_path = path.into();
        self
    }

    /// Set the persisted collection name.
    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.config.collection_name = name.into();
        self
    }

    /// Set the chunking strategy.
    pub fn chunking(mut self, strategy: ChunkingStrategy) -> Self {
        self.config.chunking = strategy;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
