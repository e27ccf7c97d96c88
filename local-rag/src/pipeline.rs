//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] owns one [`VectorStore`] for its whole lifetime and
//! composes ingestion (extract → chunk → embed → store) with question
//! answering (retrieve → ground → generate).
//!
//! # Example
//!
//! ```rust,ignore
//! use local_rag::{RagConfig, RagPipeline, RawDocument};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .generation_provider(Arc::new(my_generator))
//!     .build()
//!     .await?;
//!
//! pipeline.ingest_document(RawDocument::text("notes.txt", notes)).await?;
//! let answer = pipeline.ask("What did we decide?").await;
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::answer::{Answer, AnswerGenerator};
use crate::chunking::{Chunker, chunker_for};
use crate::config::RagConfig;
use crate::document::{IngestReport, RawDocument, StoreStats};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::GenerationProvider;
use crate::index::VectorIndex;
use crate::ingest::IngestionPipeline;
use crate::retrieval::{Retrieval, RetrievalEngine};
use crate::vectorstore::VectorStore;

/// The RAG pipeline orchestrator.
///
/// Construct one via [`RagPipeline::builder()`]. Building opens the store,
/// so every operation on a `RagPipeline` runs against an initialized
/// collection.
///
/// Operations take `&self` but the pipeline does not serialize callers:
/// run one ingestion or question at a time per pipeline.
#[derive(Debug)]
pub struct RagPipeline {
    config: RagConfig,
    store: Arc<VectorStore>,
    ingestion: IngestionPipeline,
    retrieval: RetrievalEngine,
    answers: AnswerGenerator,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the vector store.
    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    /// Extract, chunk, embed and store one document.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::UnsupportedDocumentType`],
    /// [`RagError::ExtractionError`], [`RagError::EmbeddingError`] or
    /// [`RagError::StorageError`]. On any error nothing from the document
    /// has been stored.
    pub async fn ingest_document(&self, document: RawDocument) -> Result<IngestReport> {
        self.ingestion.ingest(&document, &self.store).await
    }

    /// Retrieve the configured number of chunks for `query` without generating.
    pub async fn retrieve(&self, query: &str) -> Retrieval {
        self.retrieval.retrieve(query).await
    }

    /// Answer `query` from the stored documents.
    ///
    /// Never fails: a retrieval failure degrades to the no-context answer and
    /// a generation failure to the fixed error answer. Either way the
    /// underlying failure is reported in [`Answer::error`].
    pub async fn ask(&self, query: &str) -> Answer {
        let Retrieval { chunks, error } = self.retrieval.retrieve(query).await;
        if let Some(e) = error {
            warn!(error = %e, "answering without context after retrieval failure");
            return Answer { error: Some(e.to_string()), ..Answer::no_context() };
        }
        self.answers.generate(query, chunks).await
    }

    /// Irreversibly delete every stored record and start an empty collection.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::StorageError`] if the storage cannot be reset.
    pub async fn reset_store(&self) -> Result<()> {
        self.store.clear().await?;
        info!(collection = %self.config.collection_name, "store reset");
        Ok(())
    }

    /// Current record count and embedding dimensionality.
    pub async fn store_stats(&self) -> StoreStats {
        self.store.stats().await
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `config`, `embedding_provider` and `generation_provider` are required.
/// Without an injected index, [`build()`](RagPipelineBuilder::build) opens
/// the [`PersistentIndex`](crate::PersistentIndex) named by the config.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = RagPipeline::builder()
///     .config(config)
///     .embedding_provider(Arc::new(embedder))
///     .generation_provider(Arc::new(generator))
///     .index(Arc::new(InMemoryIndex::default()))  // optional
///     .build()
///     .await?;
/// ```
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    generation_provider: Option<Arc<dyn GenerationProvider>>,
    index: Option<Arc<dyn VectorIndex>>,
    chunker: Option<Arc<dyn Chunker>>,
    scratch_dir: Option<PathBuf>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider used for both chunks and questions.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the generation provider.
    pub fn generation_provider(mut self, provider: Arc<dyn GenerationProvider>) -> Self {
        self.generation_provider = Some(provider);
        self
    }

    /// Use `index` instead of opening the persisted collection.
    pub fn index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Override the chunker selected by the config.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Directory for PDF extraction scratch files.
    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Validate the configuration and initialize the store.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing or
    /// the config is invalid, and [`RagError::StorageError`] if the
    /// persisted collection cannot be opened.
    pub async fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let generation_provider = self
            .generation_provider
            .ok_or_else(|| RagError::ConfigError("generation_provider is required".to_string()))?;
        config.validate()?;

        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => chunker_for(&config)?,
        };

        let embedder_name = embedding_provider.name().to_string();
        let generator_name = generation_provider.name().to_string();
        let store = Arc::new(match self.index {
            Some(index) => VectorStore::with_index(index, embedding_provider),
            None => {
                VectorStore::initialize(
                    &config.storage_path,
                    &config.collection_name,
                    embedding_provider,
                )
                .await?
            }
        });

        let mut ingestion = IngestionPipeline::new(chunker);
        if let Some(dir) = self.scratch_dir {
            ingestion = ingestion.with_scratch_dir(dir);
        }
        let retrieval = RetrievalEngine::new(Arc::clone(&store)).with_top_k(config.top_k);
        let answers = AnswerGenerator::new(generation_provider);

        info!(
            collection = %config.collection_name,
            backend = store.index().backend(),
            chunking = ?config.chunking,
            top_k = config.top_k,
            embedder = %embedder_name,
            embedding_model = %config.embedding_model,
            generator = %generator_name,
            generation_model = %config.generation_model,
            "pipeline ready"
        );

        Ok(RagPipeline { config, store, ingestion, retrieval, answers })
    }
}
