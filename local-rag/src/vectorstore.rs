//! The vector store: embeds chunks and queries on top of a [`VectorIndex`].

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::document::{Chunk, RetrievedChunk, StoreStats, VectorRecord};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::VectorIndex;
use crate::persistent::PersistentIndex;

/// Durable collection of embedded chunks, queryable by semantic similarity.
///
/// The store pairs one [`EmbeddingProvider`] with one [`VectorIndex`]. The
/// same provider embeds both the stored chunks and every query, which is
/// what makes similarity scores comparable.
pub struct VectorStore {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
}

impl VectorStore {
    /// Open or create the persisted collection `collection` under `path`.
    ///
    /// Safe to call repeatedly on the same path: existing records are loaded,
    /// never duplicated or dropped.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::StorageError`] if the storage cannot be created or read.
    pub async fn initialize(
        path: impl Into<PathBuf>,
        collection: &str,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let index = PersistentIndex::open(path, collection).await?;
        Ok(Self::with_index(Arc::new(index), embedder))
    }

    /// Build a store over an already opened index.
    pub fn with_index(index: Arc<dyn VectorIndex>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder, index }
    }

    /// The underlying index.
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Embed and append chunks, returning how many records were added.
    ///
    /// Either every chunk is stored and persisted or none is.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if embedding fails or returns the
    /// wrong number of vectors, and [`RagError::StorageError`] if persisting
    /// fails.
    pub async fn add(&self, chunks: Vec<Chunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
            error!(provider = self.embedder.name(), error = %e, "embedding failed during add");
            self.as_embedding_error(e)
        })?;

        if embeddings.len() != chunks.len() {
            return Err(RagError::EmbeddingError {
                provider: self.embedder.name().to_string(),
                message: format!(
                    "expected {} embeddings, provider returned {}",
                    chunks.len(),
                    embeddings.len()
                ),
            });
        }

        let records: Vec<VectorRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| VectorRecord {
                id: Uuid::new_v4().to_string(),
                text: chunk.text,
                embedding,
                metadata: chunk.metadata,
            })
            .collect();

        let count = records.len();
        self.index.add(records).await?;
        info!(backend = self.index.backend(), record_count = count, "added records");
        Ok(count)
    }

    /// Return the `k` stored chunks nearest to `query_text`, nearest first.
    ///
    /// An empty collection yields an empty result without calling the
    /// embedding provider.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if the query cannot be embedded
    /// and [`RagError::StorageError`] if the index fails.
    pub async fn query(&self, query_text: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        if k == 0 || self.index.is_empty().await {
            return Ok(Vec::new());
        }

        let embedding =
            self.embedder.embed(query_text).await.map_err(|e| self.as_embedding_error(e))?;
        let results = self.index.query(&embedding, k).await?;
        debug!(k, result_count = results.len(), "similarity query completed");

        Ok(results.into_iter().map(RetrievedChunk::from).collect())
    }

    /// Destroy every record and reinitialize an empty collection in place.
    ///
    /// There is no confirmation step and no way back.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::StorageError`] if the storage cannot be reset.
    pub async fn clear(&self) -> Result<()> {
        self.index.clear().await
    }

    /// Current record count and dimensionality.
    pub async fn stats(&self) -> StoreStats {
        StoreStats {
            record_count: self.index.len().await,
            dimensions: self.index.dimensions().await,
        }
    }

    fn as_embedding_error(&self, e: RagError) -> RagError {
        match e {
            RagError::EmbeddingError { .. } => e,
            other => RagError::EmbeddingError {
                provider: self.embedder.name().to_string(),
                message: other.to_string(),
            },
        }
    }
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("embedder", &self.embedder.name())
            .field("backend", &self.index.backend())
            .finish()
    }
}
