//! Retrieval with error containment.

use std::sync::Arc;

use tracing::{debug, error};

use crate::document::RetrievedChunk;
use crate::error::RagError;
use crate::vectorstore::VectorStore;

/// Number of chunks retrieved per question unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 4;

/// The outcome of a retrieval.
///
/// Retrieval never fails outright: a store failure yields no chunks and the
/// error is carried alongside so the caller can report it.
#[derive(Debug, Default)]
pub struct Retrieval {
    /// Retrieved chunks, nearest first.
    pub chunks: Vec<RetrievedChunk>,
    /// The store failure that emptied this result, if any.
    pub error: Option<RagError>,
}

impl Retrieval {
    /// Whether no chunks were retrieved.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Thin wrapper over [`VectorStore::query`] with a fixed result count.
#[derive(Debug, Clone)]
pub struct RetrievalEngine {
    store: Arc<VectorStore>,
    top_k: usize,
}

impl RetrievalEngine {
    /// Create an engine returning [`DEFAULT_TOP_K`] chunks per query.
    pub fn new(store: Arc<VectorStore>) -> Self {
        Self { store, top_k: DEFAULT_TOP_K }
    }

    /// Override the number of chunks returned by [`retrieve`](Self::retrieve).
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// The configured result count.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Retrieve the configured number of chunks for `query`.
    pub async fn retrieve(&self, query: &str) -> Retrieval {
        self.retrieve_k(query, self.top_k).await
    }

    /// Retrieve up to `k` chunks for `query`.
    ///
    /// Blank queries retrieve nothing.
    pub async fn retrieve_k(&self, query: &str, k: usize) -> Retrieval {
        if query.trim().is_empty() {
            return Retrieval::default();
        }

        match self.store.query(query, k).await {
            Ok(chunks) => {
                debug!(k, result_count = chunks.len(), "retrieved chunks");
                Retrieval { chunks, error: None }
            }
            Err(e) => {
                error!(error = %e, "retrieval failed, continuing without context");
                Retrieval { chunks: Vec::new(), error: Some(e) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;
    use crate::document::Chunk;
    use crate::embedding::EmbeddingProvider;
    use crate::inmemory::InMemoryIndex;

    /// Embeds "north"/"east" style texts onto two axes.
    struct AxisEmbedder;

    #[async_trait]
    impl EmbeddingProvider for AxisEmbedder {
        async fn embed(&self, text: &str) -> crate::Result<Vec<f32>> {
            let north = text.matches("north").count() as f32;
            let east = text.matches("east").count() as f32;
            Ok(vec![north, east])
        }

        fn name(&self) -> &str {
            "axis"
        }
    }

    fn chunk(text: &str) -> Chunk {
        Chunk { text: text.to_string(), metadata: HashMap::new() }
    }

    async fn store() -> Arc<VectorStore> {
        let store =
            VectorStore::with_index(Arc::new(InMemoryIndex::default()), Arc::new(AxisEmbedder));
        store
            .add(vec![chunk("north"), chunk("north north east"), chunk("east"), chunk("east east")])
            .await
            .unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn retrieves_configured_count_nearest_first() {
        let engine = RetrievalEngine::new(store().await);
        assert_eq!(engine.top_k(), DEFAULT_TOP_K);

        let retrieval = engine.with_top_k(2).retrieve("north").await;

        assert!(retrieval.error.is_none());
        let texts: Vec<&str> = retrieval.chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["north", "north north east"]);
    }

    #[tokio::test]
    async fn retrieve_k_overrides_and_caps_at_collection_size() {
        let engine = RetrievalEngine::new(store().await);
        assert_eq!(engine.retrieve_k("east", 1).await.chunks.len(), 1);
        assert_eq!(engine.retrieve_k("east", 10).await.chunks.len(), 4);
        assert!(engine.retrieve_k("east", 0).await.is_empty());
    }

    #[tokio::test]
    async fn blank_query_retrieves_nothing() {
        let engine = RetrievalEngine::new(store().await);
        let retrieval = engine.retrieve("  \n").await;
        assert!(retrieval.is_empty());
        assert!(retrieval.error.is_none());
    }
}
