//! In-memory vector index using cosine similarity.
//!
//! [`InMemoryIndex`] keeps its single collection behind a
//! `tokio::sync::RwLock` and never touches the disk. It is suitable for
//! tests and throwaway sessions.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{ScoredRecord, VectorRecord};
use crate::error::Result;
use crate::index::{Collection, VectorIndex};

const BACKEND: &str = "in-memory";

/// A non-durable [`VectorIndex`].
///
/// [`persist`](VectorIndex::persist) is a no-op; everything is lost when the
/// index is dropped.
///
/// # Example
///
/// ```rust,ignore
/// use local_rag::{InMemoryIndex, VectorIndex};
///
/// let index = InMemoryIndex::new("docs");
/// assert!(index.is_empty().await);
/// ```
#[derive(Debug)]
pub struct InMemoryIndex {
    collection: RwLock<Collection>,
}

impl InMemoryIndex {
    /// Create an empty index holding a collection called `name`.
    pub fn new(name: &str) -> Self {
        Self { collection: RwLock::new(Collection::empty(name)) }
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_COLLECTION)
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn add(&self, records: Vec<VectorRecord>) -> Result<()> {
        let mut collection = self.collection.write().await;
        let dimensions = collection.check_records(&records)?;
        collection.dimensions = dimensions;
        collection.records.extend(records);
        Ok(())
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredRecord>> {
        self.collection.read().await.rank(embedding, top_k)
    }

    async fn persist(&self) -> Result<()> {
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut collection = self.collection.write().await;
        let name = std::mem::take(&mut collection.name);
        *collection = Collection::empty(&name);
        Ok(())
    }

    async fn len(&self) -> usize {
        self.collection.read().await.records.len()
    }

    async fn dimensions(&self) -> Option<usize> {
        self.collection.read().await.dimensions
    }

    fn backend(&self) -> &str {
        BACKEND
    }
}
