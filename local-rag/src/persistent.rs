//! File-backed vector index.
//!
//! [`PersistentIndex`] keeps its collection in memory for querying and
//! mirrors it to `<dir>/<collection>.json`. Every write goes to a sibling
//! temp file that is then renamed over the snapshot, so a reader never
//! observes a half-written collection on disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::document::{ScoredRecord, VectorRecord};
use crate::error::{RagError, Result};
use crate::index::{Collection, VectorIndex};

const BACKEND: &str = "json-file";

/// A durable [`VectorIndex`] stored as a JSON snapshot in a directory.
///
/// Opening is idempotent: opening the same directory and collection again
/// yields the records that were persisted, without duplicating them.
///
/// # Example
///
/// ```rust,ignore
/// use local_rag::{PersistentIndex, VectorIndex};
///
/// let index = PersistentIndex::open("llama_rag_db", "user_documents").await?;
/// println!("{} records", index.len().await);
/// ```
#[derive(Debug)]
pub struct PersistentIndex {
    dir: PathBuf,
    name: String,
    collection: RwLock<Collection>,
}

impl PersistentIndex {
    /// Open or create the collection `name` under `dir`.
    ///
    /// The directory is created if absent, and an empty snapshot is written
    /// for a new collection so the storage exists as soon as this returns.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::StorageError`] if the directory cannot be created
    /// or an existing snapshot cannot be read or parsed.
    pub async fn open(dir: impl Into<PathBuf>, name: &str) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            error!(dir = %dir.display(), error = %e, "failed to create storage directory");
            RagError::storage(BACKEND, format!("failed to create '{}': {e}", dir.display()))
        })?;

        let path = snapshot_path(&dir, name);
        let (collection, created) = match load_snapshot(&path, name).await? {
            Some(collection) => (collection, false),
            None => (Collection::empty(name), true),
        };
        let record_count = collection.records.len();
        let index = Self { dir, name: name.to_string(), collection: RwLock::new(collection) };

        if created {
            index.write_snapshot(&Collection::empty(name)).await?;
            info!(collection = name, path = %path.display(), "created empty collection");
        } else {
            info!(collection = name, record_count, path = %path.display(), "opened collection");
        }

        Ok(index)
    }

    /// The directory holding the collection.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the collection snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        snapshot_path(&self.dir, &self.name)
    }

    async fn write_snapshot(&self, collection: &Collection) -> Result<()> {
        let path = self.snapshot_path();
        let temp_path = path.with_extension("json.tmp");

        let bytes = serde_json::to_vec(collection).map_err(|e| {
            RagError::storage(BACKEND, format!("failed to serialize collection: {e}"))
        })?;

        let result = async {
            tokio::fs::create_dir_all(&self.dir).await?;
            tokio::fs::write(&temp_path, &bytes).await?;
            tokio::fs::rename(&temp_path, &path).await
        }
        .await;

        if let Err(e) = result {
            // Best effort; a stale temp file is ignored on the next write.
            let _ = tokio::fs::remove_file(&temp_path).await;
            error!(path = %path.display(), error = %e, "failed to write collection snapshot");
            return Err(RagError::storage(
                BACKEND,
                format!("failed to write '{}': {e}", path.display()),
            ));
        }

        debug!(path = %path.display(), bytes = bytes.len(), "wrote collection snapshot");
        Ok(())
    }

    async fn reset_on_disk(&self) -> Result<()> {
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(RagError::storage(
                    BACKEND,
                    format!("failed to remove '{}': {e}", self.dir.display()),
                ));
            }
        }
        self.write_snapshot(&Collection::empty(&self.name)).await
    }
}

fn snapshot_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.json"))
}

/// Read the snapshot at `path`, or `None` if there is none yet.
async fn load_snapshot(path: &Path, name: &str) -> Result<Option<Collection>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(RagError::storage(
                BACKEND,
                format!("failed to read '{}': {e}", path.display()),
            ));
        }
    };

    let collection: Collection = serde_json::from_slice(&bytes).map_err(|e| {
        RagError::storage(BACKEND, format!("corrupt snapshot '{}': {e}", path.display()))
    })?;

    if collection.name != name {
        return Err(RagError::storage(
            BACKEND,
            format!(
                "snapshot '{}' holds collection '{}', expected '{name}'",
                path.display(),
                collection.name
            ),
        ));
    }

    Ok(Some(collection))
}

#[async_trait]
impl VectorIndex for PersistentIndex {
    async fn add(&self, records: Vec<VectorRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut collection = self.collection.write().await;
        let dimensions = collection.check_records(&records)?;

        let previous_len = collection.records.len();
        let previous_dimensions = collection.dimensions;
        collection.records.extend(records);
        collection.dimensions = dimensions;

        if let Err(e) = self.write_snapshot(&collection).await {
            collection.records.truncate(previous_len);
            collection.dimensions = previous_dimensions;
            return Err(e);
        }

        Ok(())
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredRecord>> {
        self.collection.read().await.rank(embedding, top_k)
    }

    async fn persist(&self) -> Result<()> {
        let collection = self.collection.read().await;
        self.write_snapshot(&collection).await
    }

    async fn clear(&self) -> Result<()> {
        let mut collection = self.collection.write().await;

        match self.reset_on_disk().await {
            Ok(()) => {
                *collection = Collection::empty(&self.name);
                info!(collection = %self.name, dir = %self.dir.display(), "cleared collection");
                Ok(())
            }
            Err(e) => {
                // Whatever survived on disk is now the truth.
                let path = self.snapshot_path();
                *collection = match load_snapshot(&path, &self.name).await {
                    Ok(Some(survivor)) => survivor,
                    Ok(None) => Collection::empty(&self.name),
                    Err(reload) => {
                        warn!(error = %reload, "snapshot unreadable after failed clear");
                        Collection::empty(&self.name)
                    }
                };
                error!(collection = %self.name, error = %e, "failed to clear collection");
                Err(e)
            }
        }
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

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn record(id: &str, embedding: Vec<f32>) -> VectorRecord {
        let text = format!("text {id}");
        VectorRecord { id: id.into(), text, embedding, metadata: HashMap::new() }
    }

    #[tokio::test]
    async fn open_creates_directory_and_empty_snapshot() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("nested").join("db");

        let index = PersistentIndex::open(&dir, "docs").await.unwrap();

        assert!(dir.is_dir());
        assert!(index.snapshot_path().is_file());
        assert_eq!(index.len().await, 0);
        assert_eq!(index.dimensions().await, None);
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let temp = tempfile::tempdir().unwrap();
        let index = PersistentIndex::open(temp.path(), "docs").await.unwrap();
        index.add(vec![record("a", vec![1.0, 0.0]), record("b", vec![0.0, 1.0])]).await.unwrap();
        drop(index);

        let reopened = PersistentIndex::open(temp.path(), "docs").await.unwrap();
        assert_eq!(reopened.len().await, 2);
        assert_eq!(reopened.dimensions().await, Some(2));
        let nearest = reopened.query(&[0.1, 1.0], 1).await.unwrap();
        assert_eq!(nearest[0].record.id, "b");
    }

    #[tokio::test]
    async fn persist_rewrites_a_missing_snapshot() {
        let temp = tempfile::tempdir().unwrap();
        let index = PersistentIndex::open(temp.path(), "docs").await.unwrap();
        index.add(vec![record("a", vec![1.0, 0.0])]).await.unwrap();
        std::fs::remove_file(index.snapshot_path()).unwrap();

        index.persist().await.unwrap();

        let reopened = PersistentIndex::open(temp.path(), "docs").await.unwrap();
        assert_eq!(reopened.len().await, 1);
        assert!(!index.snapshot_path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn rejected_add_leaves_collection_untouched() {
        let temp = tempfile::tempdir().unwrap();
        let index = PersistentIndex::open(temp.path(), "docs").await.unwrap();
        index.add(vec![record("a", vec![1.0, 0.0])]).await.unwrap();

        let err = index.add(vec![record("b", vec![1.0, 0.0]), record("c", vec![1.0])]).await;
        assert!(matches!(err, Err(RagError::EmbeddingError { .. })));
        assert_eq!(index.len().await, 1);

        let reopened = PersistentIndex::open(temp.path(), "docs").await.unwrap();
        assert_eq!(reopened.len().await, 1);
    }

    #[tokio::test]
    async fn failed_snapshot_write_rolls_back_add() {
        let temp = tempfile::tempdir().unwrap();
        let index = PersistentIndex::open(temp.path(), "docs").await.unwrap();
        index.add(vec![record("a", vec![1.0, 0.0])]).await.unwrap();
        // A directory in the temp file's place makes the write fail.
        std::fs::create_dir(temp.path().join("docs.json.tmp")).unwrap();

        let err = index.add(vec![record("b", vec![0.0, 1.0])]).await.unwrap_err();

        assert!(matches!(err, RagError::StorageError { .. }), "{err:?}");
        assert_eq!(index.len().await, 1);
        assert_eq!(index.dimensions().await, Some(2));
        let nearest = index.query(&[0.0, 1.0], 4).await.unwrap();
        assert_eq!(nearest.len(), 1);
        assert_eq!(nearest[0].record.id, "a");

        let reopened = PersistentIndex::open(temp.path(), "docs").await.unwrap();
        assert_eq!(reopened.len().await, 1);
    }

    #[tokio::test]
    async fn failed_first_add_forgets_its_dimensions() {
        let temp = tempfile::tempdir().unwrap();
        let index = PersistentIndex::open(temp.path(), "docs").await.unwrap();
        std::fs::create_dir(temp.path().join("docs.json.tmp")).unwrap();

        assert!(index.add(vec![record("a", vec![1.0, 0.0, 0.0])]).await.is_err());
        assert_eq!(index.dimensions().await, None);

        std::fs::remove_dir(temp.path().join("docs.json.tmp")).unwrap();
        index.add(vec![record("b", vec![1.0, 0.0])]).await.unwrap();
        assert_eq!(index.dimensions().await, Some(2));
    }

    #[tokio::test]
    async fn failed_clear_keeps_what_is_on_disk() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("db");
        let index = PersistentIndex::open(&dir, "docs").await.unwrap();
        index.add(vec![record("a", vec![1.0, 0.0])]).await.unwrap();
        // A plain file where the storage directory was cannot be removed as a directory.
        std::fs::remove_dir_all(&dir).unwrap();
        std::fs::write(&dir, "not a directory").unwrap();

        let err = index.clear().await.unwrap_err();

        assert!(matches!(err, RagError::StorageError { .. }), "{err:?}");
        assert_eq!(std::fs::read_to_string(&dir).unwrap(), "not a directory");
        // Nothing readable survived, so the in-memory view is empty too.
        assert_eq!(index.len().await, 0);
        assert_eq!(index.dimensions().await, None);
        assert!(index.query(&[1.0, 0.0], 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_finite_embedding_is_rejected_and_snapshot_stays_loadable() {
        let temp = tempfile::tempdir().unwrap();
        let index = PersistentIndex::open(temp.path(), "docs").await.unwrap();
        index.add(vec![record("a", vec![1.0, 0.0])]).await.unwrap();

        let err = index.add(vec![record("nan", vec![f32::NAN, 1.0])]).await.unwrap_err();

        assert!(matches!(err, RagError::EmbeddingError { .. }), "{err:?}");
        assert_eq!(index.len().await, 1);
        let reopened = PersistentIndex::open(temp.path(), "docs").await.unwrap();
        assert_eq!(reopened.len().await, 1);
    }

    #[tokio::test]
    async fn clear_recreates_empty_collection_at_same_path() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("db");
        let index = PersistentIndex::open(&dir, "docs").await.unwrap();
        index.add(vec![record("a", vec![1.0, 0.0])]).await.unwrap();
        std::fs::write(dir.join("stray.txt"), "left behind").unwrap();

        index.clear().await.unwrap();

        assert_eq!(index.len().await, 0);
        assert_eq!(index.dimensions().await, None);
        assert!(index.snapshot_path().is_file());
        assert!(!dir.join("stray.txt").exists());
        assert!(index.query(&[1.0, 0.0], 4).await.unwrap().is_empty());

        // A new dimensionality is accepted after a clear.
        index.add(vec![record("b", vec![1.0, 0.0, 0.0])]).await.unwrap();
        assert_eq!(index.dimensions().await, Some(3));
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_a_storage_error() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("docs.json"), b"{ not json").unwrap();

        let err = PersistentIndex::open(temp.path(), "docs").await.unwrap_err();
        assert!(matches!(err, RagError::StorageError { .. }));
    }

    #[tokio::test]
    async fn snapshot_for_another_collection_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let other = PersistentIndex::open(temp.path(), "other").await.unwrap();
        std::fs::copy(other.snapshot_path(), temp.path().join("docs.json")).unwrap();

        let err = PersistentIndex::open(temp.path(), "docs").await.unwrap_err();
        assert!(matches!(err, RagError::StorageError { .. }));
    }
}
