//! Vector index trait for storing and searching embedded records.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{ScoredRecord, VectorRecord};
use crate::error::{RagError, Result};

/// The storage capability behind a [`VectorStore`](crate::VectorStore).
///
/// An index owns exactly one collection of [`VectorRecord`]s. Records are
/// appended with [`add`](VectorIndex::add) and only ever removed all at once
/// with [`clear`](VectorIndex::clear). Both are all-or-nothing: a failed call
/// leaves the visible collection exactly as it was.
///
/// # Example
///
/// ```rust,ignore
/// use local_rag::{InMemoryIndex, VectorIndex};
///
/// let index = InMemoryIndex::new("docs");
/// index.add(records).await?;
/// let nearest = index.query(&query_embedding, 4).await?;
/// ```
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Append records and durably persist the collection before returning.
    async fn add(&self, records: Vec<VectorRecord>) -> Result<()>;

    /// Return the `top_k` records most similar to `embedding`, nearest first.
    ///
    /// Returns fewer than `top_k` results when the collection is smaller, and
    /// an empty `Vec` when it is empty.
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredRecord>>;

    /// Flush the current collection to durable storage.
    async fn persist(&self) -> Result<()>;

    /// Destroy every record and recreate an empty collection in place.
    async fn clear(&self) -> Result<()>;

    /// Number of records currently stored.
    async fn len(&self) -> usize;

    /// Whether the collection holds no records.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Embedding dimensionality, unknown until the first record is added.
    async fn dimensions(&self) -> Option<usize>;

    /// Short backend name used in errors and logs.
    fn backend(&self) -> &str;
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// A named set of records sharing one embedding dimensionality.
///
/// This is also the on-disk snapshot format of the persistent index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct Collection {
    pub(crate) name: String,
    pub(crate) dimensions: Option<usize>,
    pub(crate) records: Vec<VectorRecord>,
}

impl Collection {
    pub(crate) fn empty(name: &str) -> Self {
        Self { name: name.to_string(), dimensions: None, records: Vec::new() }
    }

    /// Validate that every incoming record has a finite embedding matching the
    /// collection's dimensionality, returning the dimensionality the
    /// collection will have.
    pub(crate) fn check_records(&self, records: &[VectorRecord]) -> Result<Option<usize>> {
        let mut dimensions = self.dimensions;
        for record in records {
            let len = record.embedding.len();
            if len == 0 {
                let message = format!("record '{}' has an empty embedding", record.id);
                return Err(dimension_error(message));
            }
            // NaN and infinities cannot round-trip through the JSON snapshot.
            if let Some(position) = record.embedding.iter().position(|x| !x.is_finite()) {
                return Err(dimension_error(format!(
                    "record '{}' has a non-finite value at position {position}",
                    record.id
                )));
            }
            match dimensions {
                None => dimensions = Some(len),
                Some(expected) if expected != len => {
                    return Err(dimension_error(format!(
                        "record '{}' has {len} dimensions, collection '{}' expects {expected}",
                        record.id, self.name
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(dimensions)
    }

    /// Rank records by cosine similarity, nearest first. Ties keep insertion order.
    pub(crate) fn rank(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredRecord>> {
        if self.records.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        if let Some(expected) = self.dimensions {
            if embedding.len() != expected {
                return Err(dimension_error(format!(
                    "query has {} dimensions, collection '{}' expects {expected}",
                    embedding.len(),
                    self.name
                )));
            }
        }

        let mut scored: Vec<(usize, f32)> = self
            .records
            .iter()
            .enumerate()
            .map(|(i, record)| (i, cosine_similarity(&record.embedding, embedding)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(i, score)| ScoredRecord { record: self.records[i].clone(), score })
            .collect())
    }
}

fn dimension_error(message: String) -> RagError {
    RagError::EmbeddingError { provider: "dimension check".to_string(), message }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn record(id: &str, embedding: Vec<f32>) -> VectorRecord {
        VectorRecord { id: id.into(), text: id.into(), embedding, metadata: HashMap::new() }
    }

    #[test]
    fn cosine_handles_zero_vectors() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-6);
    }

    #[test]
    fn rank_orders_nearest_first_and_truncates() {
        let mut collection = Collection::empty("c");
        collection.dimensions = Some(2);
        collection.records = vec![
            record("far", vec![0.0, 1.0]),
            record("near", vec![1.0, 0.1]),
            record("mid", vec![1.0, 1.0]),
        ];
        let ranked = collection.rank(&[1.0, 0.0], 2).unwrap();
        let ids: Vec<&str> = ranked.iter().map(|r| r.record.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid"]);
    }

    #[test]
    fn rank_keeps_insertion_order_for_ties() {
        let mut collection = Collection::empty("c");
        collection.dimensions = Some(2);
        collection.records = vec![
            record("first", vec![1.0, 0.0]),
            record("other", vec![0.0, 1.0]),
            record("second", vec![2.0, 0.0]),
            record("third", vec![3.0, 0.0]),
        ];
        let ranked = collection.rank(&[1.0, 0.0], 3).unwrap();
        let ids: Vec<&str> = ranked.iter().map(|r| r.record.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
        assert!(collection.rank(&[1.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn rank_rejects_mismatched_query_dimensions() {
        let mut collection = Collection::empty("c");
        collection.dimensions = Some(3);
        collection.records = vec![record("a", vec![1.0, 0.0, 0.0])];
        assert!(matches!(collection.rank(&[1.0, 0.0], 1), Err(RagError::EmbeddingError { .. })));
    }

    #[test]
    fn check_records_fixes_dimensions_on_first_add() {
        let collection = Collection::empty("c");
        let dims = collection
            .check_records(&[record("a", vec![1.0, 2.0]), record("b", vec![3.0, 4.0])])
            .unwrap();
        assert_eq!(dims, Some(2));
        let mixed = [record("a", vec![1.0]), record("b", vec![1.0, 2.0])];
        assert!(collection.check_records(&mixed).is_err());
        assert!(collection.check_records(&[record("a", vec![])]).is_err());
    }

    #[test]
    fn check_records_rejects_non_finite_values() {
        let collection = Collection::empty("c");
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let records = [record("ok", vec![1.0, 0.0]), record("bad", vec![bad, 1.0])];
            match collection.check_records(&records) {
                Err(RagError::EmbeddingError { message, .. }) => assert!(message.contains("'bad'")),
                other => panic!("expected an embedding error, got {other:?}"),
            }
        }
    }
}
