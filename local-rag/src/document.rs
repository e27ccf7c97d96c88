//! Data types for documents, chunks, stored records, and retrieval results.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Metadata key holding the originating document name.
pub const META_SOURCE: &str = "source";
/// Metadata key holding the [`DocumentKind`] of the originating document.
pub const META_DOCUMENT_KIND: &str = "document_kind";
/// Metadata key holding the chunk's position within its document.
pub const META_CHUNK_INDEX: &str = "chunk_index";
/// Metadata key holding the chunk's character offset in the extracted text.
pub const META_START_OFFSET: &str = "start_offset";
/// Metadata key holding the RFC 3339 ingestion timestamp.
pub const META_INGESTED_AT: &str = "ingested_at";

/// The document formats the ingestion pipeline can extract text from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// UTF-8 plain text.
    Text,
    /// Portable Document Format.
    Pdf,
}

impl DocumentKind {
    /// Infer the kind from a file extension.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::UnsupportedDocumentType`] when the extension is
    /// missing or not one of `txt`, `text`, `pdf`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default();
        ext.parse()
    }

    /// The canonical lower-case name used in metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Pdf => "pdf",
        }
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "pdf" => Ok(Self::Pdf),
            _ => Err(RagError::UnsupportedDocumentType(s.to_string())),
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-supplied document awaiting ingestion.
///
/// Exists only for the duration of an ingestion; the raw bytes are never
/// persisted.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Name recorded as the `source` of every chunk (usually the file name).
    pub name: String,
    /// The raw document bytes.
    pub bytes: Vec<u8>,
    /// Declared type as received from the caller, parsed during ingestion.
    pub declared_type: String,
}

impl RawDocument {
    /// Create a document from its name, bytes and declared type.
    pub fn new(
        name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
        declared_type: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), bytes: bytes.into(), declared_type: declared_type.into() }
    }

    /// Convenience constructor for UTF-8 text content.
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, text.into().into_bytes(), DocumentKind::Text.as_str())
    }
}

/// A contiguous span of a chunked text, before any metadata is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSpan {
    /// The span's text.
    pub text: String,
    /// Character offset of the span's first character in the source text.
    pub start: usize,
}

/// A retrievable unit of a document, ready to be embedded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// The text content of the chunk.
    pub text: String,
    /// Source metadata (`source`, `chunk_index`, `start_offset`, ...).
    pub metadata: HashMap<String, String>,
}

/// A chunk persisted in the collection together with its embedding.
///
/// Records are appended by `add` and only ever removed all at once by
/// `clear`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorRecord {
    /// Stable identifier.
    pub id: String,
    /// The chunk text.
    pub text: String,
    /// The vector embedding for the chunk text.
    pub embedding: Vec<f32>,
    /// Metadata inherited from the [`Chunk`].
    pub metadata: HashMap<String, String>,
}

/// A stored record paired with its similarity to a query.
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    /// The matching record.
    pub record: VectorRecord,
    /// Cosine similarity (higher is more relevant).
    pub score: f32,
}

/// A chunk returned by retrieval, used both as prompt context and as a citation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedChunk {
    /// The chunk text.
    pub text: String,
    /// The chunk metadata.
    pub metadata: HashMap<String, String>,
    /// Cosine similarity to the query.
    pub score: f32,
}

impl RetrievedChunk {
    /// The `source` metadata entry, if present.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(META_SOURCE).map(String::as_str)
    }
}

impl From<ScoredRecord> for RetrievedChunk {
    fn from(scored: ScoredRecord) -> Self {
        Self { text: scored.record.text, metadata: scored.record.metadata, score: scored.score }
    }
}

/// Read-only statistics about the collection.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of records currently stored.
    pub record_count: usize,
    /// Embedding dimensionality, unknown until the first record is added.
    pub dimensions: Option<usize>,
}

/// Summary of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Name of the ingested document.
    pub document: String,
    /// Kind the document was extracted as.
    pub kind: DocumentKind,
    /// Characters of extracted text.
    pub extracted_chars: usize,
    /// Number of chunks added to the collection.
    pub chunk_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_declared_types_case_insensitively() {
        assert_eq!("txt".parse::<DocumentKind>().unwrap(), DocumentKind::Text);
        assert_eq!("TEXT".parse::<DocumentKind>().unwrap(), DocumentKind::Text);
        assert_eq!(" pdf ".parse::<DocumentKind>().unwrap(), DocumentKind::Pdf);
    }

    #[test]
    fn rejects_unknown_types() {
        let err = "docx".parse::<DocumentKind>().unwrap_err();
        assert!(matches!(err, RagError::UnsupportedDocumentType(t) if t == "docx"));
    }

    #[test]
    fn infers_kind_from_extension() {
        assert_eq!(DocumentKind::from_path(Path::new("notes.TXT")).unwrap(), DocumentKind::Text);
        assert_eq!(DocumentKind::from_path(Path::new("a/b/paper.pdf")).unwrap(), DocumentKind::Pdf);
        assert!(DocumentKind::from_path(Path::new("README")).is_err());
        assert!(DocumentKind::from_path(Path::new("slides.pptx")).is_err());
    }
}
