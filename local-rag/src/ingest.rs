//! Document ingestion: extract text, chunk it, hand the chunks to the store.
//!
//! Extraction is all-or-nothing. A document that cannot be decoded never
//! reaches the store, and any scratch file written for extraction is removed
//! on every exit path.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info};

use crate::chunking::{Chunker, chunker_for};
use crate::config::RagConfig;
use crate::document::{
    Chunk, DocumentKind, IngestReport, META_CHUNK_INDEX, META_DOCUMENT_KIND, META_INGESTED_AT,
    META_SOURCE, META_START_OFFSET, RawDocument,
};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// A document whose text has been extracted and chunked but not yet stored.
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    /// The parsed document kind.
    pub kind: DocumentKind,
    /// Characters of extracted text.
    pub extracted_chars: usize,
    /// Chunks in document order, with metadata attached.
    pub chunks: Vec<Chunk>,
}

/// Turns raw documents into chunks and writes them to a [`VectorStore`].
pub struct IngestionPipeline {
    chunker: Arc<dyn Chunker>,
    scratch_dir: PathBuf,
}

impl IngestionPipeline {
    /// Create a pipeline that splits text with `chunker`.
    ///
    /// Scratch files for PDF extraction go to the system temp directory.
    pub fn new(chunker: Arc<dyn Chunker>) -> Self {
        Self { chunker, scratch_dir: std::env::temp_dir() }
    }

    /// Create a pipeline using the chunker selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the chunk sizing is invalid.
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Ok(Self::new(chunker_for(config)?))
    }

    /// Use `dir` for extraction scratch files instead of the system temp directory.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    /// Extract and chunk a document without touching any store.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::UnsupportedDocumentType`] for unknown declared
    /// types and [`RagError::ExtractionError`] if the content cannot be decoded.
    pub async fn prepare(&self, document: &RawDocument) -> Result<PreparedDocument> {
        let kind: DocumentKind = document.declared_type.parse()?;
        let text = match kind {
            DocumentKind::Text => decode_text(&document.bytes)?,
            DocumentKind::Pdf => {
                extract_pdf(document.bytes.clone(), self.scratch_dir.clone()).await?
            }
        };

        let ingested_at = Utc::now().to_rfc3339();
        let chunks = self
            .chunker
            .chunk(&text)
            .into_iter()
            .filter(|span| !span.text.trim().is_empty())
            .enumerate()
            .map(|(i, span)| {
                let metadata = HashMap::from([
                    (META_SOURCE.to_string(), document.name.clone()),
                    (META_DOCUMENT_KIND.to_string(), kind.to_string()),
                    (META_CHUNK_INDEX.to_string(), i.to_string()),
                    (META_START_OFFSET.to_string(), span.start.to_string()),
                    (META_INGESTED_AT.to_string(), ingested_at.clone()),
                ]);
                Chunk { text: span.text, metadata }
            })
            .collect::<Vec<_>>();

        debug!(document = %document.name, %kind, chunk_count = chunks.len(), "prepared document");
        Ok(PreparedDocument { kind, extracted_chars: text.chars().count(), chunks })
    }

    /// Extract, chunk and store a document.
    ///
    /// # Errors
    ///
    /// Any extraction, embedding or storage failure aborts the whole
    /// ingestion; nothing from the document is stored in that case.
    pub async fn ingest(
        &self,
        document: &RawDocument,
        store: &VectorStore,
    ) -> Result<IngestReport> {
        let prepared = self.prepare(document).await.map_err(|e| {
            error!(document = %document.name, error = %e, "failed to prepare document");
            e
        })?;

        let chunk_count = store.add(prepared.chunks).await.map_err(|e| {
            error!(document = %document.name, error = %e, "failed to store document chunks");
            e
        })?;

        info!(document = %document.name, kind = %prepared.kind, chunk_count, "ingested document");
        Ok(IngestReport {
            document: document.name.clone(),
            kind: prepared.kind,
            extracted_chars: prepared.extracted_chars,
            chunk_count,
        })
    }
}

impl std::fmt::Debug for IngestionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionPipeline").field("scratch_dir", &self.scratch_dir).finish()
    }
}

/// Decode UTF-8 text, dropping a leading byte order mark.
fn decode_text(bytes: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(bytes).map_err(|e| RagError::ExtractionError {
        kind: DocumentKind::Text.to_string(),
        message: format!("document is not valid UTF-8: {e}"),
    })?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
}

/// Extract the text of every page of a PDF, one page per line block.
///
/// The extractor works on files, so the bytes go to a named temp file in
/// `scratch_dir` that is deleted when it drops, including during a panic.
async fn extract_pdf(bytes: Vec<u8>, scratch_dir: PathBuf) -> Result<String> {
    let extraction =
        tokio::task::spawn_blocking(move || extract_pages_blocking(&bytes, &scratch_dir)).await;

    let pages = match extraction {
        Ok(Ok(pages)) => pages,
        Ok(Err(message)) => {
            return Err(RagError::ExtractionError { kind: DocumentKind::Pdf.to_string(), message });
        }
        Err(e) => {
            return Err(RagError::ExtractionError {
                kind: DocumentKind::Pdf.to_string(),
                message: format!("extractor aborted: {e}"),
            });
        }
    };

    debug!(page_count = pages.len(), "extracted pdf pages");
    Ok(join_pages(pages))
}

fn extract_pages_blocking(
    bytes: &[u8],
    scratch_dir: &Path,
) -> std::result::Result<Vec<String>, String> {
    let mut file = tempfile::Builder::new()
        .prefix("local-rag-")
        .suffix(".pdf")
        .tempfile_in(scratch_dir)
        .map_err(|e| format!("failed to create scratch file: {e}"))?;
    file.write_all(bytes)
        .and_then(|()| file.flush())
        .map_err(|e| format!("failed to write scratch file: {e}"))?;
    pdf_extract::extract_text_by_pages(file.path()).map_err(|e| e.to_string())
}

/// Trim each page and join non-empty pages with a newline.
fn join_pages(pages: Vec<String>) -> String {
    pages
        .iter()
        .map(|page| page.trim())
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
