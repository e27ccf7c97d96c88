//! Error types for the `local-rag` crate.

use thiserror::Error;

/// Errors that can occur while ingesting, storing, retrieving or answering.
#[derive(Debug, Error)]
pub enum RagError {
    /// A configuration validation error (bad chunk sizing, empty model names, ...).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The declared document type is neither text nor PDF.
    #[error("Unsupported document type: '{0}'")]
    UnsupportedDocumentType(String),

    /// Plain text could not be extracted from a document.
    #[error("Extraction error ({kind}): {message}")]
    ExtractionError {
        /// The document kind being extracted.
        kind: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// Reading or writing the persisted collection failed.
    #[error("Storage error ({backend}): {message}")]
    StorageError {
        /// The index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The generation model failed to produce an answer.
    #[error("Generation error ({provider}): {message}")]
    GenerationError {
        /// The generation provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },
}

impl RagError {
    pub(crate) fn storage(backend: &str, message: impl Into<String>) -> Self {
        Self::StorageError { backend: backend.to_string(), message: message.into() }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
