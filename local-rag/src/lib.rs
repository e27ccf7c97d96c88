//! # local-rag
//!
//! Retrieval-augmented question answering over documents you ingest locally.
//!
//! ## Overview
//!
//! Documents (plain text or PDF) are split into overlapping chunks, embedded,
//! and appended to a persisted vector collection. Questions are embedded the
//! same way, the nearest chunks are retrieved, and a generation model answers
//! from those chunks only.
//!
//! - [`RagPipeline`] wires the pieces together behind a builder
//! - [`VectorStore`] embeds and stores chunks on top of a [`VectorIndex`]
//! - [`RecursiveChunker`] and [`FixedSizeChunker`] split text
//! - [`AnswerGenerator`] builds the grounding prompt and never lets a
//!   provider error escape
//!
//! Embedding and generation are behind the [`EmbeddingProvider`] and
//! [`GenerationProvider`] traits. The `ollama` feature (on by default)
//! provides implementations for a local Ollama server.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use local_rag::{RagConfig, RagPipeline, RawDocument};
//! use local_rag::ollama::{OllamaEmbeddingProvider, OllamaGenerationProvider};
//!
//! let config = RagConfig::default();
//! let pipeline = RagPipeline::builder()
//!     .embedding_provider(Arc::new(OllamaEmbeddingProvider::new(&config.embedding_model)))
//!     .generation_provider(Arc::new(OllamaGenerationProvider::new(&config.generation_model)))
//!     .config(config)
//!     .build()
//!     .await?;
//!
//! pipeline.ingest_document(RawDocument::text("sky.txt", "The sky is blue.")).await?;
//! let answer = pipeline.ask("What color is the sky?").await;
//! println!("{}", answer.text);
//! ```

pub mod answer;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod index;
pub mod inmemory;
pub mod ingest;
#[cfg(feature = "ollama")]
pub mod ollama;
pub mod persistent;
pub mod pipeline;
pub mod retrieval;
pub mod vectorstore;

pub use answer::{Answer, AnswerGenerator, GENERATION_FAILED_ANSWER, NO_CONTEXT_ANSWER};
pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker, chunker_for, split_windows};
pub use config::{ChunkingStrategy, RagConfig, RagConfigBuilder};
pub use document::{
    Chunk, ChunkSpan, DocumentKind, IngestReport, RawDocument, RetrievedChunk, ScoredRecord,
    StoreStats, VectorRecord,
};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use generation::GenerationProvider;
pub use index::{VectorIndex, cosine_similarity};
pub use inmemory::InMemoryIndex;
pub use ingest::{IngestionPipeline, PreparedDocument};
pub use persistent::PersistentIndex;
pub use pipeline::{RagPipeline, RagPipelineBuilder};
pub use retrieval::{DEFAULT_TOP_K, Retrieval, RetrievalEngine};
pub use vectorstore::VectorStore;
