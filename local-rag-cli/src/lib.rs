//! Command-line front-end for `local-rag`.
//!
//! - `lrag ingest <FILE>...` - add text or PDF files to the collection
//! - `lrag ask <QUESTION>` - answer one question with numbered sources
//! - `lrag chat` - interactive session; history is kept here, not in the pipeline
//! - `lrag stats` - record count and dimensionality
//! - `lrag reset` - irreversibly empty the collection, after confirmation
//!
//! Every pipeline setting is a global flag with an `LRAG_*` environment
//! fallback, e.g. `--storage-path` / `LRAG_STORAGE_PATH`.

pub mod chat;
pub mod cli;
pub mod commands;
pub mod logging;

pub use cli::{Cli, Commands, Settings};
