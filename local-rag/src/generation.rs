//! Generation provider trait for producing answers from prompts.

use async_trait::async_trait;

use crate::error::Result;

/// A text generation model treated as a black box: prompt in, text out.
///
/// No structured output is assumed beyond plain text.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Human-readable provider name used in errors and logs.
    fn name(&self) -> &str;
}
