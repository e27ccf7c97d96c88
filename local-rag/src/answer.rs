//! Grounded answer generation.
//!
//! [`AnswerGenerator`] turns retrieved chunks and a question into a prompt
//! that restricts the model to the supplied context. It never lets a
//! provider error escape: failures become fixed fallback answers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::document::RetrievedChunk;
use crate::generation::GenerationProvider;

/// Returned without calling the model when retrieval found nothing.
pub const NO_CONTEXT_ANSWER: &str = "I don't have any relevant information to answer your \
     question. Try uploading some documents or asking a different question.";

/// Returned when the generation provider fails.
pub const GENERATION_FAILED_ANSWER: &str =
    "I encountered an error while trying to generate an answer.";

/// What the model is told to say when the context does not cover the question.
pub const INSUFFICIENT_CONTEXT_REPLY: &str = "I don't have enough information to answer that.";

/// An answer together with the chunks it was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    /// The answer text shown to the user.
    pub text: String,
    /// Chunks passed to the model as context, in ranked order.
    pub sources: Vec<RetrievedChunk>,
    /// A non-fatal failure that degraded this answer, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Answer {
    /// The fixed answer for an empty context.
    pub fn no_context() -> Self {
        Self { text: NO_CONTEXT_ANSWER.to_string(), sources: Vec::new(), error: None }
    }
}

/// Build the grounding prompt for `query` over `context`.
///
/// Chunk texts are joined in ranked order, separated by a blank line.
pub fn build_prompt(query: &str, context: &[RetrievedChunk]) -> String {
    let context_block = context.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n\n");
    format!(
        "You are a helpful AI assistant. Answer the question using only the context below.\n\
         If the context does not contain the answer, say \"{INSUFFICIENT_CONTEXT_REPLY}\" \
         and do not make anything up.\n\
         \n\
         Context:\n\
         {context_block}\n\
         \n\
         Question: {query}\n\
         \n\
         Answer:"
    )
}

/// Assembles grounding prompts and calls the generation model.
#[derive(Clone)]
pub struct AnswerGenerator {
    provider: Arc<dyn GenerationProvider>,
}

impl AnswerGenerator {
    /// Create a generator backed by `provider`.
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self { provider }
    }

    /// Answer `query` from `context`.
    ///
    /// An empty context yields [`NO_CONTEXT_ANSWER`] without calling the
    /// model. A provider failure yields [`GENERATION_FAILED_ANSWER`] with the
    /// failure recorded in [`Answer::error`].
    pub async fn generate(&self, query: &str, context: Vec<RetrievedChunk>) -> Answer {
        if context.is_empty() {
            info!("no context retrieved, returning fallback answer");
            return Answer::no_context();
        }

        let prompt = build_prompt(query, &context);
        match self.provider.generate(&prompt).await {
            Ok(text) => {
                info!(
                    provider = self.provider.name(),
                    source_count = context.len(),
                    answer_len = text.len(),
                    "generated answer"
                );
                Answer { text: text.trim().to_string(), sources: context, error: None }
            }
            Err(e) => {
                error!(provider = self.provider.name(), error = %e, "generation failed");
                Answer {
                    text: GENERATION_FAILED_ANSWER.to_string(),
                    sources: context,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

impl std::fmt::Debug for AnswerGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerGenerator").field("provider", &self.provider.name()).finish()
    }
}
