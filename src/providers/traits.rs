use anyhow::Result;
use async_trait::async_trait;

use crate::llm::history::Turn;

/// Turns a text query into a fixed-length vector matching the search
/// index's vector field.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Generates text from an ordered list of role-tagged messages.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        messages: &[Turn],
        temperature: f32,
        max_tokens: u16,
    ) -> Result<String>;
}
