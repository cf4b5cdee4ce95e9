pub mod azure;
pub mod traits;

pub use azure::AzureOpenAiProvider;
pub use traits::{CompletionProvider, EmbeddingProvider};
