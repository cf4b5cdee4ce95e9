pub mod search_index;

pub use search_index::{RetrievedPassage, SearchError, SearchIndexClient, VectorSearch};
