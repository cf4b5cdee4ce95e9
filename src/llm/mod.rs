pub mod history;
pub mod orchestrator;

pub use history::{ConversationHistory, Role, Turn};
pub use orchestrator::{RagOrchestrator, TurnError, TurnOutcome, DEFAULT_TOP_K, NO_CONTEXT_REPLY};
