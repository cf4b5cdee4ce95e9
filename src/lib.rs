pub mod commands;
pub mod config;
pub mod database;
pub mod diagnostics;
pub mod llm;
pub mod providers;

// Re-export commonly used items
pub use config::{AppConfig, ConfigError};
pub use llm::history::{ConversationHistory, Role, Turn};
pub use llm::orchestrator::{RagOrchestrator, TurnError, TurnOutcome};
