use std::sync::Arc;

use colored::Colorize;
use log::error;

use crate::database::search_index::SearchIndexClient;
use crate::diagnostics::{self, ConfigReport, SecretStatus};
use crate::llm::history::{ConversationHistory, Role};
use crate::llm::orchestrator::RagOrchestrator;
use crate::providers::traits::CompletionProvider;

const SAMPLE_QUESTIONS: [&str; 5] = [
    "What was the max hydrotest pressure and hold time?",
    "Any sections below allowable limit and corrective actions?",
    "Compare results for Line A vs Line B.",
    "Did we comply with ASME B31.8S stabilization/monitoring?",
    "What anomalies were observed and possible causes?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotMode {
    /// Grounded answers over the indexed hydrotest/compliance documents.
    Rag,
    /// Open-domain chat, not grounded in the indexed documents.
    General,
}

impl std::fmt::Display for BotMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rag => write!(f, "GasGridBot (RAG search)"),
            Self::General => write!(f, "general chat"),
        }
    }
}

/// Dispatches one line of user input: a handful of commands, everything else
/// is a question for the active mode. Owns the session history.
pub struct CommandHandler {
    orchestrator: RagOrchestrator,
    chat_provider: Arc<dyn CompletionProvider>,
    search_client: SearchIndexClient,
    history: ConversationHistory,
    mode: BotMode,
    top_k: usize,
}

impl CommandHandler {
    pub fn new(
        orchestrator: RagOrchestrator,
        chat_provider: Arc<dyn CompletionProvider>,
        search_client: SearchIndexClient,
        mode: BotMode,
        top_k: usize,
    ) -> Self {
        Self {
            orchestrator,
            chat_provider,
            search_client,
            history: ConversationHistory::new(),
            mode,
            top_k,
        }
    }

    /// Returns `false` when the session should end.
    pub async fn handle_command(&mut self, input: &str) -> bool {
        let input = input.trim();
        if input.is_empty() {
            return true;
        }

        match input.to_lowercase().as_str() {
            "exit" | "quit" => return false,
            "help" => self.show_help(),
            "debug" => self.show_debug_report(),
            "test" => self.test_connections().await,
            "history" => self.show_history(),
            "clear" => {
                self.history.clear();
                println!("{}", "Session history cleared.".yellow());
            }
            "mode rag" => self.switch_mode(BotMode::Rag),
            "mode chat" => self.switch_mode(BotMode::General),
            _ => self.ask(input).await,
        }

        true
    }

    fn switch_mode(&mut self, mode: BotMode) {
        self.mode = mode;
        println!("{} {}", "Mode:".bold(), self.mode_line());
        if mode == BotMode::General {
            println!(
                "{}",
                "⚠️  This mode does not use your indexed documents.".yellow()
            );
        }
    }

    fn mode_line(&self) -> String {
        match self.mode {
            BotMode::Rag => {
                "Domain-specific RAG over Hydrotest, Compliance, Corrosion & Methane docs."
                    .to_string()
            }
            BotMode::General => "Open-domain chat (not grounded in your documents).".to_string(),
        }
    }

    async fn ask(&mut self, query: &str) {
        let result = match self.mode {
            BotMode::Rag => self
                .orchestrator
                .answer(query, &mut self.history, self.top_k)
                .await
                .map(|outcome| (outcome.reply, outcome.sources)),
            BotMode::General => self
                .orchestrator
                .general_chat(query, &mut self.history)
                .await
                .map(|reply| (reply, Vec::new())),
        };

        match result {
            Ok((reply, sources)) => {
                println!("🤖 {}", reply.green());
                if !sources.is_empty() {
                    println!("{}", "Sources:".bold());
                    for source in sources {
                        println!("  - {}", source.dimmed());
                    }
                }
            }
            Err(err) => {
                error!("turn failed: {err}");
                println!(
                    "{}",
                    "Something went wrong. Check your secrets and index configuration.".red()
                );
                println!("{}", format!("{err}").dimmed());
            }
        }
    }

    fn show_help(&self) {
        println!("{}", "💡 GasGridBot".bold());
        println!(
            "AI assistant for midstream natural gas utilities (RAG over hydrotest PDFs)."
        );
        println!("{} {}", "Mode:".bold(), self.mode_line());
        println!();
        println!("{}", "Commands:".bold());
        println!("  help        show this message");
        println!("  mode rag    grounded answers from the indexed documents");
        println!("  mode chat   open-domain chat (not grounded)");
        println!("  debug       validate configured secrets (values masked)");
        println!("  test        probe the chat and search services");
        println!("  history     show the session transcript");
        println!("  clear       drop the session history");
        println!("  exit        quit");
        println!();
        println!("{}", "Try:".bold());
        for question in SAMPLE_QUESTIONS {
            println!("  - {question}");
        }
    }

    fn show_debug_report(&self) {
        println!("{}", "Secrets validation".bold());
        let report = ConfigReport::from_env();
        for (key, status) in &report.entries {
            match status {
                SecretStatus::Present(display) => {
                    println!("  {}: {}", key, display.green());
                }
                SecretStatus::Missing => {
                    println!("  {}: {}", key, "missing".red());
                }
            }
        }
        if report.all_present() {
            println!("{}", "🎉 Secrets loaded successfully!".green());
        } else {
            println!(
                "{}",
                format!("❌ Missing secrets: {}", report.missing_keys().join(", ")).red()
            );
        }
    }

    async fn test_connections(&self) {
        match diagnostics::probe_chat(self.chat_provider.as_ref()).await {
            Ok(reply) => println!("✅ {} {}", "Chat test:".bold(), reply.green()),
            Err(err) => println!("❌ {} {}", "Chat test failed:".bold(), format!("{err:#}").red()),
        }

        match diagnostics::probe_search(&self.search_client).await {
            Ok(()) => println!("✅ {}", "Search test: index reachable".green()),
            Err(err) => println!(
                "❌ {} {}",
                "Search test failed:".bold(),
                format!("{err}").red()
            ),
        }
    }

    fn show_history(&self) {
        if self.history.is_empty() {
            println!("{}", "No turns yet this session.".dimmed());
            return;
        }
        for turn in self.history.turns() {
            match turn.role {
                Role::User => println!("👤 {}", turn.content),
                Role::Assistant => println!("🤖 {}", turn.content.green()),
                Role::System => {}
            }
        }
    }
}
