use std::sync::Arc;

use log::{info, warn};
use thiserror::Error;

use crate::database::search_index::{RetrievedPassage, VectorSearch};
use crate::llm::history::{ConversationHistory, Turn};
use crate::providers::traits::{CompletionProvider, EmbeddingProvider};

pub const DEFAULT_TOP_K: usize = 3;

/// Prior turns replayed into the grounded prompt. The full transcript stays
/// available for display; only this tail bounds the prompt.
const REPLAY_WINDOW: usize = 6;

const GROUNDED_TEMPERATURE: f32 = 0.0;
const GENERAL_TEMPERATURE: f32 = 0.3;
const MAX_COMPLETION_TOKENS: u16 = 600;

pub const NO_CONTEXT_REPLY: &str =
    "I don't have relevant context in the indexed documents to answer this.";

const GROUNDED_SYSTEM_PROMPT: &str =
    "You are GasGridBot, an assistant that answers ONLY from the provided context. \
     If the answer is not in the context, say you don't know.";

const GENERAL_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

#[derive(Error, Debug)]
pub enum TurnError {
    #[error("retrieval failed: {0}")]
    Retrieval(#[source] anyhow::Error),
    #[error("generation failed: {0}")]
    Generation(#[source] anyhow::Error),
}

/// Result of one successful question-answering turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub reply: String,
    /// Source label of every passage that contributed context, in ranked
    /// order, duplicates preserved. Empty when the guardrail fired.
    pub sources: Vec<String>,
}

/// Composes embedding, vector search and chat completion into a single
/// question-answering turn. Clients are injected so sessions and tests can
/// carry their own.
pub struct RagOrchestrator {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorSearch>,
    chat: Arc<dyn CompletionProvider>,
}

impl RagOrchestrator {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorSearch>,
        chat: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            embedder,
            index,
            chat,
        }
    }

    /// One grounded turn: embed the query, fetch the top-k passages, build
    /// the grounding prompt and generate. History records the turn only when
    /// it completes; a failed remote call leaves it untouched.
    pub async fn answer(
        &self,
        query: &str,
        history: &mut ConversationHistory,
        top_k: usize,
    ) -> Result<TurnOutcome, TurnError> {
        let vector = self
            .embedder
            .embed(query)
            .await
            .map_err(TurnError::Retrieval)?;

        let passages = self
            .index
            .search(&vector, top_k)
            .await
            .map_err(TurnError::Retrieval)?;

        let (context_text, sources) = assemble_context(&passages);

        // Guardrail: with nothing to ground on, answering would invite
        // hallucination. Skip generation entirely.
        if context_text.trim().is_empty() {
            warn!("no usable context retrieved for query; returning fallback reply");
            history.append(Turn::user(query));
            history.append(Turn::assistant(NO_CONTEXT_REPLY));
            return Ok(TurnOutcome {
                reply: NO_CONTEXT_REPLY.to_string(),
                sources: Vec::new(),
            });
        }

        info!("answering with {} grounding passages", sources.len());

        let messages = build_grounded_prompt(query, &context_text, history);
        let reply = self
            .chat
            .complete(&messages, GROUNDED_TEMPERATURE, MAX_COMPLETION_TOKENS)
            .await
            .map_err(TurnError::Generation)?;

        history.append(Turn::user(query));
        history.append(Turn::assistant(reply.clone()));

        Ok(TurnOutcome { reply, sources })
    }

    /// Pass-through mode: no retrieval, no grounding, slightly warmer
    /// temperature.
    pub async fn general_chat(
        &self,
        query: &str,
        history: &mut ConversationHistory,
    ) -> Result<String, TurnError> {
        let messages = vec![Turn::system(GENERAL_SYSTEM_PROMPT), Turn::user(query)];

        let reply = self
            .chat
            .complete(&messages, GENERAL_TEMPERATURE, MAX_COMPLETION_TOKENS)
            .await
            .map_err(TurnError::Generation)?;

        history.append(Turn::user(query));
        history.append(Turn::assistant(reply.clone()));

        Ok(reply)
    }
}

/// Joins non-empty passage contents with a blank line and collects their
/// sources in the same order. Sources are not deduplicated.
fn assemble_context(passages: &[RetrievedPassage]) -> (String, Vec<String>) {
    let mut contents = Vec::new();
    let mut sources = Vec::new();

    for passage in passages {
        if passage.content.is_empty() {
            continue;
        }
        contents.push(passage.content.as_str());
        sources.push(passage.source.clone());
    }

    (contents.join("\n\n"), sources)
}

fn build_grounded_prompt(
    query: &str,
    context_text: &str,
    history: &ConversationHistory,
) -> Vec<Turn> {
    let mut messages = Vec::with_capacity(REPLAY_WINDOW + 2);
    messages.push(Turn::system(GROUNDED_SYSTEM_PROMPT));
    messages.extend(history.last_n(REPLAY_WINDOW).iter().cloned());
    messages.push(Turn::user(grounded_question(context_text, query)));
    messages
}

fn grounded_question(context_text: &str, query: &str) -> String {
    format!("Context:\n{context_text}\n\nQuestion: {query}")
}
