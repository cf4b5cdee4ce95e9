use anyhow::{anyhow, Result};
use async_openai::{
    config::AzureConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, CreateEmbeddingRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use log::debug;

use crate::config::AppConfig;
use crate::llm::history::{Role, Turn};
use crate::providers::traits::{CompletionProvider, EmbeddingProvider};

/// Azure OpenAI client covering both deployments. An Azure config carries
/// exactly one deployment id, so embeddings and chat each get their own
/// client against the same endpoint.
#[derive(Clone)]
pub struct AzureOpenAiProvider {
    embedding_client: Client<AzureConfig>,
    chat_client: Client<AzureConfig>,
    embedding_deployment: String,
    chat_deployment: String,
}

impl AzureOpenAiProvider {
    pub fn new(config: &AppConfig) -> Self {
        let embedding_config = AzureConfig::new()
            .with_api_base(&config.openai_endpoint)
            .with_api_key(&config.openai_key)
            .with_api_version(&config.openai_api_version)
            .with_deployment_id(&config.embedding_deployment);

        let chat_config = AzureConfig::new()
            .with_api_base(&config.openai_endpoint)
            .with_api_key(&config.openai_key)
            .with_api_version(&config.openai_api_version)
            .with_deployment_id(&config.chat_deployment);

        Self {
            embedding_client: Client::with_config(embedding_config),
            chat_client: Client::with_config(chat_config),
            embedding_deployment: config.embedding_deployment.clone(),
            chat_deployment: config.chat_deployment.clone(),
        }
    }
}

fn into_request_message(turn: &Turn) -> Result<ChatCompletionRequestMessage> {
    let message = match turn.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(turn.content.clone())
            .build()?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(turn.content.clone())
            .build()?
            .into(),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(turn.content.clone())
            .build()?
            .into(),
    };

    Ok(message)
}

#[async_trait]
impl EmbeddingProvider for AzureOpenAiProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.embedding_deployment)
            .input(text)
            .build()?;

        let response = self.embedding_client.embeddings().create(request).await?;

        response
            .data
            .into_iter()
            .next()
            .map(|e| e.embedding)
            .ok_or_else(|| anyhow!("embedding response contained no vectors"))
    }
}

#[async_trait]
impl CompletionProvider for AzureOpenAiProvider {
    async fn complete(
        &self,
        messages: &[Turn],
        temperature: f32,
        max_tokens: u16,
    ) -> Result<String> {
        let messages = messages
            .iter()
            .map(into_request_message)
            .collect::<Result<Vec<_>>>()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.chat_deployment)
            .messages(messages)
            .temperature(temperature)
            .max_tokens(max_tokens)
            .build()?;

        debug!(
            "chat completion against deployment {} (temperature {temperature})",
            self.chat_deployment
        );

        let response = self.chat_client.chat().create(request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("completion response contained no content"))
    }
}
