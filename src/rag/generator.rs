//! Text generation backends.

use super::{ChatMessage, Role};
use crate::error::{CuebaseError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// One chat completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    /// System instruction, sent before `messages`.
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the model for a single JSON object.
    pub json: bool,
}

/// Trait for text generation.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Run one completion and return the generated text.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Short provider name for logs and diagnostics.
    fn name(&self) -> &'static str;
}

/// Chat completions through the OpenAI API.
pub struct OpenAIGenerator {
    client: Client<OpenAIConfig>,
}

impl OpenAIGenerator {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(Duration::from_secs(timeout_secs))?,
        })
    }

    fn to_openai_messages(request: &GenerationRequest) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(request.messages.len() + 1);

        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system.clone())
                .build()
                .map_err(|e| CuebaseError::Provider(e.to_string()))?
                .into(),
        );

        for message in &request.messages {
            let converted: ChatCompletionRequestMessage = match message.role {
                Role::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(message.content.clone())
                    .build()
                    .map_err(|e| CuebaseError::Provider(e.to_string()))?
                    .into(),
                Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(message.content.clone())
                    .build()
                    .map_err(|e| CuebaseError::Provider(e.to_string()))?
                    .into(),
            };
            messages.push(converted);
        }

        Ok(messages)
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()))]
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&request.model)
            .messages(Self::to_openai_messages(request)?)
            .temperature(request.temperature)
            .max_completion_tokens(request.max_tokens);
        if request.json {
            args.response_format(ResponseFormat::JsonObject);
        }
        let completion = args
            .build()
            .map_err(|e| CuebaseError::Provider(e.to_string()))?;

        let response = self.client.chat().create(completion).await.map_err(|e| {
            CuebaseError::Provider(format!("Failed to generate response: {}", e))
        })?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| CuebaseError::Provider("Empty response from LLM".to_string()))?
            .clone();

        debug!("Generated {} characters", text.len());
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
