use async_trait::async_trait;
use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage;

use cleovent_core::{FlowError, ModelSettings};

pub const SERVICE: &str = "llm";

/// One prompt to send to the language model.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub flow: &'a str,
    pub settings: &'a ModelSettings,
    pub system: &'a str,
    pub prompt: &'a str,
}

/// Anything that can turn a prompt into raw reply text. The caller bounds the
/// call with the model timeout.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, FlowError>;
}

fn map_backend(provider: &str) -> Result<LLMBackend, FlowError> {
    match provider {
        "openai" => Ok(LLMBackend::OpenAI),
        "anthropic" => Ok(LLMBackend::Anthropic),
        "google" => Ok(LLMBackend::Google),
        "ollama" => Ok(LLMBackend::Ollama),
        "groq" => Ok(LLMBackend::Groq),
        "mistral" => Ok(LLMBackend::Mistral),
        "deepseek" => Ok(LLMBackend::DeepSeek),
        other => Err(FlowError::configuration(format!("unknown provider: {other}"))),
    }
}

/// Backend built on the `llm` crate. A client is built per call from the
/// request's settings, so nothing outlives one invocation.
#[derive(Debug, Default, Clone, Copy)]
pub struct LlmEngine;

#[async_trait]
impl CompletionBackend for LlmEngine {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, FlowError> {
        let settings = request.settings;
        let backend = map_backend(&settings.provider)?;

        let mut builder = LLMBuilder::new()
            .backend(backend)
            .model(&settings.model)
            .system(request.system);

        if !settings.api_key.is_empty() {
            builder = builder.api_key(&settings.api_key);
        }

        let llm = builder
            .build()
            .map_err(|e| FlowError::configuration(format!("build LLM: {e}")))?;

        let messages = vec![ChatMessage::user().content(request.prompt).build()];

        let response = llm
            .chat(&messages)
            .await
            .map_err(|e| FlowError::transport(SERVICE, format!("chat: {e}")))?;

        match response.text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            Some(_) => Err(FlowError::upstream(SERVICE, "LLM returned empty text")),
            None => Err(FlowError::upstream(SERVICE, "LLM returned no text")),
        }
    }
}
