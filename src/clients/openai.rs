use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ClientError, read_json, send};
use crate::config::LlmConfig;

const PROVIDER: &str = "OpenAI";

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage<'a>],
    max_completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_completion_tokens: u32,
}

impl OpenAiClient {
    #[must_use]
    pub fn new(client: Client, config: &LlmConfig, api_key: String) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            max_completion_tokens: config.max_completion_tokens,
        }
    }

    /// Runs one chat completion and returns the first choice's content,
    /// `None` if the provider answered without any.
    pub async fn complete(&self, messages: &[ChatMessage<'_>]) -> Result<Option<String>, ClientError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages,
            max_completion_tokens: self.max_completion_tokens,
        };

        tracing::debug!(model = %self.model, "Requesting chat completion");

        let response = send(
            PROVIDER,
            self.client
                .post(url)
                .bearer_auth(&self.api_key)
                .json(&request),
        )
        .await?;
        let parsed: ChatResponse = read_json(PROVIDER, response).await?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|content| !content.trim().is_empty()))
    }
}
