use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "openai/gpt-oss-120b";

/// Client for any OpenAI-compatible chat-completions endpoint
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    pub model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Structured-output constraint sent with the request
#[derive(Debug, Serialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    JsonSchema { json_schema: JsonSchemaSpec },
}

#[derive(Debug, Serialize, Clone)]
pub struct JsonSchemaSpec {
    pub name: String,
    pub schema: Value,
    pub strict: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Anything that can answer a prompt with JSON matching a schema
#[async_trait]
pub trait JsonCompletion: Send + Sync {
    async fn complete_json(&self, prompt: &str, schema_name: &str, schema: &Value)
    -> Result<String>;
}

impl LlmClient {
    /// Models known to support structured outputs on Groq
    pub const MODELS: &'static [(&'static str, &'static str)] = &[
        ("openai/gpt-oss-120b", "GPT-OSS 120B - Most capable"),
        ("openai/gpt-oss-20b", "GPT-OSS 20B - Faster"),
        ("moonshotai/kimi-k2-instruct", "Kimi K2 - Long context"),
        ("meta-llama/llama-4-scout-17b-16e-instruct", "Llama 4 Scout - Lightweight"),
    ];

    pub fn new(api_key: String, api_url: Option<String>, model: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    fn request(&self, messages: &[Message], response_format: Option<ResponseFormat>) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            temperature: Some(0.7),
            max_tokens: Some(8192),
            response_format,
            stream: false,
        }
    }

    /// Send a chat request and return the first choice's content
    pub async fn chat(
        &self,
        messages: &[Message],
        response_format: Option<ResponseFormat>,
    ) -> Result<String> {
        let request = self.request(messages, response_format);

        tracing::debug!(model = %self.model, url = %self.api_url, "Sending chat request");

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to LLM API")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("LLM API error ({}): {}", status, text);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse LLM response")?;

        chat_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .context("No response from LLM")
    }
}

#[async_trait]
impl JsonCompletion for LlmClient {
    async fn complete_json(
        &self,
        prompt: &str,
        schema_name: &str,
        schema: &Value,
    ) -> Result<String> {
        let format = ResponseFormat::JsonSchema {
            json_schema: JsonSchemaSpec {
                name: schema_name.to_string(),
                schema: schema.clone(),
                strict: true,
            },
        };
        self.chat(&[Message::user(prompt)], Some(format)).await
    }
}
