//! Ollama chat client.
//!
//! Sends non-streaming `/api/chat` requests and returns the assistant's
//! message text. One client is shared by the judge and the question
//! generator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::LlmClient;
use crate::error::OracleError;

/// Connection settings for the Ollama endpoint.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub ollama_url: String,
    pub model_name: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            model_name: "llama3.2:latest".to_string(),
            temperature: 0.2,
            timeout_seconds: 120,
        }
    }
}

impl From<&crate::config::ModelConfig> for OllamaConfig {
    fn from(config: &crate::config::ModelConfig) -> Self {
        Self {
            ollama_url: config.ollama_url.clone(),
            model_name: config.name.clone(),
            temperature: config.temperature,
            timeout_seconds: config.timeout_seconds,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

/// HTTP client for a local or remote Ollama server.
pub struct OllamaClient {
    config: OllamaConfig,
    http_client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self, OracleError> {
        info!(
            "Initializing LLM client with model {} at {}",
            config.model_name, config.ollama_url
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    fn model_name(&self) -> &str {
        &self.config.model_name
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, OracleError> {
        let url = format!("{}/api/chat", self.config.ollama_url.trim_end_matches('/'));

        let request = OllamaChatRequest {
            model: self.config.model_name.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        };

        debug!("Sending chat request ({} prompt chars)", prompt.len());

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout {
                        timeout_secs: self.config.timeout_seconds,
                    }
                } else if e.is_connect() {
                    OracleError::Connect {
                        url: self.config.ollama_url.clone(),
                    }
                } else {
                    OracleError::Http(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Api { status, body });
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Decode(e.to_string()))?;

        Ok(chat_response.message.content)
    }
}
