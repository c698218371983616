//! LLM access for visibility judgments and question generation.
//!
//! The scorer only sees the [`Oracle`] trait, so tests can substitute a
//! scripted implementation for the real Ollama client.

pub mod extract;
pub mod ollama;

pub use extract::{parse_judgment, ParseStrategy};
pub use ollama::{OllamaClient, OllamaConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OracleError;

/// Structured answer to "would this platform mention the product?".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Judgment {
    pub mentioned: bool,
    /// 0-100.
    pub confidence: u8,
    /// Competitors the simulated answer would also name.
    #[serde(default)]
    pub competitors_mentioned: Vec<String>,
}

impl Judgment {
    pub fn not_mentioned() -> Self {
        Self::default()
    }
}

/// Plain text completion against an LLM.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Name of the model behind this client, for report metadata.
    fn model_name(&self) -> &str;

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, OracleError>;
}

/// Judgment source used by the visibility scorer.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn judge(&self, prompt: &str) -> Result<Judgment, OracleError>;
}

/// Oracle backed by any [`LlmClient`], parsing free text into a [`Judgment`].
pub struct LlmOracle<C> {
    client: C,
}

impl<C: LlmClient> LlmOracle<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: LlmClient> Oracle for LlmOracle<C> {
    async fn judge(&self, prompt: &str) -> Result<Judgment, OracleError> {
        let text = self.client.complete(JUDGE_SYSTEM_PROMPT, prompt).await?;
        Ok(parse_judgment(&text))
    }
}

/// System prompt for visibility judgments.
pub const JUDGE_SYSTEM_PROMPT: &str = r#"You simulate how AI assistants answer user questions.
Given a product, an assistant name and a user question, decide whether that assistant's answer would mention the product.
Respond with a single JSON object and nothing else:
{"mentioned": true|false, "confidence": 0-100, "competitors_mentioned": ["name", ...]}"#;
