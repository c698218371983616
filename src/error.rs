//! Typed errors for the library-style modules.
//!
//! The binary wraps these in `anyhow` at the command layer.

use thiserror::Error;

/// Failure talking to, or understanding, the LLM.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("cannot connect to LLM endpoint at {url}")]
    Connect { url: String },

    #[error("LLM request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to decode LLM response: {0}")]
    Decode(String),
}

/// Failure of a single website probe. Always degraded, never propagated.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unreadable response from {url}: {reason}")]
    Body { url: String, reason: String },
}

/// Top-level health check failure.
#[derive(Debug, Error)]
pub enum HealthError {
    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Failure loading, validating or saving a profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("invalid product: {0}")]
    InvalidProduct(String),

    #[error("profile I/O error for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed profile {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure generating research questions.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("LLM response contained no usable questions")]
    NoQuestions,
}
