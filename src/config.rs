//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.aeoscope.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::analysis::visibility::{
    CITATION_DISPLAY_MULTIPLIER, CITATION_THRESHOLD, DEFAULT_CALL_DELAY_MS,
    MAX_EVALUATED_QUESTIONS, MENTION_DISPLAY_MULTIPLIER, MENTION_THRESHOLD, OVERALL_SCORE_CAP,
};
use crate::models::Platform;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".aeoscope.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Visibility scoring policy.
    #[serde(default)]
    pub visibility: VisibilityConfig,

    /// Health check settings.
    #[serde(default)]
    pub health: HealthConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Show a progress bar during visibility runs.
    #[serde(default = "default_true")]
    pub progress: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            progress: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_model_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            ollama_url: default_ollama_url(),
            temperature: default_temperature(),
            timeout_seconds: default_model_timeout(),
        }
    }
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_model_timeout() -> u64 {
    120
}

/// Visibility scoring policy. Defaults encode product policy; change with care.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityConfig {
    /// Questions evaluated per run (the rest are ignored).
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,

    /// Pause between consecutive LLM calls, in milliseconds.
    #[serde(default = "default_call_delay_ms")]
    pub call_delay_ms: u64,

    /// Confidence above which a mention counts.
    #[serde(default = "default_mention_threshold")]
    pub mention_threshold: u8,

    /// Confidence above which a mention also counts as a citation.
    #[serde(default = "default_citation_threshold")]
    pub citation_threshold: u8,

    /// Upper bound for the overall score.
    #[serde(default = "default_score_cap")]
    pub score_cap: u8,

    /// Display multiplier for total mentions.
    #[serde(default = "default_mention_multiplier")]
    pub mention_multiplier: f64,

    /// Display multiplier for total citations.
    #[serde(default = "default_citation_multiplier")]
    pub citation_multiplier: f64,

    /// Simulated assistants and their weights.
    #[serde(default = "Platform::defaults")]
    pub platforms: Vec<Platform>,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            max_questions: default_max_questions(),
            call_delay_ms: default_call_delay_ms(),
            mention_threshold: default_mention_threshold(),
            citation_threshold: default_citation_threshold(),
            score_cap: default_score_cap(),
            mention_multiplier: default_mention_multiplier(),
            citation_multiplier: default_citation_multiplier(),
            platforms: Platform::defaults(),
        }
    }
}

fn default_max_questions() -> usize {
    MAX_EVALUATED_QUESTIONS
}

fn default_call_delay_ms() -> u64 {
    DEFAULT_CALL_DELAY_MS
}

fn default_mention_threshold() -> u8 {
    MENTION_THRESHOLD
}

fn default_citation_threshold() -> u8 {
    CITATION_THRESHOLD
}

fn default_score_cap() -> u8 {
    OVERALL_SCORE_CAP
}

fn default_mention_multiplier() -> f64 {
    MENTION_DISPLAY_MULTIPLIER
}

fn default_citation_multiplier() -> f64 {
    CITATION_DISPLAY_MULTIPLIER
}

/// Website health check settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_health_timeout")]
    pub timeout_seconds: u64,

    /// User agent sent with every probe request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Internal links checked for breakage by the content probe.
    #[serde(default = "default_max_link_checks")]
    pub max_link_checks: usize,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_health_timeout(),
            user_agent: default_user_agent(),
            max_link_checks: default_max_link_checks(),
        }
    }
}

fn default_health_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!(
        "Mozilla/5.0 (compatible; AEOScope/{}; SEO health check)",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_max_link_checks() -> usize {
    5
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.ollama_url {
            self.model.ollama_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }

        if args.verbose {
            self.general.verbose = true;
        }
        if args.quiet {
            self.general.progress = false;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Args, Command};
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.name, "llama3.2:latest");
        assert_eq!(config.visibility.max_questions, 10);
        assert_eq!(config.visibility.call_delay_ms, 100);
        assert_eq!(config.visibility.score_cap, 95);
        assert_eq!(config.visibility.platforms.len(), 4);
        assert_eq!(config.health.max_link_checks, 5);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
verbose = true

[model]
name = "qwen2.5:14b"
temperature = 0.0

[visibility]
max_questions = 5
call_delay_ms = 0
platforms = [
    { name = "ChatGPT", weight = 1.5 },
    { name = "Copilot", weight = 0.8 },
]

[health]
timeout_seconds = 3
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.model.name, "qwen2.5:14b");
        assert_eq!(config.model.ollama_url, "http://localhost:11434");
        assert_eq!(config.visibility.max_questions, 5);
        assert_eq!(config.visibility.call_delay_ms, 0);
        assert_eq!(config.visibility.mention_threshold, 50);
        assert_eq!(config.visibility.platforms[1], Platform::new("Copilot", 0.8));
        assert_eq!(config.health.timeout_seconds, 3);
        assert_eq!(config.health.max_link_checks, 5);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[model]\nname = \"mistral:7b\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.model.name, "mistral:7b");
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[model\nname = ").unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_merge_with_args_only_overrides_explicit_values() {
        let mut config = Config::default();
        let args = Args {
            config: None,
            model: Some("phi3:mini".to_string()),
            ollama_url: None,
            timeout: None,
            verbose: false,
            quiet: true,
            command: Command::InitConfig,
        };

        config.merge_with_args(&args);

        assert_eq!(config.model.name, "phi3:mini");
        assert_eq!(config.model.ollama_url, "http://localhost:11434");
        assert_eq!(config.model.timeout_seconds, 120);
        assert!(!config.general.progress);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[model]"));
        assert!(toml_str.contains("[visibility]"));
        assert!(toml_str.contains("[health]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.visibility.platforms.len(), 4);
    }
}
