//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::analysis::DEFAULT_QUESTION_COUNT;

/// AEOScope - AI assistant visibility and SEO health for your product
///
/// Estimates how likely AI assistants are to mention a product, and
/// checks the product website's SEO health. Markdown/JSON reports.
///
/// Examples:
///   aeoscope init --profile acme.json --name Acme --website https://acme.com
///   aeoscope questions --profile acme.json --count 10
///   aeoscope visibility --profile acme.json --output visibility.md
///   aeoscope health --url https://acme.com --fail-under 70
///   aeoscope init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .aeoscope.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Ollama model to use for judgments and question generation
    #[arg(short, long, env = "AEOSCOPE_MODEL", global = true)]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL", global = true)]
    pub ollama_url: Option<String>,

    /// LLM request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate a default .aeoscope.toml configuration file
    InitConfig,

    /// Create a new product profile
    Init {
        /// Profile file to create
        #[arg(short, long, value_name = "FILE")]
        profile: PathBuf,

        /// Product or brand name
        #[arg(long)]
        name: String,

        /// Product website
        #[arg(long, value_name = "URL")]
        website: String,

        /// Short product description used as LLM context
        #[arg(long)]
        description: Option<String>,

        /// Industry or market segment
        #[arg(long)]
        industry: Option<String>,

        /// Known competitor (repeatable)
        #[arg(long = "competitor", value_name = "NAME")]
        competitors: Vec<String>,
    },

    /// Generate research questions with the LLM, or add one manually
    Questions {
        /// Profile file to update
        #[arg(short, long, value_name = "FILE")]
        profile: PathBuf,

        /// Number of questions to generate
        #[arg(long, default_value_t = DEFAULT_QUESTION_COUNT, value_name = "COUNT")]
        count: usize,

        /// Add this question manually instead of generating
        #[arg(long, value_name = "TEXT")]
        add: Option<String>,

        /// Category for a manually added question
        #[arg(long, requires = "add", default_value = "recommendation")]
        category: String,

        /// Region for a manually added question
        #[arg(long, requires = "add", default_value = "global")]
        region: String,
    },

    /// Score how visible the product is across simulated AI assistants
    Visibility {
        /// Profile file to analyze (the result is stored back into it)
        #[arg(short, long, value_name = "FILE")]
        profile: PathBuf,

        /// Output format (markdown, json)
        #[arg(long, default_value = "markdown", value_name = "FORMAT")]
        format: OutputFormat,

        /// Write the report here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Run the SEO health check against a website
    Health {
        /// URL to check
        #[arg(long, value_name = "URL", required_unless_present = "profile")]
        url: Option<String>,

        /// Check the profile's website and store the report in the profile
        #[arg(short, long, value_name = "FILE", conflicts_with = "url")]
        profile: Option<PathBuf>,

        /// Output format (markdown, json)
        #[arg(long, default_value = "markdown", value_name = "FORMAT")]
        format: OutputFormat,

        /// Write the report here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Fail (exit code 2) if the overall score is below this value
        ///
        /// Useful for CI pipelines.
        #[arg(long, value_name = "SCORE")]
        fail_under: Option<u8>,
    },
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        match &self.command {
            Command::Init { name, website, .. } => {
                if name.trim().is_empty() {
                    return Err("Product name must not be empty".to_string());
                }
                if website.trim().is_empty() {
                    return Err("Product website must not be empty".to_string());
                }
            }
            Command::Questions { count, add, .. } => {
                if add.is_none() && *count == 0 {
                    return Err("Question count must be at least 1".to_string());
                }
                if let Some(text) = add {
                    if text.trim().is_empty() {
                        return Err("Question text must not be empty".to_string());
                    }
                }
            }
            Command::Health {
                fail_under: Some(score),
                ..
            } if *score > 100 => {
                return Err("--fail-under must be between 0 and 100".to_string());
            }
            _ => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
