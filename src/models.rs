//! Data models for visibility analysis and health checks.
//!
//! This module contains the core data structures shared by the scorer,
//! the probes, the profile store and the report generator.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ProfileError;

/// The product whose AI-assistant visibility is being measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductProfile {
    /// Product or brand name.
    pub name: String,
    /// Product website (used for citations and health checks).
    pub website: String,
    /// Short description given to the LLM as context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Industry or market segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    /// Known competitor names.
    #[serde(default)]
    pub competitors: Vec<String>,
}

impl ProductProfile {
    /// Creates a product descriptor, rejecting blank names or websites.
    pub fn new(name: &str, website: &str) -> Result<Self, ProfileError> {
        let product = Self {
            name: name.trim().to_string(),
            website: website.trim().to_string(),
            description: None,
            industry: None,
            competitors: Vec::new(),
        };
        product.validate()?;
        Ok(product)
    }

    /// Checks that name and website are non-empty.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.name.trim().is_empty() {
            return Err(ProfileError::InvalidProduct(
                "product name must not be empty".to_string(),
            ));
        }
        if self.website.trim().is_empty() {
            return Err(ProfileError::InvalidProduct(
                "product website must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fixed set of research question categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    #[default]
    Recommendation,
    Comparison,
    HowTo,
    BestOf,
    ProblemSolution,
    Features,
    Pricing,
    Reviews,
}

impl QuestionCategory {
    pub const ALL: [QuestionCategory; 8] = [
        QuestionCategory::Recommendation,
        QuestionCategory::Comparison,
        QuestionCategory::HowTo,
        QuestionCategory::BestOf,
        QuestionCategory::ProblemSolution,
        QuestionCategory::Features,
        QuestionCategory::Pricing,
        QuestionCategory::Reviews,
    ];

    /// Machine label, as used in prompts and JSON.
    pub fn label(&self) -> &'static str {
        match self {
            QuestionCategory::Recommendation => "recommendation",
            QuestionCategory::Comparison => "comparison",
            QuestionCategory::HowTo => "how_to",
            QuestionCategory::BestOf => "best_of",
            QuestionCategory::ProblemSolution => "problem_solution",
            QuestionCategory::Features => "features",
            QuestionCategory::Pricing => "pricing",
            QuestionCategory::Reviews => "reviews",
        }
    }
}

impl fmt::Display for QuestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionCategory::Recommendation => write!(f, "Recommendation"),
            QuestionCategory::Comparison => write!(f, "Comparison"),
            QuestionCategory::HowTo => write!(f, "How-to"),
            QuestionCategory::BestOf => write!(f, "Best of"),
            QuestionCategory::ProblemSolution => write!(f, "Problem/Solution"),
            QuestionCategory::Features => write!(f, "Features"),
            QuestionCategory::Pricing => write!(f, "Pricing"),
            QuestionCategory::Reviews => write!(f, "Reviews"),
        }
    }
}

impl From<&str> for QuestionCategory {
    fn from(s: &str) -> Self {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();

        match normalized.trim_matches('_') {
            "comparison" | "compare" | "versus" | "vs" => QuestionCategory::Comparison,
            "how_to" | "howto" => QuestionCategory::HowTo,
            "best_of" | "bestof" | "best" => QuestionCategory::BestOf,
            "problem_solution" | "problem" | "solution" => QuestionCategory::ProblemSolution,
            "features" | "feature" => QuestionCategory::Features,
            "pricing" | "price" | "cost" => QuestionCategory::Pricing,
            "reviews" | "review" => QuestionCategory::Reviews,
            _ => QuestionCategory::Recommendation,
        }
    }
}

/// Where a test question came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionOrigin {
    #[default]
    Auto,
    Manual,
}

/// A research question the simulated assistants are asked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestQuestion {
    pub text: String,
    #[serde(default)]
    pub category: QuestionCategory,
    #[serde(default = "default_region")]
    pub region: String,
    /// Platforms that mentioned the product in the last run.
    #[serde(default)]
    pub mention_count: u32,
    /// Share of platforms mentioning the product, 0-100.
    #[serde(default)]
    pub visibility_score: u8,
    #[serde(default)]
    pub origin: QuestionOrigin,
}

fn default_region() -> String {
    "global".to_string()
}

impl TestQuestion {
    pub fn new(text: &str, category: QuestionCategory, origin: QuestionOrigin) -> Self {
        Self {
            text: text.trim().to_string(),
            category,
            region: default_region(),
            mention_count: 0,
            visibility_score: 0,
            origin,
        }
    }
}

/// A simulated AI assistant with a fixed relative-authority weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub name: String,
    pub weight: f64,
}

impl Platform {
    pub fn new(name: &str, weight: f64) -> Self {
        Self {
            name: name.to_string(),
            weight,
        }
    }

    /// The four default destinations and their weights.
    pub fn defaults() -> Vec<Platform> {
        vec![
            Platform::new("ChatGPT", 1.2),
            Platform::new("Claude", 1.0),
            Platform::new("Perplexity", 1.1),
            Platform::new("Gemini", 0.9),
        ]
    }
}

/// Per-platform outcome of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformResult {
    pub platform: String,
    pub weight: f64,
    pub mentions: u32,
    pub citations: u32,
    /// Weighted mention rate, 0-100.
    pub score: u8,
}

/// A cited source shown in the dashboard, ranked by display weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationSource {
    pub url: String,
    pub platform: String,
    /// Display-only authority on a 0-10 scale.
    pub weight: f64,
    pub mentions: u32,
}

/// How often a competitor showed up alongside the product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorShare {
    pub name: String,
    pub mentions: u32,
    /// Percentage of all brand mentions in the run.
    pub share: f64,
}

/// One point of the synthetic display trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub score: u8,
}

/// Result of a visibility analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub analyzed_at: DateTime<Utc>,
    /// Weighted visibility, capped below 100.
    pub overall_score: u8,
    pub total_mentions: u32,
    pub total_citations: u32,
    pub questions_evaluated: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_health: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broken_links: Option<u32>,
    /// Display smoothing only; not historical data.
    pub trend: Vec<TrendPoint>,
    pub citation_sources: Vec<CitationSource>,
    pub platform_performance: Vec<PlatformResult>,
    pub competitor_breakdown: Vec<CompetitorShare>,
}

impl AnalysisResult {
    /// Copies SEO figures from a health report into this result.
    pub fn attach_health(&mut self, report: &HealthCheckReport) {
        self.seo_health = Some(report.overall_score);
        self.broken_links = report
            .category(HealthCategoryKind::Content)
            .and_then(|c| c.details.get("broken_links"))
            .and_then(Value::as_u64)
            .map(|n| n as u32);
    }
}

/// The five health check categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthCategoryKind {
    Technical,
    OnPage,
    Content,
    Performance,
    Security,
}

impl HealthCategoryKind {
    pub const ALL: [HealthCategoryKind; 5] = [
        HealthCategoryKind::Technical,
        HealthCategoryKind::OnPage,
        HealthCategoryKind::Content,
        HealthCategoryKind::Performance,
        HealthCategoryKind::Security,
    ];
}

impl fmt::Display for HealthCategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthCategoryKind::Technical => write!(f, "Technical"),
            HealthCategoryKind::OnPage => write!(f, "On-Page"),
            HealthCategoryKind::Content => write!(f, "Content"),
            HealthCategoryKind::Performance => write!(f, "Performance"),
            HealthCategoryKind::Security => write!(f, "Security"),
        }
    }
}

/// Status label derived from a 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Critical,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl HealthStatus {
    /// Step function: 90 / 75 / 60 / 40.
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => HealthStatus::Excellent,
            75..=89 => HealthStatus::Good,
            60..=74 => HealthStatus::Fair,
            40..=59 => HealthStatus::Poor,
            _ => HealthStatus::Critical,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            HealthStatus::Excellent => "🟢",
            HealthStatus::Good => "🟢",
            HealthStatus::Fair => "🟡",
            HealthStatus::Poor => "🟠",
            HealthStatus::Critical => "🔴",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Excellent => write!(f, "Excellent"),
            HealthStatus::Good => write!(f, "Good"),
            HealthStatus::Fair => write!(f, "Fair"),
            HealthStatus::Poor => write!(f, "Poor"),
            HealthStatus::Critical => write!(f, "Critical"),
        }
    }
}

/// Scored outcome of one probe, as shown in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckCategory {
    pub name: HealthCategoryKind,
    pub score: u8,
    pub status: HealthStatus,
    pub issues: Vec<String>,
    #[serde(default)]
    pub details: BTreeMap<String, Value>,
}

/// Priority of a recommended action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn emoji(&self) -> &'static str {
        match self {
            Priority::Low => "🟢",
            Priority::Medium => "🟡",
            Priority::High => "🟠",
            Priority::Critical => "🔴",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
            Priority::Critical => write!(f, "Critical"),
        }
    }
}

/// A recommended fix derived from probe issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub priority: Priority,
    pub category: HealthCategoryKind,
    pub title: String,
    pub description: String,
}

/// Composite SEO health report for one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckReport {
    pub url: String,
    pub checked_at: DateTime<Utc>,
    pub overall_score: u8,
    pub status: HealthStatus,
    pub categories: Vec<HealthCheckCategory>,
    pub action_items: Vec<ActionItem>,
}

impl HealthCheckReport {
    pub fn category(&self, kind: HealthCategoryKind) -> Option<&HealthCheckCategory> {
        self.categories.iter().find(|c| c.name == kind)
    }

    /// Total issue count across categories.
    pub fn issue_count(&self) -> usize {
        self.categories.iter().map(|c| c.issues.len()).sum()
    }
}

/// Persisted product profile with its questions and latest results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub product: ProductProfile,
    #[serde(default)]
    pub questions: Vec<TestQuestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthCheckReport>,
}

impl Profile {
    pub fn new(product: ProductProfile) -> Self {
        Self {
            product,
            questions: Vec::new(),
            analysis: None,
            health: None,
        }
    }

    /// Appends a question unless the same text is already present.
    ///
    /// Returns `true` if the question was added.
    pub fn add_question(&mut self, question: TestQuestion) -> bool {
        let exists = self
            .questions
            .iter()
            .any(|q| q.text.eq_ignore_ascii_case(&question.text));
        if exists || question.text.is_empty() {
            return false;
        }
        self.questions.push(question);
        true
    }

    /// Merges competitor names, keeping the existing order.
    pub fn add_competitors(&mut self, names: &[String]) {
        for name in names {
            let name = name.trim();
            if name.is_empty()
                || name.eq_ignore_ascii_case(&self.product.name)
                || self
                    .product
                    .competitors
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(name))
            {
                continue;
            }
            self.product.competitors.push(name.to_string());
        }
    }
}
