//! SEO health aggregation.
//!
//! Runs the five probes concurrently, degrades any probe that fails, and
//! composes the category scores into one report with prioritized action
//! items.

use chrono::Utc;
use reqwest::Url;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::config::HealthConfig;
use crate::error::{HealthError, ProbeError};
use crate::models::{
    ActionItem, HealthCategoryKind, HealthCheckCategory, HealthCheckReport, HealthStatus,
    Priority,
};
use crate::probes::{content, metadata, performance, security, technical};
use crate::probes::{PageFetcher, ProbeOutcome};

/// Score given to a probe that could not complete.
pub const DEGRADED_SCORE: u8 = 50;
/// Categories below this score get a generic action item.
pub const WEAK_CATEGORY_SCORE: u8 = 60;
/// Maximum action items in a report.
pub const MAX_ACTION_ITEMS: usize = 5;

/// Runs the health check for a URL.
pub struct HealthAggregator {
    fetcher: PageFetcher,
    max_link_checks: usize,
}

impl HealthAggregator {
    pub fn new(config: &HealthConfig) -> Result<Self, HealthError> {
        Ok(Self {
            fetcher: PageFetcher::new(config)?,
            max_link_checks: config.max_link_checks,
        })
    }

    /// Checks `raw_url`. Only an unusable URL fails; probe failures degrade.
    pub async fn check(&self, raw_url: &str) -> Result<HealthCheckReport, HealthError> {
        let url = normalize_url(raw_url)?;
        info!("Running health check for {}", url);

        let (technical, on_page, content, performance, security) = futures::join!(
            technical::run(&self.fetcher, &url),
            metadata::run(&self.fetcher, &url),
            content::run(&self.fetcher, &url, self.max_link_checks),
            performance::run(&self.fetcher, &url),
            security::run(&self.fetcher, &url),
        );

        let report = compose(
            url.as_str(),
            vec![
                (HealthCategoryKind::Technical, technical),
                (HealthCategoryKind::OnPage, on_page),
                (HealthCategoryKind::Content, content),
                (HealthCategoryKind::Performance, performance),
                (HealthCategoryKind::Security, security),
            ],
        );

        info!(
            "Health check complete: {}/100 ({}), {} issues",
            report.overall_score,
            report.status,
            report.issue_count()
        );
        Ok(report)
    }
}

/// Adds a missing scheme and rejects anything without an http(s) host.
pub fn normalize_url(raw: &str) -> Result<Url, HealthError> {
    let trimmed = raw.trim();
    let invalid = |reason: &str| HealthError::InvalidUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid("empty URL"));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("only http and https URLs can be checked"));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("URL has no host"));
    }
    Ok(url)
}

/// Replacement outcome for a probe that failed.
pub fn degrade(kind: HealthCategoryKind, error: &ProbeError) -> ProbeOutcome {
    warn!("{} check degraded: {}", kind, error);
    ProbeOutcome {
        score: DEGRADED_SCORE,
        issues: vec![format!("Unable to complete {} check: {}", kind, error)],
        details: BTreeMap::new(),
    }
}

/// Builds the report from per-category probe results.
pub fn compose(
    url: &str,
    results: Vec<(HealthCategoryKind, Result<ProbeOutcome, ProbeError>)>,
) -> HealthCheckReport {
    let categories: Vec<HealthCheckCategory> = results
        .into_iter()
        .map(|(kind, result)| {
            let outcome = result.unwrap_or_else(|e| degrade(kind, &e));
            let score = outcome.score.min(100);
            HealthCheckCategory {
                name: kind,
                score,
                status: HealthStatus::from_score(score),
                issues: outcome.issues,
                details: outcome.details,
            }
        })
        .collect();

    let overall_score = overall_score(&categories);

    HealthCheckReport {
        url: url.to_string(),
        checked_at: Utc::now(),
        overall_score,
        status: HealthStatus::from_score(overall_score),
        action_items: action_items(&categories),
        categories,
    }
}

/// Rounded mean of the category scores.
pub fn overall_score(categories: &[HealthCheckCategory]) -> u8 {
    if categories.is_empty() {
        return 0;
    }
    let total: u32 = categories.iter().map(|c| u32::from(c.score)).sum();
    let mean = f64::from(total) / categories.len() as f64;
    mean.round().clamp(0.0, 100.0) as u8
}

/// Issue substrings mapped to a recommended action.
struct ActionRule {
    patterns: &'static [&'static str],
    priority: Priority,
    category: HealthCategoryKind,
    title: &'static str,
    description: &'static str,
}

/// Checked in this order; the order is the only prioritization.
const ACTION_RULES: &[ActionRule] = &[
    ActionRule {
        patterns: &["HTTPS"],
        priority: Priority::Critical,
        category: HealthCategoryKind::Security,
        title: "Enable HTTPS",
        description: "Serve every page over HTTPS and redirect plain HTTP requests.",
    },
    ActionRule {
        patterns: &["page title", "Title too"],
        priority: Priority::High,
        category: HealthCategoryKind::OnPage,
        title: "Optimize the page title",
        description: "Use a unique, descriptive title of 30-60 characters.",
    },
    ActionRule {
        patterns: &["meta description", "Meta description"],
        priority: Priority::High,
        category: HealthCategoryKind::OnPage,
        title: "Write a meta description",
        description: "Summarize the page in 120-160 characters so assistants and search engines can quote it.",
    },
    ActionRule {
        patterns: &["Slow "],
        priority: Priority::High,
        category: HealthCategoryKind::Performance,
        title: "Improve page speed",
        description: "Reduce server response time and page weight; aim for loads under 1.5 seconds.",
    },
    ActionRule {
        patterns: &["Mixed content"],
        priority: Priority::High,
        category: HealthCategoryKind::Security,
        title: "Remove mixed content",
        description: "Load scripts, styles and images over HTTPS only.",
    },
    ActionRule {
        patterns: &["Thin content"],
        priority: Priority::High,
        category: HealthCategoryKind::Content,
        title: "Expand thin content",
        description: "Add substantive copy (300+ words) that answers the questions buyers ask.",
    },
    ActionRule {
        patterns: &["sitemap"],
        priority: Priority::Medium,
        category: HealthCategoryKind::Technical,
        title: "Publish an XML sitemap",
        description: "Serve /sitemap.xml and reference it from robots.txt.",
    },
    ActionRule {
        patterns: &["robots.txt"],
        priority: Priority::Medium,
        category: HealthCategoryKind::Technical,
        title: "Add a robots.txt file",
        description: "Tell crawlers what to index and where the sitemap lives.",
    },
    ActionRule {
        patterns: &["viewport"],
        priority: Priority::Medium,
        category: HealthCategoryKind::Technical,
        title: "Add a viewport meta tag",
        description: "Declare a responsive viewport so the page renders on mobile.",
    },
    ActionRule {
        patterns: &["Compression not enabled"],
        priority: Priority::Medium,
        category: HealthCategoryKind::Performance,
        title: "Enable compression",
        description: "Serve HTML, CSS and JavaScript with gzip or brotli.",
    },
    ActionRule {
        patterns: &["missing alt text"],
        priority: Priority::Medium,
        category: HealthCategoryKind::OnPage,
        title: "Add image alt text",
        description: "Describe every meaningful image with an alt attribute.",
    },
    ActionRule {
        patterns: &[
            "Strict-Transport-Security",
            "Content-Security-Policy",
            "X-Frame-Options",
            "X-Content-Type-Options",
            "Referrer-Policy",
        ],
        priority: Priority::Medium,
        category: HealthCategoryKind::Security,
        title: "Add security headers",
        description: "Send HSTS, CSP, X-Frame-Options, X-Content-Type-Options and Referrer-Policy.",
    },
    ActionRule {
        patterns: &["broken internal link"],
        priority: Priority::High,
        category: HealthCategoryKind::Content,
        title: "Fix broken links",
        description: "Update or remove internal links that return errors.",
    },
    ActionRule {
        patterns: &["Missing cache headers"],
        priority: Priority::Low,
        category: HealthCategoryKind::Performance,
        title: "Set cache headers",
        description: "Add Cache-Control headers so repeat visits load from cache.",
    },
];

/// Rule-based action items followed by one item per weak category,
/// truncated to [`MAX_ACTION_ITEMS`].
pub fn action_items(categories: &[HealthCheckCategory]) -> Vec<ActionItem> {
    let issues: Vec<&str> = categories
        .iter()
        .flat_map(|c| c.issues.iter().map(String::as_str))
        .collect();

    let mut items: Vec<ActionItem> = ACTION_RULES
        .iter()
        .filter(|rule| {
            issues
                .iter()
                .any(|issue| rule.patterns.iter().any(|p| issue.contains(p)))
        })
        .map(|rule| ActionItem {
            priority: rule.priority,
            category: rule.category,
            title: rule.title.to_string(),
            description: rule.description.to_string(),
        })
        .collect();

    for category in categories.iter().filter(|c| c.score < WEAK_CATEGORY_SCORE) {
        let title = format!("Improve {} score", category.name);
        if items.iter().any(|i| i.title == title) {
            continue;
        }
        items.push(ActionItem {
            priority: Priority::High,
            category: category.name,
            title,
            description: format!(
                "{} scored {}/100; work through the issues listed for this category.",
                category.name, category.score
            ),
        });
    }

    items.truncate(MAX_ACTION_ITEMS);
    items
}
