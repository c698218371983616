//! Markdown and JSON report generation.
//!
//! Renders visibility results (stored on a profile) and health check
//! reports for humans, or serializes them unchanged for tooling.

use crate::models::{AnalysisResult, HealthCheckCategory, HealthCheckReport, Profile, TestQuestion};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Generate the visibility report for a profile's latest analysis.
pub fn generate_visibility_markdown(profile: &Profile, analysis: &AnalysisResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("# AI Visibility Report: {}\n\n", profile.product.name));

    output.push_str(&generate_visibility_metadata(profile, analysis));
    output.push_str(&generate_visibility_summary(analysis));
    output.push_str(&generate_platform_section(analysis));
    output.push_str(&generate_questions_section(&profile.questions));
    output.push_str(&generate_citations_section(analysis));
    output.push_str(&generate_competitor_section(analysis));
    output.push_str(&generate_trend_section(analysis));
    output.push_str(&generate_footer());

    output
}

/// Generate the health report for one URL.
pub fn generate_health_markdown(report: &HealthCheckReport) -> String {
    let mut output = String::new();

    output.push_str("# SEO Health Report\n\n");

    output.push_str("## Metadata\n\n");
    output.push_str(&format!("- **URL:** {}\n", report.url));
    output.push_str(&format!(
        "- **Checked:** {}\n",
        report.checked_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!(
        "- **Overall Score:** {}/100 {} {}\n",
        report.overall_score,
        report.status.emoji(),
        report.status
    ));
    output.push_str(&format!("- **Issues Found:** {}\n\n", report.issue_count()));

    output.push_str("## Categories\n\n");
    output.push_str("| Category | Score | Status | Issues |\n");
    output.push_str("|:---|:---:|:---|:---:|\n");
    for category in &report.categories {
        output.push_str(&format!(
            "| {} | {} | {} {} | {} |\n",
            category.name,
            category.score,
            category.status.emoji(),
            category.status,
            category.issues.len()
        ));
    }
    output.push('\n');

    for category in &report.categories {
        output.push_str(&generate_category_block(category));
    }

    output.push_str("## Action Items\n\n");
    if report.action_items.is_empty() {
        output.push_str("No action needed. The site passed every check. 🎉\n\n");
    } else {
        for (i, item) in report.action_items.iter().enumerate() {
            output.push_str(&format!(
                "{}. {} **{}** ({}, {}): {}\n",
                i + 1,
                item.priority.emoji(),
                item.title,
                item.priority,
                item.category,
                item.description
            ));
        }
        output.push('\n');
    }

    output.push_str(&generate_footer());
    output
}

fn generate_visibility_metadata(profile: &Profile, analysis: &AnalysisResult) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Website:** {}\n", profile.product.website));
    if let Some(industry) = &profile.product.industry {
        section.push_str(&format!("- **Industry:** {}\n", industry));
    }
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        analysis.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Questions Evaluated:** {}\n\n",
        analysis.questions_evaluated
    ));

    section
}

fn generate_visibility_summary(analysis: &AnalysisResult) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Visibility | Mentions | Citations | SEO Health | Broken Links |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| **{}/100** | {} | {} | {} | {} |\n\n",
        analysis.overall_score,
        analysis.total_mentions,
        analysis.total_citations,
        analysis
            .seo_health
            .map_or_else(|| "n/a".to_string(), |s| format!("{}/100", s)),
        analysis
            .broken_links
            .map_or_else(|| "n/a".to_string(), |n| n.to_string()),
    ));

    section
}

fn generate_platform_section(analysis: &AnalysisResult) -> String {
    let mut section = String::new();

    section.push_str("## Platform Performance\n\n");
    section.push_str("| Platform | Weight | Mentions | Citations | Score |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|\n");
    for platform in &analysis.platform_performance {
        section.push_str(&format!(
            "| {} | {:.1} | {} | {} | {} |\n",
            platform.platform, platform.weight, platform.mentions, platform.citations, platform.score
        ));
    }
    section.push('\n');

    section
}

fn generate_questions_section(questions: &[TestQuestion]) -> String {
    if questions.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Questions\n\n");
    section.push_str("| Question | Category | Mentions | Visibility |\n");
    section.push_str("|:---|:---|:---:|:---:|\n");
    for question in questions {
        section.push_str(&format!(
            "| {} | {} | {} | {}% |\n",
            question.text.replace('|', "\\|"),
            question.category,
            question.mention_count,
            question.visibility_score
        ));
    }
    section.push('\n');

    section
}

fn generate_citations_section(analysis: &AnalysisResult) -> String {
    if analysis.citation_sources.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Citation Sources\n\n");
    section.push_str("| Source | Platform | Weight | Citations |\n");
    section.push_str("|:---|:---|:---:|:---:|\n");
    for source in &analysis.citation_sources {
        section.push_str(&format!(
            "| {} | {} | {:.1} | {} |\n",
            source.url, source.platform, source.weight, source.mentions
        ));
    }
    section.push('\n');

    section
}

fn generate_competitor_section(analysis: &AnalysisResult) -> String {
    if analysis.competitor_breakdown.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Share of Voice\n\n");
    section.push_str("| Brand | Mentions | Share |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for entry in &analysis.competitor_breakdown {
        section.push_str(&format!(
            "| {} | {} | {:.1}% |\n",
            entry.name, entry.mentions, entry.share
        ));
    }
    section.push('\n');

    section
}

fn generate_trend_section(analysis: &AnalysisResult) -> String {
    if analysis.trend.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Trend\n\n");
    section.push_str("| Date | Score |\n");
    section.push_str("|:---|:---:|\n");
    for point in &analysis.trend {
        section.push_str(&format!("| {} | {} |\n", point.date, point.score));
    }
    section.push_str("\n*Trend values are smoothed for display and are not historical measurements.*\n\n");

    section
}

/// Generate one category's issue list.
fn generate_category_block(category: &HealthCheckCategory) -> String {
    let mut block = String::new();

    block.push_str(&format!(
        "### {} {} ({}/100)\n\n",
        category.status.emoji(),
        category.name,
        category.score
    ));

    if category.issues.is_empty() {
        block.push_str("No issues found.\n\n");
    } else {
        for issue in &category.issues {
            block.push_str(&format!("- {}\n", issue));
        }
        block.push('\n');
    }

    block
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by AEOScope*\n");

    footer
}

/// Serialize any report value as pretty JSON.
pub fn generate_json_report<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ActionItem, CitationSource, CompetitorShare, HealthCategoryKind, HealthStatus,
        PlatformResult, Priority, ProductProfile, QuestionCategory, QuestionOrigin, TrendPoint,
    };
    use chrono::{NaiveDate, Utc};
    use std::collections::BTreeMap;

    fn create_test_profile() -> (Profile, AnalysisResult) {
        let mut product = ProductProfile::new("Acme Anvils", "https://acme.test").unwrap();
        product.industry = Some("Metalworking".to_string());
        let mut profile = Profile::new(product);

        let mut question = TestQuestion::new(
            "Best anvil | for beginners?",
            QuestionCategory::BestOf,
            QuestionOrigin::Auto,
        );
        question.mention_count = 2;
        question.visibility_score = 50;
        profile.add_question(question);

        let analysis = AnalysisResult {
            analyzed_at: Utc::now(),
            overall_score: 48,
            total_mentions: 90,
            total_citations: 13,
            questions_evaluated: 1,
            seo_health: Some(82),
            broken_links: None,
            trend: vec![TrendPoint {
                date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                score: 40,
            }],
            citation_sources: vec![CitationSource {
                url: "https://acme.test".to_string(),
                platform: "ChatGPT".to_string(),
                weight: 6.0,
                mentions: 2,
            }],
            platform_performance: vec![PlatformResult {
                platform: "ChatGPT".to_string(),
                weight: 1.2,
                mentions: 1,
                citations: 1,
                score: 100,
            }],
            competitor_breakdown: vec![CompetitorShare {
                name: "Globex".to_string(),
                mentions: 3,
                share: 75.0,
            }],
        };
        (profile, analysis)
    }

    fn create_test_health_report() -> HealthCheckReport {
        HealthCheckReport {
            url: "http://acme.test/".to_string(),
            checked_at: Utc::now(),
            overall_score: 78,
            status: HealthStatus::Good,
            categories: vec![
                HealthCheckCategory {
                    name: HealthCategoryKind::OnPage,
                    score: 100,
                    status: HealthStatus::Excellent,
                    issues: Vec::new(),
                    details: BTreeMap::new(),
                },
                HealthCheckCategory {
                    name: HealthCategoryKind::Security,
                    score: 30,
                    status: HealthStatus::Critical,
                    issues: vec!["Not using HTTPS".to_string()],
                    details: BTreeMap::new(),
                },
            ],
            action_items: vec![ActionItem {
                priority: Priority::Critical,
                category: HealthCategoryKind::Security,
                title: "Enable HTTPS".to_string(),
                description: "Serve every page over HTTPS.".to_string(),
            }],
        }
    }

    #[test]
    fn test_generate_visibility_markdown() {
        let (profile, analysis) = create_test_profile();
        let markdown = generate_visibility_markdown(&profile, &analysis);

        assert!(markdown.contains("# AI Visibility Report: Acme Anvils"));
        assert!(markdown.contains("- **Industry:** Metalworking"));
        assert!(markdown.contains("| **48/100** | 90 | 13 | 82/100 | n/a |"));
        assert!(markdown.contains("| ChatGPT | 1.2 | 1 | 1 | 100 |"));
        assert!(markdown.contains("Best anvil \\| for beginners?"));
        assert!(markdown.contains("| Globex | 3 | 75.0% |"));
        assert!(markdown.contains("| 2024-05-01 | 40 |"));
        assert!(markdown.ends_with("*Report generated by AEOScope*\n"));
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let (mut profile, mut analysis) = create_test_profile();
        profile.questions.clear();
        analysis.citation_sources.clear();
        analysis.competitor_breakdown.clear();

        let markdown = generate_visibility_markdown(&profile, &analysis);
        assert!(!markdown.contains("## Questions"));
        assert!(!markdown.contains("## Citation Sources"));
        assert!(!markdown.contains("## Share of Voice"));
        assert!(markdown.contains("## Platform Performance"));
    }

    #[test]
    fn test_generate_health_markdown() {
        let markdown = generate_health_markdown(&create_test_health_report());

        assert!(markdown.contains("# SEO Health Report"));
        assert!(markdown.contains("- **Overall Score:** 78/100 🟢 Good"));
        assert!(markdown.contains("| Security | 30 | 🔴 Critical | 1 |"));
        assert!(markdown.contains("### 🟢 On-Page (100/100)\n\nNo issues found."));
        assert!(markdown.contains("- Not using HTTPS"));
        assert!(markdown.contains("1. 🔴 **Enable HTTPS** (Critical, Security)"));
    }

    #[test]
    fn test_health_markdown_without_action_items() {
        let mut report = create_test_health_report();
        report.action_items.clear();
        let markdown = generate_health_markdown(&report);
        assert!(markdown.contains("No action needed."));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_health_report();
        let json = generate_json_report(&report).unwrap();

        let parsed: HealthCheckReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
        assert!(json.contains("\"status\": \"critical\""));
        assert!(json.contains("\"name\": \"on_page\""));
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        write_report("# Report\n", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Report\n");
    }
}
