//! Content quality probe: length, linking, heading structure, duplicate
//! paragraphs and a bounded broken-link check.

use reqwest::Url;
use std::collections::HashMap;
use tracing::debug;

use super::{html, PageFetcher, ProbeOutcome, ScoreCard};
use crate::error::ProbeError;

pub const PENALTY_THIN_CONTENT: u32 = 15;
pub const PENALTY_SHORT_CONTENT: u32 = 5;
pub const PENALTY_FEW_INTERNAL_LINKS: u32 = 10;
pub const PENALTY_NO_EXTERNAL_LINKS: u32 = 5;
pub const PENALTY_NO_H2: u32 = 10;
pub const PENALTY_DUPLICATE_PARAGRAPHS: u32 = 10;
pub const PENALTY_PER_BROKEN_LINK: u32 = 5;
pub const MAX_BROKEN_LINK_PENALTY: u32 = 15;

const THIN_CONTENT_WORDS: usize = 300;
const SHORT_CONTENT_WORDS: usize = 600;
const MIN_INTERNAL_LINKS: usize = 3;
/// Paragraphs shorter than this are too generic to call duplicates.
const MIN_DUPLICATE_CHARS: usize = 50;

/// Outcome of checking a sample of internal links.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkCheck {
    pub checked: usize,
    pub broken: usize,
}

pub fn evaluate(page_html: &str, base: &Url, link_check: LinkCheck) -> ProbeOutcome {
    let mut card = ScoreCard::new();

    let word_count = html::word_count(&html::visible_text(page_html));
    if word_count < THIN_CONTENT_WORDS {
        card.penalize(
            PENALTY_THIN_CONTENT,
            format!("Thin content ({} words)", word_count),
        );
    } else if word_count < SHORT_CONTENT_WORDS {
        card.penalize(
            PENALTY_SHORT_CONTENT,
            format!("Content could be more comprehensive ({} words)", word_count),
        );
    }

    let links = html::links(page_html, base);
    if links.internal.len() < MIN_INTERNAL_LINKS {
        card.penalize(
            PENALTY_FEW_INTERNAL_LINKS,
            format!("Few internal links ({})", links.internal.len()),
        );
    }
    if links.external.is_empty() {
        card.penalize(PENALTY_NO_EXTERNAL_LINKS, "No external links");
    }

    let headings = html::heading_counts(page_html);
    if headings[1] == 0 {
        card.penalize(PENALTY_NO_H2, "No H2 subheadings");
    }

    let duplicates = duplicate_paragraphs(&html::paragraphs(page_html));
    if duplicates > 0 {
        card.penalize(
            PENALTY_DUPLICATE_PARAGRAPHS,
            format!("{} duplicate paragraphs detected", duplicates),
        );
    }

    if link_check.broken > 0 {
        let penalty =
            (link_check.broken as u32 * PENALTY_PER_BROKEN_LINK).min(MAX_BROKEN_LINK_PENALTY);
        card.penalize(
            penalty,
            format!("{} broken internal links", link_check.broken),
        );
    }

    card.detail("word_count", word_count);
    card.detail("internal_links", links.internal.len());
    card.detail("external_links", links.external.len());
    card.detail("h2_count", headings[1]);
    card.detail("h3_count", headings[2]);
    card.detail("duplicate_paragraphs", duplicates);
    card.detail("links_checked", link_check.checked);
    card.detail("broken_links", link_check.broken);
    card.finish()
}

/// Number of paragraphs that repeat an earlier one.
fn duplicate_paragraphs(paragraphs: &[String]) -> usize {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for p in paragraphs {
        if p.chars().count() < MIN_DUPLICATE_CHARS {
            continue;
        }
        *seen.entry(p.to_lowercase()).or_default() += 1;
    }
    seen.values().map(|n| n - 1).sum()
}

pub async fn run(
    fetcher: &PageFetcher,
    url: &Url,
    max_link_checks: usize,
) -> Result<ProbeOutcome, ProbeError> {
    let page = fetcher.get(url).await?;
    let links = html::links(&page.body, &page.url);

    let mut sample: Vec<&Url> = Vec::new();
    for link in &links.internal {
        if sample.len() >= max_link_checks {
            break;
        }
        if link != &page.url && !sample.contains(&link) {
            sample.push(link);
        }
    }

    let mut link_check = LinkCheck::default();
    for link in sample {
        link_check.checked += 1;
        let broken = match fetcher.status_of(link).await {
            Ok(status) => status.is_client_error() || status.is_server_error(),
            Err(e) => {
                debug!("Link check failed for {}: {}", link, e);
                true
            }
        };
        if broken {
            link_check.broken += 1;
        }
    }

    Ok(evaluate(&page.body, &page.url, link_check))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://acme.test/").unwrap()
    }

    fn rich_page() -> String {
        let body = "Acme anvils are forged from a single billet of tool steel. ".repeat(70);
        format!(
            r#"<html><body><h1>Anvils</h1><h2>Craft</h2><p>{}</p>
<a href="/a">A</a><a href="/b">B</a><a href="/c">C</a>
<a href="https://example.org">Source</a></body></html>"#,
            body
        )
    }

    #[test]
    fn test_rich_page_scores_100() {
        let outcome = evaluate(&rich_page(), &base(), LinkCheck { checked: 3, broken: 0 });
        assert_eq!(outcome.score, 100, "issues: {:?}", outcome.issues);
        assert_eq!(outcome.details["internal_links"], 3);
        assert_eq!(outcome.details["broken_links"], 0);
    }

    #[test]
    fn test_thin_page() {
        let outcome = evaluate(
            "<html><body><h1>Hi</h1><p>Short.</p></body></html>",
            &base(),
            LinkCheck::default(),
        );
        // thin 15 + internal 10 + external 5 + h2 10
        assert_eq!(outcome.score, 60);
        assert_eq!(outcome.issues[0], "Thin content (2 words)");
    }

    #[test]
    fn test_duplicate_paragraphs() {
        let para = "<p>This exact paragraph appears more than once on the page, verbatim.</p>";
        let page = rich_page().replace("</body>", &format!("{para}{para}{para}</body>"));
        let outcome = evaluate(&page, &base(), LinkCheck::default());
        assert_eq!(outcome.details["duplicate_paragraphs"], 2);
        assert!(outcome
            .issues
            .contains(&"2 duplicate paragraphs detected".to_string()));
    }

    #[test]
    fn test_short_paragraphs_are_not_duplicates() {
        let paragraphs = vec!["Learn more".to_string(), "Learn more".to_string()];
        assert_eq!(duplicate_paragraphs(&paragraphs), 0);
    }

    #[test]
    fn test_broken_link_penalty_is_capped() {
        let outcome = evaluate(&rich_page(), &base(), LinkCheck { checked: 5, broken: 4 });
        assert_eq!(outcome.score, 85);
        assert_eq!(outcome.issues, vec!["4 broken internal links"]);
    }
}
