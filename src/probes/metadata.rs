//! Page metadata probe (reported as the on-page category).

use reqwest::Url;

use super::{html, PageFetcher, ProbeOutcome, ScoreCard};
use crate::error::ProbeError;

pub const PENALTY_NO_TITLE: u32 = 15;
pub const PENALTY_TITLE_SHORT: u32 = 5;
pub const PENALTY_TITLE_LONG: u32 = 5;
pub const PENALTY_NO_DESCRIPTION: u32 = 10;
pub const PENALTY_DESCRIPTION_SHORT: u32 = 5;
pub const PENALTY_DESCRIPTION_LONG: u32 = 5;
pub const PENALTY_NO_H1: u32 = 10;
pub const PENALTY_MULTIPLE_H1: u32 = 5;
pub const PENALTY_PER_IMAGE_WITHOUT_ALT: u32 = 2;
pub const MAX_ALT_PENALTY: u32 = 10;
pub const PENALTY_NO_CANONICAL: u32 = 5;
pub const PENALTY_NO_OPEN_GRAPH: u32 = 5;

const TITLE_MIN_CHARS: usize = 30;
const TITLE_MAX_CHARS: usize = 60;
const DESCRIPTION_MIN_CHARS: usize = 120;
const DESCRIPTION_MAX_CHARS: usize = 160;

pub fn evaluate(page_html: &str) -> ProbeOutcome {
    let mut card = ScoreCard::new();

    let title = html::title(page_html);
    match &title {
        None => card.penalize(PENALTY_NO_TITLE, "Missing page title"),
        Some(t) => {
            let len = t.chars().count();
            if len < TITLE_MIN_CHARS {
                card.penalize(
                    PENALTY_TITLE_SHORT,
                    format!("Title too short ({} characters)", len),
                );
            } else if len > TITLE_MAX_CHARS {
                card.penalize(
                    PENALTY_TITLE_LONG,
                    format!("Title too long ({} characters)", len),
                );
            }
        }
    }

    let description = html::meta_content(page_html, "description");
    match &description {
        None => card.penalize(PENALTY_NO_DESCRIPTION, "Missing meta description"),
        Some(d) => {
            let len = d.chars().count();
            if len < DESCRIPTION_MIN_CHARS {
                card.penalize(
                    PENALTY_DESCRIPTION_SHORT,
                    format!("Meta description too short ({} characters)", len),
                );
            } else if len > DESCRIPTION_MAX_CHARS {
                card.penalize(
                    PENALTY_DESCRIPTION_LONG,
                    format!("Meta description too long ({} characters)", len),
                );
            }
        }
    }

    let h1_count = html::heading_counts(page_html)[0];
    if h1_count == 0 {
        card.penalize(PENALTY_NO_H1, "Missing H1 heading");
    } else if h1_count > 1 {
        card.penalize(
            PENALTY_MULTIPLE_H1,
            format!("Multiple H1 headings ({})", h1_count),
        );
    }

    let (image_count, images_without_alt) = html::image_alt_stats(page_html);
    if images_without_alt > 0 {
        let penalty =
            (images_without_alt as u32 * PENALTY_PER_IMAGE_WITHOUT_ALT).min(MAX_ALT_PENALTY);
        card.penalize(
            penalty,
            format!("{} images missing alt text", images_without_alt),
        );
    }

    let canonical = html::canonical(page_html);
    if canonical.is_none() {
        card.penalize(PENALTY_NO_CANONICAL, "Missing canonical URL");
    }

    let has_open_graph = html::meta_content(page_html, "og:title").is_some()
        || html::meta_content(page_html, "og:description").is_some();
    if !has_open_graph {
        card.penalize(PENALTY_NO_OPEN_GRAPH, "Missing Open Graph tags");
    }

    card.detail("title", title);
    card.detail("meta_description", description);
    card.detail("h1_count", h1_count);
    card.detail("image_count", image_count);
    card.detail("images_without_alt", images_without_alt);
    card.detail("canonical", canonical);
    card.detail("open_graph", has_open_graph);
    card.finish()
}

pub async fn run(fetcher: &PageFetcher, url: &Url) -> Result<ProbeOutcome, ProbeError> {
    let page = fetcher.get(url).await?;
    Ok(evaluate(&page.body))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_PAGE: &str = r#"<html><head>
<title>Acme Anvils - Drop-Forged Anvils for Workshops</title>
<meta name="description" content="Acme makes drop-forged steel anvils for hobbyists and professional smiths, with free shipping, a lifetime warranty and a 60-day trial.">
<meta property="og:title" content="Acme Anvils">
<link rel="canonical" href="https://acme.test/">
</head><body><h1>Anvils</h1><img src="/a.png" alt="anvil"></body></html>"#;

    #[test]
    fn test_well_formed_page_scores_100() {
        let outcome = evaluate(GOOD_PAGE);
        assert_eq!(outcome.score, 100, "issues: {:?}", outcome.issues);
        assert_eq!(outcome.details["h1_count"], 1);
        assert_eq!(outcome.details["canonical"], "https://acme.test/");
    }

    #[test]
    fn test_empty_page() {
        let outcome = evaluate("<html><body></body></html>");
        // title 15 + description 10 + h1 10 + canonical 5 + og 5
        assert_eq!(outcome.score, 55);
        assert!(outcome.issues.contains(&"Missing page title".to_string()));
        assert!(outcome.issues.contains(&"Missing meta description".to_string()));
        assert!(outcome.details["title"].is_null());
    }

    #[test]
    fn test_short_title_and_multiple_h1() {
        let page = GOOD_PAGE
            .replace(
                "Acme Anvils - Drop-Forged Anvils for Workshops",
                "Acme",
            )
            .replace("<h1>Anvils</h1>", "<h1>A</h1><h1>B</h1>");
        let outcome = evaluate(&page);
        assert_eq!(outcome.score, 90);
        assert!(outcome.issues.contains(&"Title too short (4 characters)".to_string()));
        assert!(outcome.issues.contains(&"Multiple H1 headings (2)".to_string()));
    }

    #[test]
    fn test_alt_penalty_is_capped() {
        let images = "<img src=x>".repeat(9);
        let page = GOOD_PAGE.replace("</body>", &format!("{}</body>", images));
        let outcome = evaluate(&page);
        assert_eq!(outcome.score, 90);
        assert_eq!(outcome.issues, vec!["9 images missing alt text"]);
    }
}
