//! Security probe: HTTPS, security headers and mixed content.

use reqwest::header::HeaderMap;
use reqwest::Url;

use super::{html, PageFetcher, ProbeOutcome, ScoreCard};
use crate::error::ProbeError;

pub const PENALTY_NO_HTTPS: u32 = 30;
pub const PENALTY_MIXED_CONTENT: u32 = 15;

/// Security headers checked, with the penalty for each missing one.
pub const SECURITY_HEADERS: [(&str, u32); 5] = [
    ("Strict-Transport-Security", 10),
    ("Content-Security-Policy", 10),
    ("X-Frame-Options", 5),
    ("X-Content-Type-Options", 5),
    ("Referrer-Policy", 5),
];

pub fn evaluate(https: bool, headers: &HeaderMap, page_html: &str) -> ProbeOutcome {
    let mut card = ScoreCard::new();

    if !https {
        card.penalize(PENALTY_NO_HTTPS, "Not using HTTPS");
    }

    let mut present = serde_json::Map::new();
    for (name, penalty) in SECURITY_HEADERS {
        let found = headers.contains_key(name);
        if !found {
            card.penalize(penalty, format!("Missing {} header", name));
        }
        present.insert(name.to_string(), found.into());
    }

    // Mixed content only exists on HTTPS pages.
    let insecure = if https {
        html::insecure_resource_count(page_html)
    } else {
        0
    };
    if insecure > 0 {
        card.penalize(
            PENALTY_MIXED_CONTENT,
            format!("Mixed content: {} insecure resources", insecure),
        );
    }

    card.detail("https", https);
    card.detail("security_headers", present);
    card.detail("insecure_resources", insecure);
    card.finish()
}

pub async fn run(fetcher: &PageFetcher, url: &Url) -> Result<ProbeOutcome, ProbeError> {
    let page = fetcher.get(url).await?;
    Ok(evaluate(page.is_https(), &page.headers, &page.body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderName, HeaderValue};

    fn all_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, _) in SECURITY_HEADERS {
            let name = HeaderName::from_bytes(name.as_bytes()).unwrap();
            headers.insert(name, HeaderValue::from_static("set"));
        }
        headers
    }

    #[test]
    fn test_hardened_site_scores_100() {
        let outcome = evaluate(true, &all_headers(), "<img src=\"https://cdn/x.png\">");
        assert_eq!(outcome.score, 100);
        assert_eq!(outcome.details["security_headers"]["X-Frame-Options"], true);
    }

    #[test]
    fn test_plain_http_without_headers() {
        let outcome = evaluate(false, &HeaderMap::new(), "<img src=\"http://cdn/x.png\">");
        // https 30 + headers 35; mixed content ignored on http
        assert_eq!(outcome.score, 35);
        assert_eq!(outcome.issues[0], "Not using HTTPS");
        assert_eq!(outcome.details["insecure_resources"], 0);
    }

    #[test]
    fn test_mixed_content_on_https() {
        let page = r#"<script src="http://cdn.test/a.js"></script><img src='http://cdn.test/b.png'>"#;
        let outcome = evaluate(true, &all_headers(), page);
        assert_eq!(outcome.score, 85);
        assert_eq!(outcome.issues, vec!["Mixed content: 2 insecure resources"]);
    }
}
