//! Technical SEO probe: HTTPS, status, robots.txt, sitemap, response time
//! and viewport.

use reqwest::Url;
use tracing::debug;

use super::{html, PageFetcher, ProbeOutcome, ScoreCard};
use crate::error::ProbeError;

pub const PENALTY_NO_HTTPS: u32 = 20;
pub const PENALTY_BAD_STATUS: u32 = 25;
pub const PENALTY_NO_ROBOTS: u32 = 10;
pub const PENALTY_NO_SITEMAP: u32 = 10;
pub const PENALTY_VERY_SLOW_RESPONSE: u32 = 15;
pub const PENALTY_SLOW_RESPONSE: u32 = 5;
pub const PENALTY_NO_VIEWPORT: u32 = 10;

const VERY_SLOW_RESPONSE_MS: u64 = 3000;
const SLOW_RESPONSE_MS: u64 = 1000;

/// Everything the technical score depends on.
#[derive(Debug, Clone)]
pub struct TechnicalSignals {
    pub https: bool,
    pub status_code: u16,
    pub response_time_ms: u64,
    pub robots_txt: bool,
    pub sitemap: bool,
    pub viewport: bool,
}

pub fn evaluate(signals: &TechnicalSignals) -> ProbeOutcome {
    let mut card = ScoreCard::new();

    if !signals.https {
        card.penalize(PENALTY_NO_HTTPS, "Site is not served over HTTPS");
    }
    if !(200..300).contains(&signals.status_code) {
        card.penalize(
            PENALTY_BAD_STATUS,
            format!("Page returned HTTP status {}", signals.status_code),
        );
    }
    if !signals.robots_txt {
        card.penalize(PENALTY_NO_ROBOTS, "robots.txt not found");
    }
    if !signals.sitemap {
        card.penalize(PENALTY_NO_SITEMAP, "XML sitemap not found");
    }
    if signals.response_time_ms > VERY_SLOW_RESPONSE_MS {
        card.penalize(
            PENALTY_VERY_SLOW_RESPONSE,
            format!("Slow server response ({}ms)", signals.response_time_ms),
        );
    } else if signals.response_time_ms > SLOW_RESPONSE_MS {
        card.penalize(
            PENALTY_SLOW_RESPONSE,
            format!(
                "Server response could be faster ({}ms)",
                signals.response_time_ms
            ),
        );
    }
    if !signals.viewport {
        card.penalize(PENALTY_NO_VIEWPORT, "Missing viewport meta tag");
    }

    card.detail("https", signals.https);
    card.detail("status_code", signals.status_code);
    card.detail("response_time_ms", signals.response_time_ms);
    card.detail("robots_txt", signals.robots_txt);
    card.detail("sitemap", signals.sitemap);
    card.detail("viewport", signals.viewport);
    card.finish()
}

pub async fn run(fetcher: &PageFetcher, url: &Url) -> Result<ProbeOutcome, ProbeError> {
    let page = fetcher.get(url).await?;

    let robots = match url.join("/robots.txt") {
        Ok(robots_url) => fetcher
            .get(&robots_url)
            .await
            .ok()
            .filter(|p| p.status.is_success()),
        Err(_) => None,
    };
    let robots_lists_sitemap = robots
        .as_ref()
        .is_some_and(|r| r.body.to_lowercase().contains("sitemap:"));

    let sitemap = robots_lists_sitemap || {
        match url.join("/sitemap.xml") {
            Ok(sitemap_url) => fetcher
                .status_of(&sitemap_url)
                .await
                .is_ok_and(|s| s.is_success()),
            Err(_) => false,
        }
    };

    let signals = TechnicalSignals {
        https: page.is_https(),
        status_code: page.status.as_u16(),
        response_time_ms: page.elapsed.as_millis() as u64,
        robots_txt: robots.is_some(),
        sitemap,
        viewport: html::meta_content(&page.body, "viewport").is_some(),
    };
    debug!("Technical signals for {}: {:?}", url, signals);

    Ok(evaluate(&signals))
}
