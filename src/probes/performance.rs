//! Performance probe: load time, payload size, compression, caching and
//! script count.

use reqwest::header::{CACHE_CONTROL, CONTENT_ENCODING, EXPIRES};
use reqwest::Url;

use super::{html, PageFetcher, ProbeOutcome, ScoreCard};
use crate::error::ProbeError;

pub const PENALTY_VERY_SLOW_LOAD: u32 = 20;
pub const PENALTY_SLOW_LOAD: u32 = 10;
pub const PENALTY_VERY_LARGE_PAGE: u32 = 15;
pub const PENALTY_LARGE_PAGE: u32 = 5;
pub const PENALTY_NO_COMPRESSION: u32 = 10;
pub const PENALTY_NO_CACHE_HEADERS: u32 = 5;
pub const PENALTY_TOO_MANY_SCRIPTS: u32 = 10;

const VERY_SLOW_LOAD_MS: u64 = 3000;
const SLOW_LOAD_MS: u64 = 1500;
const VERY_LARGE_PAGE_BYTES: usize = 3 * 1024 * 1024;
const LARGE_PAGE_BYTES: usize = 1024 * 1024;
const MAX_SCRIPTS: usize = 15;

#[derive(Debug, Clone)]
pub struct PerformanceSignals {
    pub load_time_ms: u64,
    pub size_bytes: usize,
    /// `Content-Encoding` offered when compression was requested.
    pub compression: Option<String>,
    pub cache_headers: bool,
    pub script_count: usize,
}

pub fn evaluate(signals: &PerformanceSignals) -> ProbeOutcome {
    let mut card = ScoreCard::new();

    if signals.load_time_ms > VERY_SLOW_LOAD_MS {
        card.penalize(
            PENALTY_VERY_SLOW_LOAD,
            format!("Slow page load ({}ms)", signals.load_time_ms),
        );
    } else if signals.load_time_ms > SLOW_LOAD_MS {
        card.penalize(
            PENALTY_SLOW_LOAD,
            format!("Page load could be faster ({}ms)", signals.load_time_ms),
        );
    }

    let size_kb = signals.size_bytes / 1024;
    if signals.size_bytes > VERY_LARGE_PAGE_BYTES {
        card.penalize(
            PENALTY_VERY_LARGE_PAGE,
            format!("Large page size ({} KB)", size_kb),
        );
    } else if signals.size_bytes > LARGE_PAGE_BYTES {
        card.penalize(
            PENALTY_LARGE_PAGE,
            format!("Page size above 1 MB ({} KB)", size_kb),
        );
    }

    if signals.compression.is_none() {
        card.penalize(PENALTY_NO_COMPRESSION, "Compression not enabled");
    }
    if !signals.cache_headers {
        card.penalize(PENALTY_NO_CACHE_HEADERS, "Missing cache headers");
    }
    if signals.script_count > MAX_SCRIPTS {
        card.penalize(
            PENALTY_TOO_MANY_SCRIPTS,
            format!("Too many scripts ({})", signals.script_count),
        );
    }

    card.detail("load_time_ms", signals.load_time_ms);
    card.detail("page_size_kb", size_kb);
    card.detail("compression", signals.compression.clone());
    card.detail("cache_headers", signals.cache_headers);
    card.detail("script_count", signals.script_count);
    card.finish()
}

pub async fn run(fetcher: &PageFetcher, url: &Url) -> Result<ProbeOutcome, ProbeError> {
    let page = fetcher.get(url).await?;
    let compressed_headers = fetcher.compressed_headers(url).await?;

    let compression = compressed_headers
        .get(CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .filter(|enc| !enc.eq_ignore_ascii_case("identity"));

    let signals = PerformanceSignals {
        load_time_ms: page.elapsed.as_millis() as u64,
        size_bytes: page.size_bytes,
        compression,
        cache_headers: page.headers.contains_key(CACHE_CONTROL)
            || page.headers.contains_key(EXPIRES),
        script_count: html::script_count(&page.body),
    };

    Ok(evaluate(&signals))
}
