//! Regex-based HTML queries.
//!
//! Good enough for the tag/attribute lookups the probes make; this is not
//! a conforming HTML parser.

use regex::Regex;
use reqwest::Url;
use std::collections::HashMap;
use std::sync::LazyLock;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").expect("valid regex"));
static META_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid regex"));
static LINK_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<link\b[^>]*>").expect("valid regex"));
static IMG_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("valid regex"));
static ANCHOR_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b[^>]*>").expect("valid regex"));
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<h([1-6])\b").expect("valid regex"));
static SCRIPT_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<script\b").expect("valid regex"));
static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p>").expect("valid regex"));
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("valid regex")
});
static INVISIBLE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?</script>|<style\b.*?</style>|<noscript\b.*?</noscript>|<!--.*?-->")
        .expect("valid regex")
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static INSECURE_RESOURCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<(?:img|script|iframe|link|source|video|audio|embed)\b[^>]*\b(?:src|href)\s*=\s*["']?http://"#,
    )
    .expect("valid regex")
});

/// Attribute map of a single tag; names are lower-cased.
pub fn attributes(tag: &str) -> HashMap<String, String> {
    // Skip the tag name so `<meta` isn't read as an attribute.
    let body = tag
        .trim_start_matches('<')
        .split_once(char::is_whitespace)
        .map_or("", |(_, rest)| rest);

    ATTR_RE
        .captures_iter(body)
        .filter_map(|cap| {
            let name = cap.get(1)?.as_str().to_lowercase();
            let value = cap
                .get(2)
                .or_else(|| cap.get(3))
                .or_else(|| cap.get(4))
                .map_or("", |m| m.as_str());
            Some((name, decode_entities(value.trim())))
        })
        .collect()
}

/// Text of the `<title>` element, if present and non-blank.
pub fn title(html: &str) -> Option<String> {
    TITLE_RE
        .captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| clean_text(m.as_str()))
        .filter(|t| !t.is_empty())
}

/// `content` of the first `<meta>` whose `name` or `property` matches.
pub fn meta_content(html: &str, key: &str) -> Option<String> {
    META_TAG_RE.find_iter(html).find_map(|m| {
        let attrs = attributes(m.as_str());
        let matches = attrs
            .get("name")
            .or_else(|| attrs.get("property"))
            .is_some_and(|v| v.eq_ignore_ascii_case(key));
        if matches {
            attrs.get("content").cloned().filter(|c| !c.is_empty())
        } else {
            None
        }
    })
}

/// `href` of `<link rel="canonical">`.
pub fn canonical(html: &str) -> Option<String> {
    LINK_TAG_RE.find_iter(html).find_map(|m| {
        let attrs = attributes(m.as_str());
        let is_canonical = attrs
            .get("rel")
            .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("canonical")));
        if is_canonical {
            attrs.get("href").cloned().filter(|h| !h.is_empty())
        } else {
            None
        }
    })
}

/// Count of `<h1>`..`<h6>` openings, indexed by level - 1.
pub fn heading_counts(html: &str) -> [usize; 6] {
    let mut counts = [0usize; 6];
    for cap in HEADING_RE.captures_iter(html) {
        if let Some(level) = cap.get(1).and_then(|m| m.as_str().parse::<usize>().ok()) {
            counts[level - 1] += 1;
        }
    }
    counts
}

pub fn script_count(html: &str) -> usize {
    SCRIPT_OPEN_RE.find_iter(html).count()
}

/// `(total images, images without alt text)`.
pub fn image_alt_stats(html: &str) -> (usize, usize) {
    let mut total = 0;
    let mut missing = 0;
    for m in IMG_TAG_RE.find_iter(html) {
        total += 1;
        let attrs = attributes(m.as_str());
        if attrs.get("alt").map_or(true, |alt| alt.is_empty()) {
            missing += 1;
        }
    }
    (total, missing)
}

/// Anchor targets split into internal and external absolute URLs.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LinkSet {
    pub internal: Vec<Url>,
    pub external: Vec<Url>,
}

/// Resolves every `<a href>` against `base` and classifies it by host.
pub fn links(html: &str, base: &Url) -> LinkSet {
    let mut set = LinkSet::default();
    for m in ANCHOR_TAG_RE.find_iter(html) {
        let attrs = attributes(m.as_str());
        let Some(href) = attrs.get("href") else {
            continue;
        };
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with("javascript:")
        {
            continue;
        }
        let Ok(mut resolved) = base.join(href) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        resolved.set_fragment(None);
        if resolved.host_str() == base.host_str() {
            set.internal.push(resolved);
        } else {
            set.external.push(resolved);
        }
    }
    set
}

/// Cleaned text of each `<p>` element, skipping empty ones.
pub fn paragraphs(html: &str) -> Vec<String> {
    PARAGRAPH_RE
        .captures_iter(html)
        .filter_map(|cap| cap.get(1).map(|m| clean_text(m.as_str())))
        .filter(|p| !p.is_empty())
        .collect()
}

/// Human-visible text: scripts, styles and comments removed, tags stripped.
pub fn visible_text(html: &str) -> String {
    let without_blocks = INVISIBLE_BLOCK_RE.replace_all(html, " ");
    clean_text(&without_blocks)
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .count()
}

/// Subresources loaded over plain HTTP.
pub fn insecure_resource_count(html: &str) -> usize {
    INSECURE_RESOURCE_RE.find_iter(html).count()
}

fn clean_text(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, " ");
    let decoded = decode_entities(&stripped);
    WHITESPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <title> Acme Anvils &amp; Tools </title>
  <meta charset="utf-8">
  <meta name="Description" content="Drop-forged anvils for every budget.">
  <meta property="og:title" content='Acme Anvils'>
  <meta name=viewport content="width=device-width, initial-scale=1">
  <link rel="stylesheet" href="http://cdn.acme.test/site.css">
  <link rel="canonical" href="https://acme.test/">
  <script src="/app.js"></script>
  <style>.hidden { display: none }</style>
</head>
<body>
  <h1>Anvils</h1>
  <h2>Why Acme</h2><h3>Steel</h3><h2>Pricing</h2>
  <img src="/a.png" alt="An anvil"><img src="/b.png"><img src="/c.png" alt="">
  <p>First <b>paragraph</b> here.</p>
  <p></p>
  <a href="/about">About</a>
  <a href="https://acme.test/contact#form">Contact</a>
  <a href="https://example.org/review">Review</a>
  <a href="mailto:hi@acme.test">Mail</a>
  <a href="#top">Top</a>
  <!-- hidden comment words -->
  <script>var tracking = "lots of words here";</script>
</body>
</html>"##;

    fn base() -> Url {
        Url::parse("https://acme.test/").unwrap()
    }

    #[test]
    fn test_title_is_cleaned() {
        assert_eq!(title(PAGE).as_deref(), Some("Acme Anvils & Tools"));
        assert_eq!(title("<html></html>"), None);
        assert_eq!(title("<title>  </title>"), None);
    }

    #[test]
    fn test_meta_content_by_name_or_property() {
        assert_eq!(
            meta_content(PAGE, "description").as_deref(),
            Some("Drop-forged anvils for every budget.")
        );
        assert_eq!(meta_content(PAGE, "og:title").as_deref(), Some("Acme Anvils"));
        assert!(meta_content(PAGE, "viewport").is_some());
        assert_eq!(meta_content(PAGE, "keywords"), None);
    }

    #[test]
    fn test_canonical() {
        assert_eq!(canonical(PAGE).as_deref(), Some("https://acme.test/"));
        assert_eq!(canonical("<link rel=\"icon\" href=\"/f.ico\">"), None);
    }

    #[test]
    fn test_heading_and_script_counts() {
        let counts = heading_counts(PAGE);
        assert_eq!(counts[0], 1);
        assert_eq!(counts[1], 2);
        assert_eq!(counts[2], 1);
        assert_eq!(script_count(PAGE), 2);
    }

    #[test]
    fn test_image_alt_stats() {
        assert_eq!(image_alt_stats(PAGE), (3, 2));
    }

    #[test]
    fn test_links_are_classified() {
        let set = links(PAGE, &base());
        let internal: Vec<&str> = set.internal.iter().map(Url::as_str).collect();
        assert_eq!(
            internal,
            vec!["https://acme.test/about", "https://acme.test/contact"]
        );
        assert_eq!(set.external.len(), 1);
        assert_eq!(set.external[0].host_str(), Some("example.org"));
    }

    #[test]
    fn test_paragraphs_skip_empty() {
        assert_eq!(paragraphs(PAGE), vec!["First paragraph here."]);
    }

    #[test]
    fn test_visible_text_excludes_scripts_and_comments() {
        let text = visible_text(PAGE);
        assert!(text.contains("First paragraph here."));
        assert!(!text.contains("tracking"));
        assert!(!text.contains("hidden comment"));
        assert!(!text.contains("display: none"));
    }

    #[test]
    fn test_word_count_ignores_punctuation() {
        assert_eq!(word_count("one two - three &"), 3);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn test_insecure_resources() {
        assert_eq!(insecure_resource_count(PAGE), 1);
        assert_eq!(
            insecure_resource_count(r#"<a href="http://plain.link/">x</a>"#),
            0
        );
    }

    #[test]
    fn test_attributes_parse_quote_styles() {
        let attrs = attributes(r#"<img SRC=/x.png alt='A "quoted" alt' data-id="7">"#);
        assert_eq!(attrs.get("src").map(String::as_str), Some("/x.png"));
        assert_eq!(attrs.get("alt").map(String::as_str), Some("A \"quoted\" alt"));
        assert_eq!(attrs.get("data-id").map(String::as_str), Some("7"));
    }
}
