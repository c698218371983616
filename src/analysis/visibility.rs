//! Visibility scoring.
//!
//! Asks an [`Oracle`] whether each simulated AI platform would mention the
//! product for each test question, then folds the judgments into
//! per-platform scores, a capped overall score and the display figures
//! shown next to it.

use chrono::{Days, NaiveDate, Utc};
use indicatif::ProgressBar;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::VisibilityConfig;
use crate::models::{
    AnalysisResult, CitationSource, CompetitorShare, PlatformResult, ProductProfile, TestQuestion,
    TrendPoint,
};
use crate::oracle::{Judgment, Oracle};

/// Questions evaluated per run.
pub const MAX_EVALUATED_QUESTIONS: usize = 10;
/// Pause between consecutive oracle calls.
pub const DEFAULT_CALL_DELAY_MS: u64 = 100;
/// A mention counts when confidence is strictly above this.
pub const MENTION_THRESHOLD: u8 = 50;
/// A counted mention is also a citation when confidence is strictly above this.
pub const CITATION_THRESHOLD: u8 = 70;
/// The overall score never exceeds this.
pub const OVERALL_SCORE_CAP: u8 = 95;
/// Display multiplier applied to the raw mention sum.
pub const MENTION_DISPLAY_MULTIPLIER: f64 = 15.0;
/// Display multiplier applied to the raw citation sum.
pub const CITATION_DISPLAY_MULTIPLIER: f64 = 6.5;

/// Number of points in the display trend.
pub const TREND_DAYS: usize = 7;
/// Citation source weights are shown on a 0-10 scale.
const CITATION_WEIGHT_SCALE: f64 = 5.0;
const MAX_CITATION_WEIGHT: f64 = 10.0;

/// Source of per-point noise for the display trend.
pub trait Jitter: Send + Sync {
    fn sample(&self) -> i32;
}

/// Uniform noise in `[-2, 2]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl Jitter for RandomJitter {
    fn sample(&self) -> i32 {
        rand::rng().random_range(-2..=2)
    }
}

/// No noise; makes the trend a straight ramp.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl Jitter for NoJitter {
    fn sample(&self) -> i32 {
        0
    }
}

/// Runs visibility analyses against an oracle.
pub struct VisibilityScorer<O> {
    oracle: O,
    config: VisibilityConfig,
    jitter: Box<dyn Jitter>,
    progress: Option<ProgressBar>,
}

impl<O: Oracle> VisibilityScorer<O> {
    pub fn new(oracle: O, config: VisibilityConfig) -> Self {
        Self {
            oracle,
            config,
            jitter: Box::new(RandomJitter),
            progress: None,
        }
    }

    pub fn with_jitter(mut self, jitter: impl Jitter + 'static) -> Self {
        self.jitter = Box::new(jitter);
        self
    }

    /// Ticks `progress` once per oracle call.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Scores the product against the first questions and updates each
    /// evaluated question's mention count and visibility score.
    ///
    /// Oracle failures never abort the run; they count as "not mentioned".
    pub async fn score(
        &self,
        product: &ProductProfile,
        questions: &mut [TestQuestion],
    ) -> AnalysisResult {
        let evaluated = questions.len().min(self.config.max_questions);
        let selected = &mut questions[..evaluated];
        let platforms = &self.config.platforms;

        info!(
            "Scoring {} questions across {} platforms",
            evaluated,
            platforms.len()
        );
        if let Some(pb) = &self.progress {
            pb.set_length((evaluated * platforms.len()) as u64);
        }

        let delay = Duration::from_millis(self.config.call_delay_ms);
        let mut per_question = vec![0u32; evaluated];
        let mut competitors = CompetitorTally::default();
        let mut platform_performance = Vec::with_capacity(platforms.len());
        let mut calls = 0usize;

        for platform in platforms {
            let mut mentions = 0u32;
            let mut citations = 0u32;

            for (i, question) in selected.iter().enumerate() {
                if calls > 0 && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                calls += 1;

                let prompt = judgment_prompt(product, &platform.name, &question.text);
                let judgment = match self.oracle.judge(&prompt).await {
                    Ok(judgment) => judgment,
                    Err(e) => {
                        warn!(
                            "Judgment failed for {} / \"{}\": {}",
                            platform.name, question.text, e
                        );
                        Judgment::not_mentioned()
                    }
                };
                debug!(
                    "{} / \"{}\": mentioned={} confidence={}",
                    platform.name, question.text, judgment.mentioned, judgment.confidence
                );

                if judgment.mentioned && judgment.confidence > self.config.mention_threshold {
                    mentions += 1;
                    per_question[i] += 1;
                    if judgment.confidence > self.config.citation_threshold {
                        citations += 1;
                    }
                }
                competitors.record(&judgment.competitors_mentioned, &product.name);

                if let Some(pb) = &self.progress {
                    pb.inc(1);
                }
            }

            platform_performance.push(PlatformResult {
                platform: platform.name.clone(),
                weight: platform.weight,
                mentions,
                citations,
                score: platform_score(mentions, evaluated, platform.weight),
            });
        }

        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }

        for (question, count) in selected.iter_mut().zip(&per_question) {
            question.mention_count = *count;
            question.visibility_score = percentage(*count, platforms.len());
        }

        let overall_score = overall_score(&platform_performance, self.config.score_cap);
        let mention_sum: u32 = platform_performance.iter().map(|p| p.mentions).sum();
        let citation_sum: u32 = platform_performance.iter().map(|p| p.citations).sum();

        info!(
            "Visibility score {}/100 ({} mentions, {} citations)",
            overall_score, mention_sum, citation_sum
        );

        AnalysisResult {
            analyzed_at: Utc::now(),
            overall_score,
            total_mentions: display_total(mention_sum, self.config.mention_multiplier),
            total_citations: display_total(citation_sum, self.config.citation_multiplier),
            questions_evaluated: evaluated,
            seo_health: None,
            broken_links: None,
            trend: build_trend(overall_score, Utc::now().date_naive(), self.jitter.as_ref()),
            citation_sources: citation_sources(&product.website, &platform_performance),
            competitor_breakdown: competitors.breakdown(&product.name, mention_sum),
            platform_performance,
        }
    }
}

/// Prompt asking whether `platform` would mention the product for `question`.
pub fn judgment_prompt(product: &ProductProfile, platform: &str, question: &str) -> String {
    let mut prompt = format!(
        "Product: {}\nWebsite: {}\n",
        product.name, product.website
    );
    if let Some(description) = &product.description {
        prompt.push_str(&format!("Description: {}\n", description));
    }
    if let Some(industry) = &product.industry {
        prompt.push_str(&format!("Industry: {}\n", industry));
    }
    if !product.competitors.is_empty() {
        prompt.push_str(&format!(
            "Known competitors: {}\n",
            product.competitors.join(", ")
        ));
    }
    prompt.push_str(&format!(
        "\nAssistant: {}\nUser question: {}\n\n\
         Would {}'s answer to this question mention {}? \
         List any competitors the answer would name instead or as well.",
        platform, question, platform, product.name
    ));
    prompt
}

/// `min(100, round(mentions / evaluated * 100 * weight))`, or 0 with nothing evaluated.
pub fn platform_score(mentions: u32, evaluated: usize, weight: f64) -> u8 {
    if evaluated == 0 {
        return 0;
    }
    let raw = f64::from(mentions) / evaluated as f64 * 100.0 * weight;
    raw.round().clamp(0.0, 100.0) as u8
}

/// Rounded mean of platform scores, capped.
pub fn overall_score(platforms: &[PlatformResult], cap: u8) -> u8 {
    if platforms.is_empty() {
        return 0;
    }
    let sum: u32 = platforms.iter().map(|p| u32::from(p.score)).sum();
    let mean = (f64::from(sum) / platforms.len() as f64).round() as u8;
    mean.min(cap)
}

fn percentage(count: u32, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (f64::from(count) / total as f64 * 100.0).round().clamp(0.0, 100.0) as u8
}

fn display_total(raw: u32, multiplier: f64) -> u32 {
    (f64::from(raw) * multiplier).round().max(0.0) as u32
}

/// Seven daily points ending at `today`, ramping up to the overall score.
pub fn build_trend(overall: u8, today: NaiveDate, jitter: &dyn Jitter) -> Vec<TrendPoint> {
    (0..TREND_DAYS)
        .map(|i| {
            let days_back = (TREND_DAYS - 1 - i) as u64;
            let date = today.checked_sub_days(Days::new(days_back)).unwrap_or(today);
            let score = i32::from(overall) - 10 + 2 * i as i32 + jitter.sample();
            TrendPoint {
                date,
                score: score.clamp(0, 100) as u8,
            }
        })
        .collect()
}

/// One source per platform that cited the product, heaviest first.
pub fn citation_sources(website: &str, platforms: &[PlatformResult]) -> Vec<CitationSource> {
    let mut sources: Vec<CitationSource> = platforms
        .iter()
        .filter(|p| p.citations > 0)
        .map(|p| CitationSource {
            url: website.to_string(),
            platform: p.platform.clone(),
            weight: ((p.weight * CITATION_WEIGHT_SCALE * 10.0).round() / 10.0)
                .min(MAX_CITATION_WEIGHT),
            mentions: p.citations,
        })
        .collect();
    sources.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    sources
}

/// Case-insensitive competitor counts, keeping first-seen spelling.
#[derive(Debug, Default)]
struct CompetitorTally {
    counts: Vec<(String, u32)>,
}

impl CompetitorTally {
    fn record(&mut self, names: &[String], product_name: &str) {
        for name in names {
            let name = name.trim();
            if name.is_empty() || name.eq_ignore_ascii_case(product_name) {
                continue;
            }
            match self
                .counts
                .iter_mut()
                .find(|(seen, _)| seen.eq_ignore_ascii_case(name))
            {
                Some((_, count)) => *count += 1,
                None => self.counts.push((name.to_string(), 1)),
            }
        }
    }

    /// Shares of all brand mentions, the product included, most mentioned first.
    fn breakdown(self, product_name: &str, product_mentions: u32) -> Vec<CompetitorShare> {
        let mut entries = self.counts;
        if product_mentions > 0 {
            entries.insert(0, (product_name.to_string(), product_mentions));
        }
        let total: u32 = entries.iter().map(|(_, n)| n).sum();
        if total == 0 {
            return Vec::new();
        }

        let mut shares: Vec<CompetitorShare> = entries
            .into_iter()
            .map(|(name, mentions)| CompetitorShare {
                share: (f64::from(mentions) / f64::from(total) * 1000.0).round() / 10.0,
                name,
                mentions,
            })
            .collect();
        shares.sort_by(|a, b| b.mentions.cmp(&a.mentions));
        shares
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OracleError;
    use crate::models::{QuestionCategory, QuestionOrigin};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Returns the same answer for every prompt.
    struct FixedOracle(Judgment);

    #[async_trait]
    impl Oracle for FixedOracle {
        async fn judge(&self, _prompt: &str) -> Result<Judgment, OracleError> {
            Ok(self.0.clone())
        }
    }

    struct FailingOracle;

    #[async_trait]
    impl Oracle for FailingOracle {
        async fn judge(&self, _prompt: &str) -> Result<Judgment, OracleError> {
            Err(OracleError::Decode("garbage".to_string()))
        }
    }

    /// Mentions the product only when the prompt names the given platform.
    struct PlatformOracle {
        platform: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Oracle for PlatformOracle {
        async fn judge(&self, prompt: &str) -> Result<Judgment, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if prompt.contains(&format!("Assistant: {}\n", self.platform)) {
                Ok(Judgment {
                    mentioned: true,
                    confidence: 65,
                    competitors_mentioned: vec!["Globex".to_string()],
                })
            } else {
                Ok(Judgment {
                    mentioned: false,
                    confidence: 90,
                    competitors_mentioned: vec!["globex".to_string(), "Initech".to_string()],
                })
            }
        }
    }

    /// Records when each call starts and whether two calls ever overlap.
    #[derive(Default)]
    struct TimedOracle {
        started: Mutex<Vec<Instant>>,
        in_flight: AtomicUsize,
        overlapped: AtomicBool,
    }

    const JUDGE_TIME: Duration = Duration::from_millis(5);

    #[async_trait]
    impl Oracle for TimedOracle {
        async fn judge(&self, _prompt: &str) -> Result<Judgment, OracleError> {
            if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            self.started.lock().unwrap().push(Instant::now());
            tokio::time::sleep(JUDGE_TIME).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Judgment::not_mentioned())
        }
    }

    fn product() -> ProductProfile {
        ProductProfile::new("Acme Anvils", "https://acme.test").unwrap()
    }

    fn questions(n: usize) -> Vec<TestQuestion> {
        (0..n)
            .map(|i| {
                TestQuestion::new(
                    &format!("What is the best anvil for project {}?", i),
                    QuestionCategory::BestOf,
                    QuestionOrigin::Auto,
                )
            })
            .collect()
    }

    fn config() -> VisibilityConfig {
        VisibilityConfig {
            call_delay_ms: 0,
            ..VisibilityConfig::default()
        }
    }

    fn scorer<O: Oracle>(oracle: O) -> VisibilityScorer<O> {
        VisibilityScorer::new(oracle, config()).with_jitter(NoJitter)
    }

    #[tokio::test]
    async fn test_always_mentioned_with_high_confidence() {
        let oracle = FixedOracle(Judgment {
            mentioned: true,
            confidence: 80,
            competitors_mentioned: Vec::new(),
        });
        let mut qs = questions(10);
        let result = scorer(oracle).score(&product(), &mut qs).await;

        let scores: Vec<u8> = result.platform_performance.iter().map(|p| p.score).collect();
        assert_eq!(scores, vec![100, 100, 100, 90]);
        assert!(result
            .platform_performance
            .iter()
            .all(|p| p.mentions == 10 && p.citations == 10));
        // mean 97.5 rounds to 98, then the cap applies
        assert_eq!(result.overall_score, 95);
        assert_eq!(result.total_mentions, 600);
        assert_eq!(result.total_citations, 260);
        assert_eq!(result.questions_evaluated, 10);
        assert!(qs.iter().all(|q| q.mention_count == 4 && q.visibility_score == 100));

        assert_eq!(result.citation_sources.len(), 4);
        assert_eq!(result.citation_sources[0].platform, "ChatGPT");
        assert_eq!(result.citation_sources[0].weight, 6.0);
        assert_eq!(result.citation_sources[3].platform, "Gemini");
        assert_eq!(result.citation_sources[3].weight, 4.5);
    }

    #[tokio::test]
    async fn test_failing_oracle_scores_zero() {
        let mut qs = questions(10);
        let result = scorer(FailingOracle).score(&product(), &mut qs).await;

        assert!(result.platform_performance.iter().all(|p| p.score == 0));
        assert_eq!(result.overall_score, 0);
        assert_eq!(result.total_mentions, 0);
        assert_eq!(result.total_citations, 0);
        assert!(result.citation_sources.is_empty());
        assert!(result.competitor_breakdown.is_empty());

        let trend: Vec<u8> = result.trend.iter().map(|p| p.score).collect();
        assert_eq!(trend, vec![0, 0, 0, 0, 0, 0, 2]);
    }

    #[tokio::test]
    async fn test_only_first_questions_are_evaluated() {
        let oracle = PlatformOracle {
            platform: "Claude",
            calls: AtomicUsize::new(0),
        };
        let mut qs = questions(14);
        let scorer = scorer(oracle);
        let result = scorer.score(&product(), &mut qs).await;

        assert_eq!(result.questions_evaluated, 10);
        assert_eq!(scorer.oracle.calls.load(Ordering::SeqCst), 40);
        assert!(qs[..10].iter().all(|q| q.mention_count == 1 && q.visibility_score == 25));
        assert!(qs[10..].iter().all(|q| q.mention_count == 0));
    }

    #[tokio::test]
    async fn test_mentions_without_citations() {
        let oracle = PlatformOracle {
            platform: "Claude",
            calls: AtomicUsize::new(0),
        };
        let mut qs = questions(4);
        let result = scorer(oracle).score(&product(), &mut qs).await;

        let claude = &result.platform_performance[1];
        assert_eq!(claude.platform, "Claude");
        assert_eq!((claude.mentions, claude.citations, claude.score), (4, 0, 100));
        assert_eq!(result.overall_score, 25);
        assert!(result.citation_sources.is_empty());

        // 4 product mentions, 16 Globex, 12 Initech; the first spelling seen
        // comes from ChatGPT, the first platform
        let names: Vec<&str> = result
            .competitor_breakdown
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["globex", "Initech", "Acme Anvils"]);
        assert_eq!(result.competitor_breakdown[0].mentions, 16);
        assert_eq!(result.competitor_breakdown[0].share, 50.0);
        assert_eq!(result.competitor_breakdown[2].share, 12.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_are_sequential_and_spaced_by_delay() {
        let delay = Duration::from_millis(DEFAULT_CALL_DELAY_MS);
        let config = VisibilityConfig {
            call_delay_ms: DEFAULT_CALL_DELAY_MS,
            ..VisibilityConfig::default()
        };
        let scorer = VisibilityScorer::new(TimedOracle::default(), config).with_jitter(NoJitter);
        let mut qs = questions(3);

        let start = Instant::now();
        scorer.score(&product(), &mut qs).await;
        let elapsed = start.elapsed();

        let started = scorer.oracle.started.lock().unwrap().clone();
        let calls = started.len() as u32;
        assert_eq!(calls, 12);
        // no pause before the first call
        assert_eq!(started[0], start);
        for pair in started.windows(2) {
            assert_eq!(pair[1] - pair[0], JUDGE_TIME + delay);
        }
        assert_eq!(elapsed, delay * (calls - 1) + JUDGE_TIME * calls);
        assert!(!scorer.oracle.overlapped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_confidence_at_threshold_is_not_a_mention() {
        let oracle = FixedOracle(Judgment {
            mentioned: true,
            confidence: MENTION_THRESHOLD,
            competitors_mentioned: Vec::new(),
        });
        let mut qs = questions(3);
        let result = scorer(oracle).score(&product(), &mut qs).await;
        assert_eq!(result.overall_score, 0);
    }

    #[tokio::test]
    async fn test_no_questions() {
        let oracle = FixedOracle(Judgment {
            mentioned: true,
            confidence: 99,
            competitors_mentioned: Vec::new(),
        });
        let result = scorer(oracle).score(&product(), &mut []).await;
        assert_eq!(result.questions_evaluated, 0);
        assert_eq!(result.overall_score, 0);
        assert_eq!(result.trend.len(), TREND_DAYS);
    }

    #[tokio::test]
    async fn test_scoring_is_deterministic_without_jitter() {
        let run = || async {
            let oracle = PlatformOracle {
                platform: "Perplexity",
                calls: AtomicUsize::new(0),
            };
            let mut qs = questions(6);
            scorer(oracle).score(&product(), &mut qs).await
        };
        let first = run().await;
        let second = run().await;
        assert_eq!(first.overall_score, second.overall_score);
        assert_eq!(first.platform_performance, second.platform_performance);
        assert_eq!(first.trend, second.trend);
        assert_eq!(first.competitor_breakdown, second.competitor_breakdown);
    }

    #[test]
    fn test_platform_score_bounds() {
        assert_eq!(platform_score(0, 0, 1.2), 0);
        assert_eq!(platform_score(10, 10, 1.2), 100);
        assert_eq!(platform_score(10, 10, 0.9), 90);
        assert_eq!(platform_score(1, 3, 1.0), 33);
        for mentions in 0..=10 {
            for weight in [0.5, 0.9, 1.0, 1.1, 1.2, 3.0] {
                assert!(platform_score(mentions, 10, weight) <= 100);
            }
        }
    }

    #[test]
    fn test_overall_score_is_capped() {
        let results: Vec<PlatformResult> = [100u8, 100, 100, 100]
            .iter()
            .map(|&score| PlatformResult {
                platform: "p".to_string(),
                weight: 1.0,
                mentions: 0,
                citations: 0,
                score,
            })
            .collect();
        assert_eq!(overall_score(&results, OVERALL_SCORE_CAP), 95);
        assert_eq!(overall_score(&results, 100), 100);
        assert_eq!(overall_score(&[], OVERALL_SCORE_CAP), 0);
    }

    #[test]
    fn test_trend_ramps_to_today() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let trend = build_trend(50, today, &NoJitter);

        let scores: Vec<u8> = trend.iter().map(|p| p.score).collect();
        assert_eq!(scores, vec![40, 42, 44, 46, 48, 50, 52]);
        assert_eq!(trend[0].date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(trend[6].date, today);
    }

    #[test]
    fn test_trend_clamps_with_jitter() {
        struct Fixed(i32);
        impl Jitter for Fixed {
            fn sample(&self) -> i32 {
                self.0
            }
        }
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(build_trend(0, today, &Fixed(-2)).iter().all(|p| p.score == 0));
        assert_eq!(build_trend(95, today, &Fixed(2))[6].score, 99);
        for _ in 0..20 {
            for p in build_trend(95, today, &RandomJitter) {
                assert!(p.score <= 100);
            }
        }
    }

    #[test]
    fn test_judgment_prompt_includes_context() {
        let mut product = product();
        product.description = Some("Drop-forged steel anvils".to_string());
        product.competitors = vec!["Globex".to_string()];

        let prompt = judgment_prompt(&product, "Gemini", "Which anvil should I buy?");
        assert!(prompt.contains("Product: Acme Anvils"));
        assert!(prompt.contains("Description: Drop-forged steel anvils"));
        assert!(prompt.contains("Known competitors: Globex"));
        assert!(prompt.contains("Assistant: Gemini\n"));
        assert!(prompt.contains("User question: Which anvil should I buy?"));
        assert!(!prompt.contains("Industry:"));
    }
}
