//! Website probes feeding the health check.
//!
//! Every probe starts at 100, subtracts a fixed penalty per detected issue
//! and reports `(score, issues, details)`. Probes share nothing but the
//! HTTP client, so they can run concurrently.

pub mod content;
pub mod fetch;
pub mod html;
pub mod metadata;
pub mod performance;
pub mod security;
pub mod technical;

pub use fetch::PageFetcher;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Result of one probe before it is labelled for the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub score: u8,
    pub issues: Vec<String>,
    pub details: BTreeMap<String, Value>,
}

/// Accumulates penalties while a probe inspects a page.
#[derive(Debug, Default)]
pub(crate) struct ScoreCard {
    penalty: u32,
    issues: Vec<String>,
    details: BTreeMap<String, Value>,
}

impl ScoreCard {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn penalize(&mut self, points: u32, issue: impl Into<String>) {
        self.penalty += points;
        self.issues.push(issue.into());
    }

    pub(crate) fn detail(&mut self, key: &str, value: impl Into<Value>) {
        self.details.insert(key.to_string(), value.into());
    }

    /// Final score, floored at 0.
    pub(crate) fn finish(self) -> ProbeOutcome {
        ProbeOutcome {
            score: 100u32.saturating_sub(self.penalty) as u8,
            issues: self.issues,
            details: self.details,
        }
    }
}
