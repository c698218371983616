//! Analysis modules.
//!
//! Visibility scoring and question generation sit on top of the LLM
//! oracle; the health aggregator composes the website probes.

pub mod aggregator;
pub mod questions;
pub mod visibility;

pub use aggregator::HealthAggregator;
pub use questions::{QuestionGenerator, DEFAULT_QUESTION_COUNT};
pub use visibility::VisibilityScorer;
