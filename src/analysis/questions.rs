//! Research question generation.
//!
//! Asks the LLM for questions a buyer might put to an AI assistant about
//! the product's market, plus the competitors such answers would name.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::GenerationError;
use crate::models::{ProductProfile, QuestionCategory, QuestionOrigin, TestQuestion};
use crate::oracle::{LlmClient, ParseStrategy};

/// Default number of questions requested.
pub const DEFAULT_QUESTION_COUNT: usize = 10;

const GENERATOR_SYSTEM_PROMPT: &str = r#"You write realistic questions that people ask AI assistants before buying software or services.
Respond with a single JSON object and nothing else:
{"questions": [{"question": "...", "category": "recommendation|comparison|how_to|best_of|problem_solution|features|pricing|reviews"}], "competitors": ["name", ...]}
Questions must not name the product itself."#;

/// Questions and competitor names proposed by the LLM.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedQuestions {
    pub questions: Vec<TestQuestion>,
    pub competitors: Vec<String>,
}

/// Generates test questions with an LLM.
pub struct QuestionGenerator<C> {
    client: C,
}

impl<C: LlmClient> QuestionGenerator<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Requests `count` questions; fails only when none can be extracted.
    pub async fn generate(
        &self,
        product: &ProductProfile,
        count: usize,
    ) -> Result<GeneratedQuestions, GenerationError> {
        info!(
            "Generating {} questions for {} with {}",
            count,
            product.name,
            self.client.model_name()
        );

        let response = self
            .client
            .complete(GENERATOR_SYSTEM_PROMPT, &generation_prompt(product, count))
            .await?;

        let generated = parse_generated(&response, count);
        if generated.questions.is_empty() {
            warn!("No questions found in LLM response");
            debug!("Response was: {}", response);
            return Err(GenerationError::NoQuestions);
        }

        info!(
            "Generated {} questions and {} competitor names",
            generated.questions.len(),
            generated.competitors.len()
        );
        Ok(generated)
    }
}

fn generation_prompt(product: &ProductProfile, count: usize) -> String {
    let mut prompt = format!(
        "Write {} questions a potential customer might ask an AI assistant where a good answer could recommend {} ({}).\n",
        count, product.name, product.website
    );
    if let Some(description) = &product.description {
        prompt.push_str(&format!("What it does: {}\n", description));
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
    prompt.push_str("Mix the categories and list up to 5 competitors.");
    prompt
}

/// Parses a generation response, dropping blank and repeated questions.
pub fn parse_generated(text: &str, count: usize) -> GeneratedQuestions {
    let Some(value) = question_payload(text) else {
        return GeneratedQuestions::default();
    };

    let (items, competitors): (Vec<&Value>, Vec<String>) = match &value {
        Value::Array(items) => (items.iter().collect(), Vec::new()),
        Value::Object(map) if is_single_question(map) => (vec![&value], Vec::new()),
        Value::Object(map) => (
            map.get("questions")
                .and_then(Value::as_array)
                .map(|items| items.iter().collect())
                .unwrap_or_default(),
            string_list(map.get("competitors")),
        ),
        _ => (Vec::new(), Vec::new()),
    };

    let mut questions: Vec<TestQuestion> = Vec::new();
    for item in items {
        let Some(question) = question_from_value(item) else {
            continue;
        };
        let duplicate = questions
            .iter()
            .any(|q| q.text.eq_ignore_ascii_case(&question.text));
        if !duplicate {
            questions.push(question);
        }
        if questions.len() >= count {
            break;
        }
    }

    GeneratedQuestions {
        questions,
        competitors,
    }
}

/// First JSON candidate that holds a question list. A lone question object
/// is only used when no list is found, since a bare array mixing strings
/// and objects also contains a `{...}` span.
fn question_payload(text: &str) -> Option<Value> {
    let mut single = None;
    for strategy in ParseStrategy::ORDER {
        let Some(value) = strategy
            .candidate(text)
            .and_then(|candidate| serde_json::from_str::<Value>(candidate).ok())
        else {
            continue;
        };

        let (list, lone) = match &value {
            Value::Array(_) => (true, false),
            Value::Object(map) => (map.contains_key("questions"), is_single_question(map)),
            _ => (false, false),
        };
        if list {
            return Some(value);
        }
        if lone && single.is_none() {
            single = Some(value);
        }
    }
    single
}

fn is_single_question(map: &serde_json::Map<String, Value>) -> bool {
    map.contains_key("question") || map.contains_key("text")
}

fn question_from_value(value: &Value) -> Option<TestQuestion> {
    let (text, category) = match value {
        Value::String(text) => (text.as_str(), QuestionCategory::default()),
        Value::Object(map) => {
            let text = map
                .get("question")
                .or_else(|| map.get("text"))
                .and_then(Value::as_str)?;
            let category = map
                .get("category")
                .and_then(Value::as_str)
                .map(QuestionCategory::from)
                .unwrap_or_default();
            (text, category)
        }
        _ => return None,
    };

    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(TestQuestion::new(text, category, QuestionOrigin::Auto))
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
