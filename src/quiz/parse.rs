use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use super::{Difficulty, QuizItem, QuizMode};

#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(default)]
    question: String,
    #[serde(default)]
    options: Vec<Value>,
    #[serde(default)]
    answer: Option<Value>,
    #[serde(default)]
    difficulty: Option<String>,
}

/// Parse a model reply of the form `{"quiz": [...]}` into quiz items.
///
/// The JSON may be wrapped in a markdown fence or surrounded by chatter. A
/// missing or non-array `quiz` field yields no items; items without a
/// question are dropped.
pub fn parse_quiz(reply: &str, mode: QuizMode) -> Result<Vec<QuizItem>> {
    let json = locate_json_object(reply).context("Model reply contained no JSON object")?;
    let value: Value = serde_json::from_str(json).context("Model reply was not valid JSON")?;

    let Some(entries) = value.get("quiz").and_then(Value::as_array) else {
        tracing::warn!("Model reply had no quiz array");
        return Ok(Vec::new());
    };

    let items = entries
        .iter()
        .filter_map(|entry| serde_json::from_value::<RawItem>(entry.clone()).ok())
        .filter(|raw| !raw.question.trim().is_empty())
        .map(|raw| into_item(raw, mode))
        .collect();

    Ok(items)
}

fn into_item(raw: RawItem, mode: QuizMode) -> QuizItem {
    let options = match mode {
        QuizMode::Mcq => raw.options.iter().map(value_to_text).collect(),
        QuizMode::Short => Vec::new(),
    };

    QuizItem {
        question: raw.question.trim().to_string(),
        options,
        answer: raw
            .answer
            .as_ref()
            .map(value_to_text)
            .filter(|a| !a.trim().is_empty()),
        difficulty: raw.difficulty.as_deref().and_then(Difficulty::parse_level),
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Slice from the first `{` to the last `}`
fn locate_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}
