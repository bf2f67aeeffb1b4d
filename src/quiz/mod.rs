//! Quiz generation from extracted document text.

pub mod parse;
pub mod prompt;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::llm::JsonCompletion;

pub const MIN_QUESTIONS: u32 = 1;
pub const MAX_QUESTIONS: u32 = 20;
pub const DEFAULT_QUESTIONS: u32 = 5;

/// Requested difficulty; `Mixed` spreads questions across the three levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    #[default]
    Mixed,
}

impl Difficulty {
    /// Lenient parse used for form input; anything unknown becomes `Mixed`
    pub fn parse_or_mixed(raw: &str) -> Self {
        Self::parse_level(raw).unwrap_or(Difficulty::Mixed)
    }

    /// Parse a single question's level (`easy`, `medium` or `hard`)
    pub fn parse_level(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Mixed => "mixed",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    /// Multiple choice, four options each
    #[default]
    Mcq,
    /// Short free-text answers
    Short,
}

impl QuizMode {
    /// `short` selects short-answer mode; anything else is multiple choice
    pub fn parse_or_mcq(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("short") {
            QuizMode::Short
        } else {
            QuizMode::Mcq
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuizMode::Mcq => "mcq",
            QuizMode::Short => "short",
        }
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of quiz to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizOptions {
    pub question_count: u32,
    pub difficulty: Difficulty,
    pub mode: QuizMode,
}

impl Default for QuizOptions {
    fn default() -> Self {
        Self {
            question_count: DEFAULT_QUESTIONS,
            difficulty: Difficulty::Mixed,
            mode: QuizMode::Mcq,
        }
    }
}

impl QuizOptions {
    pub fn new(question_count: u32, difficulty: Difficulty, mode: QuizMode) -> Self {
        Self {
            question_count: question_count.clamp(MIN_QUESTIONS, MAX_QUESTIONS),
            difficulty,
            mode,
        }
    }

    /// Build options from raw form fields, falling back to defaults for
    /// anything missing or unparseable
    pub fn from_form(count: Option<&str>, difficulty: Option<&str>, mode: Option<&str>) -> Self {
        let question_count = count
            .and_then(leading_integer)
            .filter(|c| *c != 0)
            .map(|c| c.clamp(i64::from(MIN_QUESTIONS), i64::from(MAX_QUESTIONS)) as u32)
            .unwrap_or(DEFAULT_QUESTIONS);

        Self {
            question_count,
            difficulty: difficulty.map(Difficulty::parse_or_mixed).unwrap_or_default(),
            mode: mode.map(QuizMode::parse_or_mcq).unwrap_or_default(),
        }
    }
}

/// Integer at the start of `raw` after leading whitespace, ignoring anything
/// after it: `"3abc"` is 3 and `"2.7"` is 2. Out-of-range values saturate.
fn leading_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let (negative, rest) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };

    let digits: Vec<i64> = rest
        .chars()
        .map_while(|c| c.to_digit(10))
        .map(i64::from)
        .collect();
    if digits.is_empty() {
        return None;
    }

    let magnitude = digits
        .iter()
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(*d));
    Some(if negative { -magnitude } else { magnitude })
}

/// One generated question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizItem {
    pub question: String,
    /// Exactly four entries for multiple choice, empty for short answer
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub items: Vec<QuizItem>,
    pub mode: QuizMode,
}

impl Quiz {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Ask the model for a quiz over `text` and parse its reply
pub async fn generate(
    model: &dyn JsonCompletion,
    text: &str,
    options: &QuizOptions,
) -> Result<Quiz> {
    let prompt = prompt::build_prompt(text, options);
    let (schema_name, schema) = prompt::response_schema(options.mode);

    tracing::info!(
        questions = options.question_count,
        difficulty = %options.difficulty,
        mode = %options.mode,
        prompt_chars = prompt.chars().count(),
        "Requesting quiz"
    );

    let reply = model
        .complete_json(&prompt, schema_name, &schema)
        .await
        .context("Quiz generation request failed")?;

    let items = parse::parse_quiz(&reply, options.mode)?;

    tracing::info!(items = items.len(), "Quiz generated");

    Ok(Quiz {
        items,
        mode: options.mode,
    })
}
