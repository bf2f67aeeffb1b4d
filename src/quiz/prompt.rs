use serde_json::{Value, json};

use super::{QuizMode, QuizOptions};

/// Only this much of the document is sent to the model
pub const MAX_PROMPT_TEXT_CHARS: usize = 40_000;

/// First `max` characters of `text`, cut on a character boundary
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Schema name and JSON schema the reply must satisfy
pub fn response_schema(mode: QuizMode) -> (&'static str, Value) {
    let difficulty = json!({ "type": "string", "enum": ["easy", "medium", "hard"] });

    let (name, item) = match mode {
        QuizMode::Mcq => (
            "mcq_list",
            json!({
                "type": "object",
                "additionalProperties": false,
                "required": ["question", "options", "answer", "difficulty"],
                "properties": {
                    "question": { "type": "string" },
                    "options": {
                        "type": "array",
                        "items": { "type": "string" },
                        "minItems": 4,
                        "maxItems": 4
                    },
                    "answer": { "type": "string" },
                    "difficulty": difficulty
                }
            }),
        ),
        QuizMode::Short => (
            "shortqa_list",
            json!({
                "type": "object",
                "additionalProperties": false,
                "required": ["question", "answer", "difficulty"],
                "properties": {
                    "question": { "type": "string" },
                    "answer": { "type": "string" },
                    "difficulty": difficulty
                }
            }),
        ),
    };

    let schema = json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["quiz"],
        "properties": {
            "quiz": { "type": "array", "items": item }
        }
    });

    (name, schema)
}

pub fn build_prompt(text: &str, options: &QuizOptions) -> String {
    let text = truncate_chars(text, MAX_PROMPT_TEXT_CHARS);
    let count = options.question_count;
    let difficulty = options.difficulty;

    let (task, shape) = match options.mode {
        QuizMode::Mcq => (
            format!(
                "- From the provided text, create {count} multiple-choice questions (MCQs).\n\
                 - Each MCQ must have exactly 4 options and 1 correct answer that appears verbatim in the options."
            ),
            r#"{ "quiz": [ { "question": "...", "options": ["A","B","C","D"], "answer": "A", "difficulty": "easy|medium|hard" } ] }"#,
        ),
        QuizMode::Short => (
            format!(
                "- Read the PDF, PPTX, DOCX, or TXT content provided thoroughly.\n\
                 - From the provided text, create {count} short-answer questions (NOT MCQs).\n\
                 - Each question should have a concise answer (1-2 sentences)."
            ),
            r#"{ "quiz": [ { "question": "...", "answer": "...", "difficulty": "easy|medium|hard" } ] }"#,
        ),
    };

    format!(
        r#"You are an expert teaching assistant.

Task:
{task}
- Tag each question with difficulty: "easy", "medium", or "hard".
- Difficulty mode selected by user: "{difficulty}".
  - If "mixed": distribute evenly across all 3 levels.
  - If "easy" | "medium" | "hard": make all questions at that level.

Return ONLY valid JSON in this shape:
{shape}

Text:
"""{text}""""#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::Difficulty;

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_prompt_truncates_long_text() {
        let text = format!("{}TAIL", "x".repeat(MAX_PROMPT_TEXT_CHARS));
        let prompt = build_prompt(&text, &QuizOptions::default());
        assert!(!prompt.contains("TAIL"));
    }

    #[test]
    fn test_mcq_prompt_mentions_count_and_difficulty() {
        let options = QuizOptions::new(7, Difficulty::Hard, QuizMode::Mcq);
        let prompt = build_prompt("Mitochondria are the powerhouse of the cell.", &options);
        assert!(prompt.contains("create 7 multiple-choice questions"));
        assert!(prompt.contains(r#"Difficulty mode selected by user: "hard""#));
        assert!(prompt.contains("\"\"\"Mitochondria are the powerhouse of the cell.\"\"\""));
    }

    #[test]
    fn test_short_prompt_excludes_options() {
        let options = QuizOptions::new(3, Difficulty::Mixed, QuizMode::Short);
        let prompt = build_prompt("text", &options);
        assert!(prompt.contains("short-answer questions (NOT MCQs)"));
        assert!(!prompt.contains("\"options\""));
    }

    #[test]
    fn test_schemas_per_mode() {
        let (name, schema) = response_schema(QuizMode::Mcq);
        assert_eq!(name, "mcq_list");
        let item = &schema["properties"]["quiz"]["items"];
        assert_eq!(item["properties"]["options"]["minItems"], 4);
        assert_eq!(item["properties"]["options"]["maxItems"], 4);

        let (name, schema) = response_schema(QuizMode::Short);
        assert_eq!(name, "shortqa_list");
        let required = schema["properties"]["quiz"]["items"]["required"]
            .as_array()
            .unwrap();
        assert!(!required.iter().any(|r| *r == "options"));
    }
}
