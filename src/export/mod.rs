//! Quiz exports for spreadsheets and word processors.

pub mod docx;
pub mod xlsx;

use anyhow::{Context, Result};
use std::path::Path;

use crate::quiz::Quiz;

pub const OPTION_LABELS: [&str; 4] = ["A", "B", "C", "D"];

fn ensure_not_empty(quiz: &Quiz) -> Result<()> {
    if quiz.is_empty() {
        anyhow::bail!("No quiz to export");
    }
    Ok(())
}

/// Write the quiz to an `.xlsx` workbook at `path`
pub fn save_xlsx(quiz: &Quiz, path: &Path) -> Result<()> {
    let bytes = xlsx::render(quiz)?;
    std::fs::write(path, bytes).with_context(|| format!("Failed to write workbook to {:?}", path))?;
    tracing::info!(path = %path.display(), items = quiz.len(), "Exported quiz workbook");
    Ok(())
}

/// Write the quiz to a `.docx` document at `path`
pub fn save_docx(quiz: &Quiz, path: &Path) -> Result<()> {
    let bytes = docx::render(quiz)?;
    std::fs::write(path, bytes).with_context(|| format!("Failed to write document to {:?}", path))?;
    tracing::info!(path = %path.display(), items = quiz.len(), "Exported quiz document");
    Ok(())
}

#[cfg(test)]
pub(crate) mod sample {
    use crate::quiz::{Difficulty, Quiz, QuizItem, QuizMode};

    pub fn mcq() -> Quiz {
        Quiz {
            mode: QuizMode::Mcq,
            items: vec![
                QuizItem {
                    question: "Which organelle makes ATP?".to_string(),
                    options: vec![
                        "Nucleus".to_string(),
                        "Mitochondrion".to_string(),
                        "Ribosome".to_string(),
                        "Golgi body".to_string(),
                    ],
                    answer: Some("Mitochondrion".to_string()),
                    difficulty: Some(Difficulty::Easy),
                },
                QuizItem {
                    question: "What does the cell membrane regulate?".to_string(),
                    options: vec![
                        "Transport".to_string(),
                        "Gravity".to_string(),
                        "Light".to_string(),
                        "Sound".to_string(),
                    ],
                    answer: Some("Transport".to_string()),
                    difficulty: None,
                },
            ],
        }
    }

    pub fn short() -> Quiz {
        Quiz {
            mode: QuizMode::Short,
            items: vec![QuizItem {
                question: "Define osmosis.".to_string(),
                options: Vec::new(),
                answer: Some("Diffusion of water across a membrane.".to_string()),
                difficulty: Some(Difficulty::Medium),
            }],
        }
    }
}
