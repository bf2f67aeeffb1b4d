use anyhow::{Context, Result};
use docx_rs::{AlignmentType, Docx, LineSpacing, Paragraph, Run};
use std::io::Cursor;

use super::{OPTION_LABELS, ensure_not_empty};
use crate::quiz::{Quiz, QuizItem};

const TITLE: &str = "Generated Quiz";

/// Render the quiz as a Word document: a centered title, then each question
/// with its difficulty tag, lettered options and answer line.
pub fn render(quiz: &Quiz) -> Result<Vec<u8>> {
    ensure_not_empty(quiz)?;

    let title = Paragraph::new()
        .add_run(Run::new().add_text(TITLE).bold().size(32))
        .align(AlignmentType::Center);

    let doc = quiz
        .items
        .iter()
        .enumerate()
        .flat_map(|(idx, item)| item_paragraphs(idx + 1, item))
        .fold(Docx::new().add_paragraph(title), |doc, p| doc.add_paragraph(p));

    let mut buf = Cursor::new(Vec::new());
    doc.build()
        .pack(&mut buf)
        .context("Failed to serialize quiz document")?;
    Ok(buf.into_inner())
}

fn item_paragraphs(number: usize, item: &QuizItem) -> Vec<Paragraph> {
    let mut question = Paragraph::new()
        .add_run(Run::new().add_text(format!("{number}. ")).bold())
        .add_run(Run::new().add_text(&item.question));
    if let Some(difficulty) = item.difficulty {
        question = question.add_run(
            Run::new()
                .add_text(format!("  [{}]", difficulty.as_str().to_uppercase()))
                .italic(),
        );
    }

    let mut paragraphs = vec![question.line_spacing(LineSpacing::new().before(240).after(120))];

    for (label, option) in OPTION_LABELS.iter().zip(&item.options) {
        paragraphs.push(
            Paragraph::new()
                .add_run(Run::new().add_text(format!("{label}) ")).bold())
                .add_run(Run::new().add_text(option))
                .line_spacing(LineSpacing::new().after(60)),
        );
    }

    if let Some(answer) = &item.answer {
        paragraphs.push(
            Paragraph::new()
                .add_run(Run::new().add_text("Answer: ").bold())
                .add_run(Run::new().add_text(answer))
                .line_spacing(LineSpacing::new().after(120)),
        );
    }

    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::sample;
    use crate::extract;

    #[test]
    fn test_document_text_layout() {
        let bytes = render(&sample::mcq()).unwrap();
        let text = extract::docx::extract(&bytes).unwrap();

        assert!(text.starts_with("Generated Quiz"));
        assert!(text.contains("1. Which organelle makes ATP?  [EASY]"));
        assert!(text.contains("B) Mitochondrion"));
        assert!(text.contains("Answer: Mitochondrion"));
        // No tag when the model gave no difficulty
        assert!(text.contains("2. What does the cell membrane regulate?\n"));
    }

    #[test]
    fn test_short_answer_document_has_no_options() {
        let bytes = render(&sample::short()).unwrap();
        let text = extract::docx::extract(&bytes).unwrap();

        assert!(text.contains("1. Define osmosis.  [MEDIUM]"));
        assert!(!text.contains("A) "));
        assert!(text.contains("Answer: Diffusion of water across a membrane."));
    }
}
