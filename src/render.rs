use crate::export::OPTION_LABELS;
use crate::quiz::Quiz;

/// Render markdown text to the terminal using termimad
pub fn render_markdown(text: &str) {
    let skin = termimad::MadSkin::default();
    skin.print_text(text);
}

/// Markdown view of a quiz for terminal display
pub fn quiz_markdown(quiz: &Quiz) -> String {
    let mut md = format!("# Generated Quiz ({} questions)\n\n", quiz.len());

    for (idx, item) in quiz.items.iter().enumerate() {
        md.push_str(&format!("**{}.** {}", idx + 1, item.question));
        if let Some(difficulty) = item.difficulty {
            md.push_str(&format!(" *[{}]*", difficulty.as_str().to_uppercase()));
        }
        md.push('\n');

        for (label, option) in OPTION_LABELS.iter().zip(&item.options) {
            md.push_str(&format!("* **{label})** {option}\n"));
        }

        if let Some(answer) = &item.answer {
            md.push_str(&format!("\n> **Answer:** {answer}\n"));
        }
        md.push('\n');
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::sample;

    #[test]
    fn test_quiz_markdown() {
        let md = quiz_markdown(&sample::mcq());
        assert!(md.starts_with("# Generated Quiz (2 questions)"));
        assert!(md.contains("**1.** Which organelle makes ATP? *[EASY]*"));
        assert!(md.contains("* **D)** Golgi body"));
        assert!(md.contains("> **Answer:** Transport"));
    }
}
