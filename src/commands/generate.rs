use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Select, Text};
use std::path::{Path, PathBuf};

use docquiz::config::Config;
use docquiz::export;
use docquiz::extract::{self, ExtractOptions};
use docquiz::llm::LlmClient;
use docquiz::quiz::{self, Difficulty, QuizMode, QuizOptions};
use docquiz::render;

/// Where to write exports, if anywhere
#[derive(Debug, Default)]
pub struct ExportTargets {
    pub xlsx: Option<PathBuf>,
    pub docx: Option<PathBuf>,
}

/// Create a spinner for indeterminate progress
fn create_spinner(message: &str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")?,
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    Ok(spinner)
}

/// Extract a document, generate a quiz from it, show it and write any exports
pub async fn run(
    path: &Path,
    media_type: Option<&str>,
    options: QuizOptions,
    targets: ExportTargets,
) -> Result<()> {
    let config = Config::load()?;
    let api_key = match config.get_api_key() {
        Some(key) => key,
        None => {
            println!(
                "{} No API key configured. Run {} to set up.",
                "Error:".red().bold(),
                "docquiz config".cyan()
            );
            return Ok(());
        }
    };

    println!("\n{} {}", "Processing:".dimmed(), path.display());

    let spinner = create_spinner("Extracting text...")?;
    let text = extract::extract_file(path, media_type, ExtractOptions::default()).await;
    spinner.finish_and_clear();
    let text = text.with_context(|| format!("Could not extract text from {}", path.display()))?;

    println!(
        "{} {} chars extracted",
        "✓".green(),
        text.chars().count().to_string().cyan()
    );

    let client = LlmClient::new(api_key, Some(config.api_url()), config.default_model.clone());

    let spinner = create_spinner(&format!(
        "Generating {} {} questions ({})...",
        options.question_count, options.mode, options.difficulty
    ))?;
    let quiz = quiz::generate(&client, &text, &options).await;
    spinner.finish_and_clear();
    let quiz = quiz?;

    if quiz.is_empty() {
        println!("{} The model returned no questions.", "Error:".red());
        return Ok(());
    }

    println!("{}", "─".repeat(50).dimmed());
    render::render_markdown(&render::quiz_markdown(&quiz));
    println!("{}", "─".repeat(50).dimmed());

    if let Some(xlsx) = &targets.xlsx {
        export::save_xlsx(&quiz, xlsx)?;
        println!("{} Saved to {}", "✓".green(), xlsx.display().to_string().cyan());
    }
    if let Some(docx) = &targets.docx {
        export::save_docx(&quiz, docx)?;
        println!("{} Saved to {}", "✓".green(), docx.display().to_string().cyan());
    }

    Ok(())
}

/// Prompt for everything `run` needs, then run it
pub async fn interactive() -> Result<()> {
    let path = Text::new("Document path:")
        .with_help_message("PDF, DOCX, PPTX or TXT")
        .prompt()?;

    let count = inquire::CustomType::<u32>::new("Number of questions:")
        .with_default(quiz::DEFAULT_QUESTIONS)
        .with_help_message("1 to 20")
        .prompt()?;

    let mode = Select::new(
        "Question type:",
        vec![
            "📋  Multiple choice │ Four options each",
            "✏️   Short answer    │ One or two sentence answers",
        ],
    )
    .prompt()?;
    let mode = if mode.contains("Short") {
        QuizMode::Short
    } else {
        QuizMode::Mcq
    };

    let difficulty = Select::new("Difficulty:", vec!["mixed", "easy", "medium", "hard"]).prompt()?;
    let difficulty = Difficulty::parse_or_mixed(difficulty);

    let export_choice = Select::new(
        "Export the quiz?",
        vec![
            "📊  Excel + Word │ quiz.xlsx and quiz.docx",
            "📊  Excel only   │ quiz.xlsx",
            "📄  Word only    │ quiz.docx",
            "❌  Don't export",
        ],
    )
    .prompt()?;

    let targets = ExportTargets {
        xlsx: (export_choice.contains("Excel")).then(|| PathBuf::from("quiz.xlsx")),
        docx: (export_choice.contains("Word")).then(|| PathBuf::from("quiz.docx")),
    };

    run(
        Path::new(path.trim()),
        None,
        QuizOptions::new(count, difficulty, mode),
        targets,
    )
    .await
}
