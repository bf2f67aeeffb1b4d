use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::Colorize;
use std::io;
use std::path::{Path, PathBuf};

use docquiz::config::Config;
use docquiz::observability::{self, CLI_FILTER, SERVER_FILTER};
use docquiz::quiz::{DEFAULT_QUESTIONS, Difficulty, QuizMode, QuizOptions};

mod commands;

const BANNER: &str = r#"
  ____             ___        _
 |  _ \  ___   ___/ _ \ _   _(_)____
 | | | |/ _ \ / __| | | | | | | |_  /
 | |_| | (_) | (__| |_| | |_| | |/ /
 |____/ \___/ \___|\__\_\\__,_|_/___|
"#;

#[derive(Parser)]
#[command(name = "docquiz")]
#[command(about = "Generate quizzes from PDF, DOCX, PPTX and TXT documents with LLM assistance")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the text extracted from a document
    Extract {
        /// Document to read
        file: PathBuf,
        /// Declared media type (defaults to detection by extension)
        #[arg(long)]
        media_type: Option<String>,
    },
    /// Generate a quiz from a document
    Generate {
        /// Document to build the quiz from
        file: PathBuf,
        /// Number of questions (1-20)
        #[arg(short = 'n', long, default_value_t = DEFAULT_QUESTIONS)]
        count: u32,
        /// Question difficulty
        #[arg(short, long, value_enum, default_value_t = Difficulty::Mixed)]
        difficulty: Difficulty,
        /// Question type
        #[arg(short, long, value_enum, default_value_t = QuizMode::Mcq)]
        mode: QuizMode,
        /// Declared media type (defaults to detection by extension)
        #[arg(long)]
        media_type: Option<String>,
        /// Write the quiz to an Excel workbook
        #[arg(long)]
        xlsx: Option<PathBuf>,
        /// Write the quiz to a Word document
        #[arg(long)]
        docx: Option<PathBuf>,
    },
    /// Run the HTTP upload endpoint
    Serve {
        /// Port to listen on (defaults to config, then $PORT, then 5000)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Configure settings (API key, model, endpoint)
    Config,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.command {
        Some(Commands::Serve { .. }) => SERVER_FILTER,
        _ => CLI_FILTER,
    };
    observability::init_tracing(filter);

    match cli.command {
        Some(Commands::Extract { file, media_type }) => {
            commands::extract::run(&file, media_type.as_deref()).await?;
        }
        Some(Commands::Generate {
            file,
            count,
            difficulty,
            mode,
            media_type,
            xlsx,
            docx,
        }) => {
            commands::generate::run(
                &file,
                media_type.as_deref(),
                QuizOptions::new(count, difficulty, mode),
                commands::generate::ExportTargets { xlsx, docx },
            )
            .await?;
        }
        Some(Commands::Serve { port }) => {
            commands::serve::run(port).await?;
        }
        Some(Commands::Config) => {
            commands::config::run().await?;
        }
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
        None => run_interactive().await?,
    }

    Ok(())
}

/// Menu shown when no subcommand is given
async fn run_interactive() -> Result<()> {
    let config = Config::load().unwrap_or_default();

    println!("{}", BANNER.cyan().bold());
    println!(
        "  v{}  {}  {}\n",
        env!("CARGO_PKG_VERSION"),
        "·".dimmed(),
        config.api_url().dimmed()
    );
    if !config.has_api_key() {
        println!(
            "  {} no API key yet, choose {} first\n",
            "!".yellow().bold(),
            "Settings".cyan()
        );
    }

    let actions = vec![
        "📝  Quiz     │ Generate a quiz from a document",
        "📄  Text     │ Show what gets extracted from a document",
        "⚙️   Settings │ API key, model and endpoint",
        "🚪  Quit",
    ];
    let action = inquire::Select::new("DocQuiz", actions).prompt()?;
    println!();

    if action.contains("Quiz") {
        commands::generate::interactive().await?;
    } else if action.contains("Text") {
        let path = inquire::Text::new("Document path:").prompt()?;
        commands::extract::run(Path::new(path.trim()), None).await?;
    } else if action.contains("Settings") {
        commands::config::run().await?;
    }

    Ok(())
}
