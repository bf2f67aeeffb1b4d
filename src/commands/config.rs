use anyhow::Result;
use colored::Colorize;
use inquire::{InquireError, Password, Select, Text};

use docquiz::config::Config;
use docquiz::llm::LlmClient;
use docquiz::llm::client::DEFAULT_MODEL;

/// Settings menu; loops until the user backs out
pub async fn run() -> Result<()> {
    let mut config = Config::load()?;

    println!("\n{}", "DocQuiz settings".bold());
    if let Ok(path) = Config::config_path() {
        println!("{}\n", path.display().to_string().dimmed());
    }

    let menu = vec![
        "🔑  API key      │ Key sent as a bearer token",
        "🤖  Model        │ Model used for quiz generation",
        "🌐  Endpoint     │ Any OpenAI-compatible chat-completions URL",
        "📋  Show         │ Print the current settings",
        "←   Done",
    ];

    while let Some(choice) = pick(&menu)? {
        let outcome = if choice.contains("API key") {
            set_api_key(&mut config)
        } else if choice.contains("Model") {
            select_model(&mut config)
        } else if choice.contains("Endpoint") {
            set_endpoint(&mut config)
        } else if choice.contains("Show") {
            view_config(&config);
            Ok(())
        } else {
            break;
        };

        if let Err(e) = outcome {
            eprintln!("{} {:#}", "Error:".red(), e);
        }
        println!();
    }

    Ok(())
}

/// `None` when the prompt is cancelled with Esc or Ctrl-C
fn pick<'a>(menu: &[&'a str]) -> Result<Option<&'a str>> {
    match Select::new("Change which setting?", menu.to_vec()).prompt() {
        Ok(choice) => Ok(Some(choice)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn set_api_key(config: &mut Config) -> Result<()> {
    println!(
        "\n{} Get a Groq API key from {}",
        "Tip:".yellow(),
        "https://console.groq.com/keys".cyan()
    );

    let key = Password::new("Enter your API key:")
        .without_confirmation()
        .prompt()?;

    if key.is_empty() {
        println!("{}", "Cancelled.".dimmed());
        return Ok(());
    }

    config.api_key = Some(key);
    config.save()?;

    println!("{} API key saved!", "✓".green());

    Ok(())
}

fn select_model(config: &mut Config) -> Result<()> {
    let mut model_options: Vec<String> = LlmClient::MODELS
        .iter()
        .map(|(id, desc)| format!("{} - {}", id, desc))
        .collect();
    model_options.push("Other - Enter a model id".to_string());

    let selection = Select::new("Select default model:", model_options).prompt()?;

    let model_id = if selection.starts_with("Other") {
        Text::new("Model id:").prompt()?
    } else {
        selection
            .split(" - ")
            .next()
            .unwrap_or(DEFAULT_MODEL)
            .to_string()
    };

    config.default_model = Some(model_id.clone());
    config.save()?;

    println!("{} Default model set to {}", "✓".green(), model_id.yellow());

    Ok(())
}

fn set_endpoint(config: &mut Config) -> Result<()> {
    let url = Text::new("Chat completions URL:")
        .with_default(&config.api_url())
        .prompt()?;

    config.api_url = Some(url.trim().to_string()).filter(|u| !u.is_empty());
    config.save()?;

    println!("{} Endpoint set to {}", "✓".green(), config.api_url().yellow());

    Ok(())
}

fn view_config(config: &Config) {
    let key = match (&config.api_key, config.has_api_key()) {
        (Some(k), _) if !k.is_empty() => "stored in config file".green(),
        (_, true) => "from environment".yellow(),
        _ => "missing".red(),
    };
    let model = config.default_model.as_deref().unwrap_or(DEFAULT_MODEL);

    println!();
    println!("  {:<10} {}", "API key".dimmed(), key);
    println!("  {:<10} {}", "Model".dimmed(), model.cyan());
    println!("  {:<10} {}", "Endpoint".dimmed(), config.api_url().cyan());
    println!("  {:<10} {}", "Port".dimmed(), config.port().to_string().cyan());
}
