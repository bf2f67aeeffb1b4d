use anyhow::{Context, Result};
use std::sync::Arc;

use docquiz::config::Config;
use docquiz::extract::ExtractOptions;
use docquiz::llm::LlmClient;
use docquiz::server::{self, AppState};

/// Start the HTTP upload endpoint
pub async fn run(port: Option<u16>) -> Result<()> {
    let config = Config::load()?;
    let api_key = config
        .get_api_key()
        .context("No API key configured. Run `docquiz config` or set GROQ_API_KEY.")?;

    let client = LlmClient::new(api_key, Some(config.api_url()), config.default_model.clone());
    tracing::info!(model = %client.model, "Using LLM model");

    let state = AppState {
        model: Arc::new(client),
        extract_options: ExtractOptions::default(),
    };

    server::serve(state, port.unwrap_or_else(|| config.port())).await
}
