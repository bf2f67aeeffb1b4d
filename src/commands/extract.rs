use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use docquiz::extract::{self, ExtractOptions, Format};

/// Print the normalized text of a document
pub async fn run(path: &Path, media_type: Option<&str>) -> Result<()> {
    let filename = path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_default();
    let format = Format::classify(media_type.unwrap_or(extract::OCTET_STREAM_MIME), &filename);

    let text = extract::extract_file(path, media_type, ExtractOptions::default())
        .await
        .with_context(|| format!("Could not extract text from {}", path.display()))?;

    eprintln!(
        "{} {} {} {} chars",
        "Type:".dimmed(),
        format.to_string().cyan(),
        "Length:".dimmed(),
        text.chars().count()
    );
    println!("{}", text);

    Ok(())
}
