use thiserror::Error;

use super::Format;

/// Errors produced while turning an uploaded document into text.
///
/// Every variant is terminal for the request: nothing is retried and no
/// partial text is handed back.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Neither the media type nor the filename pointed at a supported format
    #[error("Unsupported file type ({0}). Please upload PDF, DOCX, PPTX, or TXT.")]
    UnsupportedFormat(String),

    /// The bytes claim a supported format but could not be parsed
    #[error("Could not read {format} document: {reason}")]
    CorruptInput { format: Format, reason: String },

    #[error("PDF is {size} bytes, which exceeds the {limit} byte limit")]
    OversizeInput { size: usize, limit: usize },

    /// Parsing worked but produced too little text to build questions from
    #[error(
        "Text extraction failed (too little text or image-only without OCR): \
         got {chars} characters, need at least {min}"
    )]
    InsufficientText { chars: usize, min: usize },

    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    pub(crate) fn corrupt(format: Format, reason: impl std::fmt::Display) -> Self {
        ExtractError::CorruptInput {
            format,
            reason: reason.to_string(),
        }
    }
}
