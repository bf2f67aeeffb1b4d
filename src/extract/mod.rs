//! Document text extraction.
//!
//! Classifies an upload from its declared media type and filename, hands the
//! bytes to the matching format extractor and enforces the minimum amount of
//! text needed downstream.

pub mod docx;
pub mod error;
pub mod pdf;
pub mod pptx;
pub mod text;
pub mod xml;

pub use error::ExtractError;

use std::fmt;
use std::path::Path;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PPTX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const OCTET_STREAM_MIME: &str = "application/octet-stream";

/// 25 MiB
pub const DEFAULT_MAX_PDF_BYTES: usize = 25 * 1024 * 1024;
pub const DEFAULT_MIN_TEXT_CHARS: usize = 50;

/// Document formats the extractor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Pdf,
    Docx,
    Pptx,
    PlainText,
    Unsupported,
}

impl Format {
    /// Pick a format from the declared media type and the original filename.
    ///
    /// Total and deterministic: every input pair maps to exactly one format.
    pub fn classify(media_type: &str, filename: &str) -> Self {
        let mime = normalize_mime(media_type);
        let ext = extension(filename);

        match mime.as_str() {
            PDF_MIME => return Format::Pdf,
            DOCX_MIME => return Format::Docx,
            PPTX_MIME => return Format::Pptx,
            _ => {}
        }

        // Some clients label every binary upload as octet-stream
        if mime == OCTET_STREAM_MIME && ext.as_deref() == Some("pdf") {
            return Format::Pdf;
        }

        match ext.as_deref() {
            Some("pdf") => return Format::Pdf,
            Some("docx") => return Format::Docx,
            Some("pptx") => return Format::Pptx,
            Some("txt") => return Format::PlainText,
            _ => {}
        }

        if mime.starts_with("text/") {
            return Format::PlainText;
        }

        Format::Unsupported
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Pdf => write!(f, "PDF"),
            Format::Docx => write!(f, "DOCX"),
            Format::Pptx => write!(f, "PPTX"),
            Format::PlainText => write!(f, "TXT"),
            Format::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Lowercase the media type and drop any `; charset=...` parameters
fn normalize_mime(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// An uploaded document, exactly as it arrived
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub bytes: Vec<u8>,
    pub media_type: String,
    pub filename: String,
}

impl SourceDocument {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
            filename: filename.into(),
        }
    }

    pub fn format(&self) -> Format {
        Format::classify(&self.media_type, &self.filename)
    }
}

/// Thresholds applied during extraction
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    /// PDFs larger than this are rejected before parsing
    pub max_pdf_bytes: usize,
    /// Results with fewer characters than this count as failed extractions
    pub min_text_chars: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_pdf_bytes: DEFAULT_MAX_PDF_BYTES,
            min_text_chars: DEFAULT_MIN_TEXT_CHARS,
        }
    }
}

/// Extract normalized plain text from a document.
///
/// Returns trimmed text with at least `options.min_text_chars` characters,
/// or an error. Never returns partial results.
pub fn extract_text(
    document: &SourceDocument,
    options: &ExtractOptions,
) -> Result<String, ExtractError> {
    let format = document.format();

    tracing::debug!(
        filename = %document.filename,
        media_type = %document.media_type,
        bytes = document.bytes.len(),
        %format,
        "Classified document"
    );

    let raw = match format {
        Format::Pdf => pdf::extract(&document.bytes, options.max_pdf_bytes)?,
        Format::Docx => docx::extract(&document.bytes)?,
        Format::Pptx => pptx::extract(&document.bytes)?,
        Format::PlainText => text::extract(&document.bytes),
        Format::Unsupported => {
            let declared = if document.media_type.is_empty() {
                document.filename.clone()
            } else {
                document.media_type.clone()
            };
            return Err(ExtractError::UnsupportedFormat(declared));
        }
    };

    let text = raw.trim().to_string();
    let chars = text.chars().count();

    if chars < options.min_text_chars {
        tracing::warn!(
            filename = %document.filename,
            chars,
            min = options.min_text_chars,
            "Extracted text below minimum length"
        );
        return Err(ExtractError::InsufficientText {
            chars,
            min: options.min_text_chars,
        });
    }

    tracing::info!(filename = %document.filename, %format, chars, "Text extracted");

    Ok(text)
}

/// Run [`extract_text`] on the blocking pool so parsing never stalls the runtime
pub async fn extract_text_async(
    document: SourceDocument,
    options: ExtractOptions,
) -> Result<String, ExtractError> {
    tokio::task::spawn_blocking(move || extract_text(&document, &options))
        .await
        .map_err(|e| ExtractError::Io(std::io::Error::other(format!("task join error: {e}"))))?
}

/// Read a file from disk and extract its text.
///
/// When no media type is given, classification relies on the extension.
pub async fn extract_file(
    path: &Path,
    media_type: Option<&str>,
    options: ExtractOptions,
) -> Result<String, ExtractError> {
    let bytes = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_default();

    let media_type = media_type
        .map(str::to_string)
        .unwrap_or_else(|| OCTET_STREAM_MIME.to_string());

    extract_text_async(SourceDocument::new(bytes, media_type, filename), options).await
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Builders for minimal well-formed documents used across the extractor tests.

    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    /// Build a PDF with one page per entry; each line is `(baseline_y, text)`.
    pub fn pdf(pages: &[&[(i64, &str)]]) -> Vec<u8> {
        let streams = pages
            .iter()
            .map(|lines| {
                let mut operations = vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                ];
                for (y, text) in lines.iter() {
                    operations.push(Operation::new(
                        "Tm",
                        vec![1.into(), 0.into(), 0.into(), 1.into(), 72.into(), (*y).into()],
                    ));
                    operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
                }
                operations.push(Operation::new("ET", vec![]));
                content_stream(operations)
            })
            .collect();
        pdf_from_streams(streams)
    }

    /// Uncompressed content stream holding `operations`
    pub fn content_stream(operations: Vec<Operation>) -> Stream {
        let content = Content { operations };
        Stream::new(dictionary! {}, content.encode().unwrap())
    }

    /// Build a PDF with one page per content stream, all sharing font `F1`
    pub fn pdf_from_streams(streams: Vec<Stream>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::new();
        for stream in streams {
            let content_id = doc.add_object(stream);
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    /// Zip the given `(entry name, contents)` pairs into an in-memory archive
    pub fn zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    pub fn docx(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{p}</w:t></w:r></w:p>"))
            .collect();
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        zip(&[
            ("[Content_Types].xml", "<Types/>"),
            ("word/document.xml", &xml),
        ])
    }

    pub fn slide_xml(runs: &[&str]) -> String {
        let paragraphs: String = runs
            .iter()
            .map(|r| format!("<a:p><a:r><a:rPr lang=\"en-US\"/><a:t>{r}</a:t></a:r></a:p>"))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:sp><p:txBody>{paragraphs}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#
        )
    }

    /// Build a PPTX whose slide N contains the runs at index N-1
    pub fn pptx(slides: &[&[&str]]) -> Vec<u8> {
        let xml: Vec<(String, String)> = slides
            .iter()
            .enumerate()
            .map(|(i, runs)| (format!("ppt/slides/slide{}.xml", i + 1), slide_xml(runs)))
            .collect();
        let mut entries: Vec<(&str, &str)> = vec![("[Content_Types].xml", "<Types/>")];
        entries.extend(xml.iter().map(|(n, b)| (n.as_str(), b.as_str())));
        zip(&entries)
    }
}
