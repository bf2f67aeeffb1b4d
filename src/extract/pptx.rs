use std::io::{Cursor, Read};

use super::xml;
use super::{ExtractError, Format};

const SLIDE_PREFIX: &str = "ppt/slides/slide";
const SLIDE_SUFFIX: &str = ".xml";

/// Slide number encoded in an archive entry name (`ppt/slides/slide12.xml` -> 12)
pub fn slide_index(entry: &str) -> Option<u32> {
    entry
        .strip_prefix(SLIDE_PREFIX)?
        .strip_suffix(SLIDE_SUFFIX)?
        .parse()
        .ok()
}

/// Extract slide text from a PowerPoint deck, slides in numeric order.
///
/// Runs within a slide are joined with spaces and slides with newlines.
pub fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::corrupt(Format::Pptx, e))?;

    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| slide_index(name).map(|i| (i, name.to_string())))
        .collect();
    // slide10 must come after slide9, which lexical order gets wrong
    slides.sort_by_key(|(index, _)| *index);

    tracing::debug!(slides = slides.len(), "Reading PPTX slides");

    let mut parts: Vec<String> = Vec::new();
    for (_, name) in &slides {
        let mut xml = String::new();
        archive
            .by_name(name)
            .map_err(|e| ExtractError::corrupt(Format::Pptx, format!("{name}: {e}")))?
            .read_to_string(&mut xml)
            .map_err(|e| ExtractError::corrupt(Format::Pptx, format!("{name}: {e}")))?;

        let root =
            xml::parse(&xml).map_err(|e| ExtractError::corrupt(Format::Pptx, format!("{name}: {e}")))?;

        xml::collect_text(&root, "t", &mut parts);
        parts.push("\n".to_string());
    }

    Ok(collapse_line_breaks(&parts.join(" ")))
}

/// Collapse whitespace around line breaks into a single newline and trim
fn collapse_line_breaks(text: &str) -> String {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
