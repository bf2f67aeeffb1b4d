use std::io::{Cursor, Read};

use super::xml::{self, XmlNode};
use super::{ExtractError, Format};

const DOCUMENT_PART: &str = "word/document.xml";

/// Extract the visible text of a Word document.
///
/// Paragraphs are separated by a blank line. Images, drawings, styles and any
/// element that is not a text run, tab or break are skipped.
pub fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::corrupt(Format::Docx, e))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractError::corrupt(Format::Docx, format!("{DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::corrupt(Format::Docx, format!("{DOCUMENT_PART}: {e}")))?;

    let root = xml::parse(&xml).map_err(|e| ExtractError::corrupt(Format::Docx, e))?;

    let mut text = String::new();
    walk(&root, &mut text);
    Ok(text)
}

fn walk(node: &XmlNode, out: &mut String) {
    let XmlNode::Element { name, children } = node else {
        return;
    };

    match local_name(name) {
        "t" => out.push_str(&node.own_text()),
        "tab" => out.push('\t'),
        "br" | "cr" => out.push('\n'),
        "p" => {
            for child in children {
                walk(child, out);
            }
            out.push_str("\n\n");
        }
        // Deleted revisions and field instructions are not visible text
        "delText" | "instrText" => {}
        _ => {
            for child in children {
                walk(child, out);
            }
        }
    }
}

fn local_name(qualified: &str) -> &str {
    qualified
        .rsplit_once(':')
        .map_or(qualified, |(_, local)| local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::fixtures;

    #[test]
    fn test_paragraphs_in_order() {
        let bytes = fixtures::docx(&["The cell membrane", "controls what enters the cell"]);
        let text = extract(&bytes).unwrap();
        assert_eq!(
            text.trim(),
            "The cell membrane\n\ncontrols what enters the cell"
        );
    }

    #[test]
    fn test_skips_images_and_handles_tabs_and_breaks() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="w" xmlns:wp="wp" xmlns:a="a"><w:body>
<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Title</w:t></w:r></w:p>
<w:p><w:r><w:drawing><wp:inline><a:graphic><a:graphicData/></a:graphic></wp:inline></w:drawing></w:r></w:p>
<w:p><w:r><w:t>Term</w:t><w:tab/><w:t>Definition</w:t><w:br/><w:t>next line</w:t></w:r></w:p>
<w:p><w:r><w:instrText> PAGE </w:instrText></w:r><w:del><w:r><w:delText>gone</w:delText></w:r></w:del></w:p>
</w:body></w:document>"#;
        let bytes = fixtures::zip(&[("word/document.xml", xml)]);
        let text = extract(&bytes).unwrap();

        assert!(text.starts_with("Title\n\n"));
        assert!(text.contains("Term\tDefinition\nnext line"));
        assert!(!text.contains("PAGE"));
        assert!(!text.contains("gone"));
    }

    #[test]
    fn test_missing_document_part_is_corrupt() {
        let bytes = fixtures::zip(&[("word/styles.xml", "<w:styles/>")]);
        assert!(matches!(
            extract(&bytes),
            Err(ExtractError::CorruptInput { format: Format::Docx, .. })
        ));
    }

    #[test]
    fn test_malformed_xml_is_corrupt() {
        let bytes = fixtures::zip(&[("word/document.xml", "<w:document><w:body></w:document>")]);
        assert!(matches!(
            extract(&bytes),
            Err(ExtractError::CorruptInput { .. })
        ));
    }
}
