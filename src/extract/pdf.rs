//! PDF text extraction with line reconstruction.
//!
//! PDF content streams carry positioned glyph runs but no line structure, so
//! lines are rebuilt from the vertical position of each run.

use flate2::read::ZlibDecoder;
use lopdf::content::Content;
use lopdf::{Document, Object, Stream};
use std::io::Read;
use std::panic;

use super::{ExtractError, Format};

/// Baselines closer than this are treated as the same visual line. Positions
/// pass through two matrix products, so exact equality would split a line on
/// floating-point noise.
const BASELINE_EPSILON: f64 = 1e-3;

/// TJ adjustments more negative than this (thousandths of an em) read as a word gap
const TJ_SPACE_THRESHOLD: f64 = -200.0;

/// A run of text shown at a given baseline
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub text: String,
    pub baseline: f64,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, baseline: f64) -> Self {
        Self {
            text: text.into(),
            baseline,
        }
    }
}

/// Reject inputs above the size ceiling. A file exactly at the limit is accepted.
pub fn check_size(len: usize, limit: usize) -> Result<(), ExtractError> {
    if len > limit {
        return Err(ExtractError::OversizeInput { size: len, limit });
    }
    Ok(())
}

/// Extract text from PDF bytes, pages in order, one trailing newline per page
pub fn extract(bytes: &[u8], max_bytes: usize) -> Result<String, ExtractError> {
    check_size(bytes.len(), max_bytes)?;

    let doc = Document::load_mem(bytes).map_err(|e| ExtractError::corrupt(Format::Pdf, e))?;

    let mut text = String::new();
    for (page_num, page_id) in doc.get_pages() {
        let fragments = page_fragments(&doc, page_id).inspect_err(|e| {
            tracing::warn!(page = page_num, error = %e, "Unreadable PDF page");
        })?;
        text.push_str(&reconstruct_page(&fragments));
    }

    if text.trim().is_empty() {
        // Content streams gave nothing decodable (CID fonts, odd encodings)
        tracing::debug!("No text from content streams, trying pdf_extract");
        return Ok(extract_with_pdf_extract(bytes));
    }

    Ok(text)
}

/// Join fragments into lines: same baseline concatenates, a new baseline
/// starts a new line. The page always ends with a newline.
pub fn reconstruct_page(fragments: &[TextFragment]) -> String {
    let (mut page, _) = fragments.iter().fold(
        (String::new(), None::<f64>),
        |(mut page, previous), fragment| {
            if let Some(prev) = previous
                && (prev - fragment.baseline).abs() > BASELINE_EPSILON
            {
                page.push('\n');
            }
            page.push_str(&fragment.text);
            (page, Some(fragment.baseline))
        },
    );
    page.push('\n');
    page
}

/// Text, line and graphics state tracked while walking a content stream
struct TextState {
    /// Text matrix `[a b c d e f]`
    matrix: [f64; 6],
    /// Matrix at the start of the current line
    line_matrix: [f64; 6],
    leading: f64,
    /// Current transformation matrix
    ctm: [f64; 6],
    /// CTMs saved by `q`
    saved: Vec<[f64; 6]>,
}

const IDENTITY: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

impl TextState {
    fn new() -> Self {
        Self {
            matrix: IDENTITY,
            line_matrix: IDENTITY,
            leading: 0.0,
            ctm: IDENTITY,
            saved: Vec::new(),
        }
    }

    fn save(&mut self) {
        self.saved.push(self.ctm);
    }

    /// An unbalanced `Q` leaves the CTM as it is
    fn restore(&mut self) {
        if let Some(ctm) = self.saved.pop() {
            self.ctm = ctm;
        }
    }

    fn concat(&mut self, m: [f64; 6]) {
        self.ctm = multiply(m, self.ctm);
    }

    fn begin_text(&mut self) {
        self.matrix = IDENTITY;
        self.line_matrix = IDENTITY;
    }

    fn set_matrix(&mut self, m: [f64; 6]) {
        self.matrix = m;
        self.line_matrix = m;
    }

    fn translate(&mut self, tx: f64, ty: f64) {
        let [a, b, c, d, e, f] = self.line_matrix;
        self.line_matrix = [a, b, c, d, tx * a + ty * c + e, tx * b + ty * d + f];
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.translate(0.0, -self.leading);
    }

    /// Vertical position of the text origin in device space: `(Tm × CTM)[5]`
    fn baseline(&self) -> f64 {
        let [.., e, f] = self.matrix;
        e * self.ctm[1] + f * self.ctm[3] + self.ctm[5]
    }
}

/// Product `m × n` of two PDF matrices in `[a b c d e f]` form
fn multiply(m: [f64; 6], n: [f64; 6]) -> [f64; 6] {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

/// Concatenated, decoded content streams of a page.
///
/// Any stream that cannot be resolved or decoded makes the page corrupt.
/// lopdf's own inflate logs and drops zlib errors, so Flate input is
/// checked here first.
fn page_content(doc: &Document, page_id: lopdf::ObjectId) -> Result<Vec<u8>, ExtractError> {
    let mut data = Vec::new();
    for stream_id in doc.get_page_contents(page_id) {
        let stream = doc
            .get_object(stream_id)
            .and_then(Object::as_stream)
            .map_err(|e| {
                ExtractError::corrupt(Format::Pdf, format!("content stream {stream_id:?}: {e}"))
            })?;
        data.extend(decode_stream(stream)?);
        data.push(b'\n');
    }
    Ok(data)
}

fn decode_stream(stream: &Stream) -> Result<Vec<u8>, ExtractError> {
    if !stream.dict.has(b"Filter") {
        return Ok(stream.content.clone());
    }

    let filters = stream
        .filters()
        .map_err(|e| ExtractError::corrupt(Format::Pdf, format!("bad stream filter: {e}")))?;

    if filters.first().is_some_and(|f| f == "FlateDecode") {
        let mut inflated = Vec::new();
        ZlibDecoder::new(stream.content.as_slice())
            .read_to_end(&mut inflated)
            .map_err(|e| ExtractError::corrupt(Format::Pdf, format!("FlateDecode: {e}")))?;
    }

    stream
        .decompressed_content()
        .map_err(|e| ExtractError::corrupt(Format::Pdf, format!("cannot decode stream: {e}")))
}

/// Walk a page's content stream and collect its text fragments in stream order
fn page_fragments(
    doc: &Document,
    page_id: lopdf::ObjectId,
) -> Result<Vec<TextFragment>, ExtractError> {
    let data = page_content(doc, page_id)?;
    let content = Content::decode(&data).map_err(|e| ExtractError::corrupt(Format::Pdf, e))?;

    let mut state = TextState::new();
    let mut fragments = Vec::new();

    for op in &content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => state.save(),
            "Q" => state.restore(),
            "cm" => {
                if let Some(m) = matrix_operand(operands) {
                    state.concat(m);
                }
            }
            "BT" => state.begin_text(),
            "Tm" => {
                if let Some(m) = matrix_operand(operands) {
                    state.set_matrix(m);
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (number_at(operands, 0), number_at(operands, 1)) {
                    state.translate(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (number_at(operands, 0), number_at(operands, 1)) {
                    state.leading = -ty;
                    state.translate(tx, ty);
                }
            }
            "TL" => {
                if let Some(leading) = number_at(operands, 0) {
                    state.leading = leading;
                }
            }
            "T*" => state.next_line(),
            "Tj" => push_fragment(&mut fragments, &state, operands.first()),
            "'" => {
                state.next_line();
                push_fragment(&mut fragments, &state, operands.first());
            }
            "\"" => {
                state.next_line();
                push_fragment(&mut fragments, &state, operands.get(2));
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let text = show_array_text(items);
                    if !text.is_empty() {
                        fragments.push(TextFragment::new(text, state.baseline()));
                    }
                }
            }
            _ => {}
        }
    }

    Ok(fragments)
}

fn push_fragment(fragments: &mut Vec<TextFragment>, state: &TextState, operand: Option<&Object>) {
    if let Some(Object::String(bytes, _)) = operand {
        let text = decode_pdf_string(bytes);
        if !text.is_empty() {
            fragments.push(TextFragment::new(text, state.baseline()));
        }
    }
}

/// Text of a `TJ` array; large negative kerning becomes a space
fn show_array_text(items: &[Object]) -> String {
    let mut text = String::new();
    for item in items {
        match item {
            Object::String(bytes, _) => text.push_str(&decode_pdf_string(bytes)),
            other => {
                if let Some(adjust) = as_number(other)
                    && adjust < TJ_SPACE_THRESHOLD
                    && !text.ends_with(' ')
                {
                    text.push(' ');
                }
            }
        }
    }
    text
}

/// Decode a PDF string operand.
///
/// UTF-16BE when it carries a byte order mark, otherwise single-byte text.
/// Strings that are mostly control characters are multi-byte glyph ids we
/// cannot map without the font's CMap, so they decode to nothing.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    let controls = bytes
        .iter()
        .filter(|&&b| b < 0x20 && !b"\t\r\n".contains(&b))
        .count();
    if !bytes.is_empty() && controls * 10 > bytes.len() * 3 {
        return String::new();
    }

    bytes
        .iter()
        .filter(|b| **b >= 0x20 || **b == b'\t')
        .map(|&b| char::from(b))
        .collect()
}

fn as_number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

fn number_at(operands: &[Object], index: usize) -> Option<f64> {
    operands.get(index).and_then(as_number)
}

fn matrix_operand(operands: &[Object]) -> Option<[f64; 6]> {
    let mut m = [0.0; 6];
    for (i, slot) in m.iter_mut().enumerate() {
        *slot = number_at(operands, i)?;
    }
    Some(m)
}

/// Fallback extraction through pdf_extract, which understands more font
/// encodings but has no line model of ours and can panic on odd files.
fn extract_with_pdf_extract(bytes: &[u8]) -> String {
    match panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "pdf_extract failed");
            String::new()
        }
        Err(_) => {
            tracing::warn!("pdf_extract crashed");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::fixtures;
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use lopdf::content::Operation;
    use lopdf::dictionary;
    use std::io::Write;

    #[test]
    fn test_same_baseline_joins_without_newline() {
        let fragments = vec![
            TextFragment::new("Hello, ", 700.0),
            TextFragment::new("world", 700.0),
        ];
        assert_eq!(reconstruct_page(&fragments), "Hello, world\n");
    }

    #[test]
    fn test_new_baseline_inserts_one_newline() {
        let fragments = vec![
            TextFragment::new("Line one", 700.0),
            TextFragment::new("Line two", 686.0),
            TextFragment::new(" continues", 686.0),
            TextFragment::new("Back up", 700.0),
        ];
        assert_eq!(
            reconstruct_page(&fragments),
            "Line one\nLine two continues\nBack up\n"
        );
    }

    #[test]
    fn test_rounding_noise_stays_on_one_line() {
        let fragments = vec![
            TextFragment::new("Scaled ", 686.0),
            TextFragment::new("text", 686.0 + 1e-4),
            TextFragment::new("Next", 686.0 - 0.5),
        ];
        assert_eq!(reconstruct_page(&fragments), "Scaled text\nNext\n");
    }

    #[test]
    fn test_empty_page_is_single_newline() {
        assert_eq!(reconstruct_page(&[]), "\n");
    }

    #[test]
    fn test_size_ceiling_boundary() {
        let limit = 25 * 1024 * 1024;
        assert!(check_size(limit, limit).is_ok());
        assert!(matches!(
            check_size(limit + 1, limit),
            Err(ExtractError::OversizeInput { size, limit: l }) if size == limit + 1 && l == limit
        ));
    }

    #[test]
    fn test_oversize_pdf_rejected_before_parsing() {
        let bytes = fixtures::pdf(&[&[(700, "Cells divide by mitosis")]]);
        let limit = bytes.len();

        assert!(extract(&bytes, limit).is_ok());
        assert!(matches!(
            extract(&bytes, limit - 1),
            Err(ExtractError::OversizeInput { .. })
        ));
    }

    #[test]
    fn test_lines_and_pages_from_real_pdf() {
        let bytes = fixtures::pdf(&[
            &[(700, "Chapter 1"), (700, ": Cells"), (680, "Cells are small")],
            &[(700, "Chapter 2")],
        ]);
        let text = extract(&bytes, usize::MAX).unwrap();
        assert_eq!(text, "Chapter 1: Cells\nCells are small\nChapter 2\n");
    }

    #[test]
    fn test_truncated_pdf_is_corrupt() {
        let result = extract(b"%PDF-1.5\n1 0 obj <<", usize::MAX);
        assert!(matches!(
            result,
            Err(ExtractError::CorruptInput { format: Format::Pdf, .. })
        ));
    }

    #[test]
    fn test_text_state_td_and_leading() {
        let mut state = TextState::new();
        state.set_matrix([1.0, 0.0, 0.0, 1.0, 72.0, 700.0]);
        state.translate(0.0, -14.0);
        assert_eq!(state.baseline(), 686.0);

        state.leading = 12.0;
        state.next_line();
        assert_eq!(state.baseline(), 674.0);
    }

    #[test]
    fn test_tj_array_spacing() {
        let items = vec![
            Object::string_literal("Mito"),
            Object::Integer(-20),
            Object::string_literal("chondria"),
            Object::Integer(-250),
            Object::string_literal("produce"),
        ];
        assert_eq!(show_array_text(&items), "Mitochondria produce");
    }

    #[test]
    fn test_decode_utf16_string() {
        let bytes = [0xFE, 0xFF, 0x00, b'H', 0x00, b'i'];
        assert_eq!(decode_pdf_string(&bytes), "Hi");
    }

    #[test]
    fn test_decode_glyph_ids_yield_nothing() {
        let bytes = [0x00, 0x2C, 0x00, 0x11, 0x00, 0x03];
        assert_eq!(decode_pdf_string(&bytes), "");
    }

    fn show_at(y: i64, text: &str) -> Vec<Operation> {
        vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![1.into(), 0.into(), 0.into(), 1.into(), 72.into(), y.into()],
            ),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ]
    }

    #[test]
    fn test_lines_placed_with_cm_stay_separate() {
        let mut operations = show_at(700, "First line");
        operations.extend(show_at(680, "Second line"));
        let bytes = fixtures::pdf_from_streams(vec![fixtures::content_stream(operations)]);

        let text = extract(&bytes, usize::MAX).unwrap();
        assert_eq!(text, "First line\nSecond line\n");
    }

    #[test]
    fn test_ctm_save_restore_and_scale() {
        let mut state = TextState::new();
        state.set_matrix([1.0, 0.0, 0.0, 1.0, 0.0, 10.0]);

        state.save();
        state.concat([2.0, 0.0, 0.0, 2.0, 0.0, 100.0]);
        assert_eq!(state.baseline(), 120.0);

        state.restore();
        assert_eq!(state.baseline(), 10.0);

        // Unbalanced restore keeps the identity CTM
        state.restore();
        assert_eq!(state.baseline(), 10.0);
    }

    #[test]
    fn test_damaged_page_stream_is_corrupt() {
        let good = fixtures::content_stream(show_at(700, "Page one survives"));
        let damaged = Stream::new(
            dictionary! { "Filter" => "FlateDecode" },
            b"garbage not zlib".to_vec(),
        );
        let bytes = fixtures::pdf_from_streams(vec![good, damaged]);

        assert!(matches!(
            extract(&bytes, usize::MAX),
            Err(ExtractError::CorruptInput { format: Format::Pdf, .. })
        ));
    }

    #[test]
    fn test_flate_compressed_page() {
        let plain = fixtures::content_stream(show_at(700, "Compressed text"));
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&plain.content).unwrap();
        let compressed = Stream::new(
            dictionary! { "Filter" => "FlateDecode" },
            encoder.finish().unwrap(),
        );
        let bytes = fixtures::pdf_from_streams(vec![compressed]);

        assert_eq!(extract(&bytes, usize::MAX).unwrap(), "Compressed text\n");
    }
}
