/// Decode a plain-text upload as UTF-8 and trim it.
///
/// A leading byte order mark is dropped and invalid sequences are replaced
/// rather than rejected.
pub fn extract(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.trim_start_matches('\u{feff}').trim().to_string()
}
