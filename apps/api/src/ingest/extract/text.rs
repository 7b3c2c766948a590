//! Plain-text decoding for uploads of unknown encoding.

use super::ExtractionError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Which decoder produced the text. Reported in debug logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    /// Bytes were not valid UTF-8; each byte mapped to the code point of the
    /// same value.
    Latin1,
}

/// Decodes `bytes` and normalizes line endings to `\n`, dropping NUL bytes.
pub fn decode_plain_text(bytes: &[u8]) -> Result<(String, TextEncoding), ExtractionError> {
    let (decoded, encoding) = if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        (String::from_utf8_lossy(rest).into_owned(), TextEncoding::Utf8)
    } else if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        (decode_utf16(rest, u16::from_le_bytes), TextEncoding::Utf16Le)
    } else if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        (decode_utf16(rest, u16::from_be_bytes), TextEncoding::Utf16Be)
    } else {
        match std::str::from_utf8(bytes) {
            Ok(s) => (s.to_string(), TextEncoding::Utf8),
            Err(_) => (bytes.iter().map(|&b| b as char).collect(), TextEncoding::Latin1),
        }
    };

    let text = normalize_line_endings(&decoded);
    if text.trim().is_empty() {
        return Err(ExtractionError::NoTextLayer("file contains no text".to_string()));
    }
    Ok((text, encoding))
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| to_unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").replace('\0', "")
}
