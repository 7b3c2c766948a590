//! Format sniffing by byte signature. Declared filenames and MIME types are
//! never consulted here.

use crate::models::upload::DetectedFormat;

const SIGNATURE_WINDOW: usize = 8;
const PDF_MAGIC: &[u8] = b"%PDF";
const ZIP_MAGIC: &[u8] = b"PK";

/// Bytes inspected by the text/binary heuristic.
pub const TEXT_SAMPLE_WINDOW: usize = 1024;
/// Maximum share of non-printable bytes in the sample for input to count as text.
pub const MAX_NON_PRINTABLE_RATIO: f64 = 0.10;

/// Classifies `bytes` as PDF, DOCX, plain text or unknown.
pub fn detect_format(bytes: &[u8]) -> DetectedFormat {
    let head = &bytes[..bytes.len().min(SIGNATURE_WINDOW)];

    if head.starts_with(PDF_MAGIC) {
        DetectedFormat::Pdf
    } else if head.starts_with(ZIP_MAGIC) {
        DetectedFormat::Docx
    } else if looks_like_text(bytes) {
        DetectedFormat::Txt
    } else {
        DetectedFormat::Unknown
    }
}

/// Text/binary heuristic over the leading sample window.
///
/// Bytes >= 0x80 count as printable so UTF-8 multibyte sequences and
/// Latin-1 text pass. A UTF-16 byte-order mark short-circuits to text since
/// every other byte of ASCII-range UTF-16 is NUL.
pub fn looks_like_text(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    if bytes.starts_with(&[0xFF, 0xFE]) || bytes.starts_with(&[0xFE, 0xFF]) {
        return true;
    }

    let sample = &bytes[..bytes.len().min(TEXT_SAMPLE_WINDOW)];
    let non_printable = sample.iter().filter(|&&b| !is_printable_byte(b)).count();
    (non_printable as f64 / sample.len() as f64) <= MAX_NON_PRINTABLE_RATIO
}

fn is_printable_byte(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\r' | 0x0C) || (0x20..0x7F).contains(&b) || b >= 0x80
}
