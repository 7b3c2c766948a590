//! DOCX text extraction: a structured read of the main document part, and a
//! lossy printable-run scan for containers too damaged to open.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use super::ExtractionError;

pub const DOCUMENT_PART: &str = "word/document.xml";

/// Shortest printable run kept by the binary scan is `MIN_RUN_LEN + 1`.
const MIN_RUN_LEN: usize = 3;

/// Opens the ZIP container and returns the tag-stripped text of
/// `word/document.xml`, whitespace collapsed to single spaces.
pub fn extract_docx_structured(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::Corrupt(format!("invalid ZIP container: {e}")))?;

    let mut part = archive.by_name(DOCUMENT_PART).map_err(|e| match e {
        zip::result::ZipError::FileNotFound => ExtractionError::Corrupt(format!(
            "ZIP container has no {DOCUMENT_PART}; not a Word document"
        )),
        other => ExtractionError::Corrupt(format!("cannot open {DOCUMENT_PART}: {other}")),
    })?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Corrupt(format!("cannot read {DOCUMENT_PART}: {e}")))?;

    xml_to_text(&xml)
}

/// Strips tags, keeping the text between them. Entities are decoded and
/// adjacent text nodes are separated by a space before whitespace is
/// collapsed, so `<w:t>A</w:t><w:t>B</w:t>` reads `A B`.
pub fn xml_to_text(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut pieces: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| {
                    ExtractionError::Corrupt(format!(
                        "bad entity near byte {}: {e}",
                        reader.buffer_position()
                    ))
                })?;
                pieces.push(text.into_owned());
            }
            Ok(Event::CData(c)) => {
                pieces.push(String::from_utf8_lossy(&c.into_inner()).into_owned());
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ExtractionError::Corrupt(format!(
                    "malformed XML near byte {}: {e}",
                    reader.buffer_position()
                )))
            }
        }
    }

    Ok(collapse_whitespace(&pieces.join(" ")))
}

/// Collapses every whitespace run to one space and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lossy recovery: every run of printable ASCII (plus tab/CR/LF) longer
/// than three bytes, joined with spaces. Shorter runs are treated as noise.
pub fn extract_docx_binary_scan(bytes: &[u8]) -> Result<String, ExtractionError> {
    let runs = printable_runs(bytes);
    if runs.is_empty() {
        return Err(ExtractionError::NoTextLayer(
            "no printable text runs in container".to_string(),
        ));
    }
    Ok(runs.join(" "))
}

fn printable_runs(bytes: &[u8]) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;

    for (i, &b) in bytes.iter().enumerate() {
        match (is_scan_printable(b), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                push_run(&mut runs, &bytes[s..i]);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        push_run(&mut runs, &bytes[s..]);
    }
    runs
}

fn push_run<'a>(runs: &mut Vec<&'a str>, run: &'a [u8]) {
    if run.len() <= MIN_RUN_LEN {
        return;
    }
    // Printable ASCII is always valid UTF-8.
    if let Ok(s) = std::str::from_utf8(run) {
        let s = s.trim();
        if !s.is_empty() {
            runs.push(s);
        }
    }
}

fn is_scan_printable(b: u8) -> bool {
    (32..=126).contains(&b) || matches!(b, b'\t' | b'\r' | b'\n')
}
