//! Resume text parser: plain text in, contact block plus titled sections out.
//!
//! Keyword and pattern heuristics only. `parse_resume_text` never fails;
//! multi-line text that yields no titled section still comes back as one
//! catch-all section so callers always get some structure.

pub mod contact;
pub mod handlers;
pub mod sections;

use tracing::debug;

use crate::models::resume::{ResumeSection, StructuredResume};
use contact::{extract_contact, HEADER_WINDOW_LINES};
use sections::{match_section_header, segment_sections};

/// Title of the section synthesized when no titled section survives.
pub const CATCH_ALL_TITLE: &str = "Resume";

pub fn parse_resume_text(text: &str) -> StructuredResume {
    if text.trim().is_empty() {
        return StructuredResume::default();
    }

    let lines: Vec<&str> = text.lines().collect();

    let first = lines.first().map(|l| l.trim()).unwrap_or_default();
    let name = (!first.is_empty() && match_section_header(first).is_none())
        .then(|| first.to_string());

    let header_window = lines
        .iter()
        .take(HEADER_WINDOW_LINES)
        .copied()
        .collect::<Vec<_>>()
        .join("\n");
    let contact = extract_contact(&header_window);

    let segmentation = segment_sections(&lines);
    let sections = if segmentation.sections.is_empty() {
        let preamble: &[String] = if segmentation.any_header {
            &segmentation.preamble
        } else {
            &[]
        };
        catch_all_section(&lines, preamble).into_iter().collect()
    } else {
        segmentation.sections
    };

    debug!(
        lines = lines.len(),
        sections = sections.len(),
        headers_found = segmentation.any_header,
        "resume text parsed"
    );

    StructuredResume {
        name,
        email: contact.email,
        phone: contact.phone,
        location: contact.location,
        linkedin: contact.linkedin,
        website: contact.website,
        sections,
    }
}

/// Lines that landed in no titled section, as a single section: the
/// preamble before the first header, or everything after the name line when
/// there is no preamble.
fn catch_all_section(lines: &[&str], preamble: &[String]) -> Option<ResumeSection> {
    if lines.len() <= 1 {
        return None;
    }
    let content = if preamble.is_empty() {
        lines[1..].join("\n")
    } else {
        preamble.join("\n")
    };
    let content = content.trim().to_string();
    (!content.is_empty()).then(|| ResumeSection {
        title: CATCH_ALL_TITLE.to_string(),
        content,
    })
}
