//! Section header detection and line segmentation.

use crate::models::resume::ResumeSection;
use crate::resume::contact::{is_contact_only_line, HEADER_WINDOW_LINES};

/// Recognized section titles, matched case-insensitively.
pub const SECTION_KEYWORDS: &[&str] = &[
    "SUMMARY",
    "PROFILE",
    "OBJECTIVE",
    "EXPERIENCE",
    "WORK EXPERIENCE",
    "EMPLOYMENT HISTORY",
    "EDUCATION",
    "ACADEMIC BACKGROUND",
    "SKILLS",
    "TECHNICAL SKILLS",
    "CORE COMPETENCIES",
    "PROJECTS",
    "KEY PROJECTS",
    "CERTIFICATIONS",
    "CERTIFICATES",
    "AWARDS",
    "HONORS",
    "PUBLICATIONS",
    "LANGUAGES",
    "INTERESTS",
    "HOBBIES",
];

/// A few extra words after the keyword still read as part of the title
/// ("SUMMARY OF QUALIFICATIONS"); more than this is body text.
const MAX_TITLE_CONTINUATION_WORDS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeader {
    pub title: String,
    /// Body text sharing the header's line, e.g. `Rust, Go` in
    /// `SKILLS: Rust, Go`.
    pub inline: Option<String>,
}

/// Returns the header parsed from `line` if it starts a section: the line
/// equals a keyword, or starts with one followed by `:` or a space.
pub fn match_section_header(line: &str) -> Option<SectionHeader> {
    let line = line.trim();
    let keyword = SECTION_KEYWORDS
        .iter()
        .filter(|kw| keyword_prefix_matches(line, kw))
        .max_by_key(|kw| kw.len())?;

    let (head, rest) = line.split_at(keyword.len());
    if rest.is_empty() {
        return Some(SectionHeader {
            title: head.to_string(),
            inline: None,
        });
    }

    if let Some(after_colon) = rest.strip_prefix(':') {
        return Some(SectionHeader {
            title: head.to_string(),
            inline: non_empty(after_colon),
        });
    }

    let rest = rest.trim();
    if is_title_continuation(rest) {
        Some(SectionHeader {
            title: line.trim_end_matches(':').trim_end().to_string(),
            inline: None,
        })
    } else {
        Some(SectionHeader {
            title: head.to_string(),
            inline: non_empty(rest),
        })
    }
}

fn keyword_prefix_matches(line: &str, keyword: &str) -> bool {
    let n = keyword.len();
    if line.len() < n || !line.is_char_boundary(n) {
        return false;
    }
    if !line[..n].eq_ignore_ascii_case(keyword) {
        return false;
    }
    matches!(line[n..].chars().next(), None | Some(':') | Some(' '))
}

/// `OF QUALIFICATIONS` or `& Tools:` continue a title; `Python, Go, Rust`
/// does not.
fn is_title_continuation(rest: &str) -> bool {
    let without_trailing_colon = rest.strip_suffix(':').unwrap_or(rest);
    !without_trailing_colon.contains([',', ':'])
        && without_trailing_colon.split_whitespace().count() <= MAX_TITLE_CONTINUATION_WORDS
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Result of a segmentation pass.
#[derive(Debug, Clone, Default)]
pub struct Segmentation {
    pub sections: Vec<ResumeSection>,
    /// Whether any header matched, even if its section ended up empty.
    pub any_header: bool,
    /// Non-contact lines after the name line and before the first header.
    pub preamble: Vec<String>,
}

struct OpenSection {
    title: String,
    body: Vec<String>,
}

impl OpenSection {
    fn close_into(self, sections: &mut Vec<ResumeSection>) {
        if self.body.is_empty() {
            return;
        }
        sections.push(ResumeSection {
            title: self.title,
            content: self.body.join("\n"),
        });
    }
}

/// Splits `lines` into titled sections in source order.
///
/// Line 0 is the name line and never becomes body text. Lines before the
/// first header have no section to land in and are kept as the preamble,
/// minus contact-only lines inside the header window. Once a section is
/// open every non-empty line is body text.
pub fn segment_sections(lines: &[&str]) -> Segmentation {
    let mut sections = Vec::new();
    let mut open: Option<OpenSection> = None;
    let mut any_header = false;
    let mut preamble = Vec::new();

    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = match_section_header(line) {
            if let Some(done) = open.take() {
                done.close_into(&mut sections);
            }
            any_header = true;
            open = Some(OpenSection {
                title: header.title,
                body: header.inline.into_iter().collect(),
            });
            continue;
        }

        if i == 0 {
            continue;
        }

        match open.as_mut() {
            Some(section) => section.body.push(line.to_string()),
            None if i < HEADER_WINDOW_LINES && is_contact_only_line(line) => {}
            None => preamble.push(line.to_string()),
        }
    }

    if let Some(done) = open {
        done.close_into(&mut sections);
    }

    Segmentation {
        sections,
        any_header,
        preamble,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(title: &str, inline: Option<&str>) -> Option<SectionHeader> {
        Some(SectionHeader {
            title: title.to_string(),
            inline: inline.map(str::to_string),
        })
    }

    #[test]
    fn test_exact_keyword_is_header() {
        assert_eq!(match_section_header("EXPERIENCE"), header("EXPERIENCE", None));
        assert_eq!(match_section_header("  education  "), header("education", None));
    }

    #[test]
    fn test_keyword_with_colon() {
        assert_eq!(match_section_header("Skills:"), header("Skills", None));
        assert_eq!(
            match_section_header("SKILLS: Rust, Go"),
            header("SKILLS", Some("Rust, Go"))
        );
    }

    #[test]
    fn test_longest_keyword_wins() {
        assert_eq!(
            match_section_header("Work Experience"),
            header("Work Experience", None)
        );
        assert_eq!(
            match_section_header("TECHNICAL SKILLS: Rust"),
            header("TECHNICAL SKILLS", Some("Rust"))
        );
    }

    #[test]
    fn test_title_continuation() {
        assert_eq!(
            match_section_header("SUMMARY OF QUALIFICATIONS"),
            header("SUMMARY OF QUALIFICATIONS", None)
        );
        assert_eq!(
            match_section_header("Skills & Tools:"),
            header("Skills & Tools", None)
        );
    }

    #[test]
    fn test_inline_list_after_space_is_body() {
        assert_eq!(
            match_section_header("SKILLS Python, Go, Rust"),
            header("SKILLS", Some("Python, Go, Rust"))
        );
    }

    #[test]
    fn test_keyword_inside_word_is_not_header() {
        assert_eq!(match_section_header("Experienced engineer"), None);
        assert_eq!(match_section_header("Skillset"), None);
        assert_eq!(match_section_header("My experience"), None);
    }

    #[test]
    fn test_keyword_list_matches_vocabulary() {
        assert_eq!(SECTION_KEYWORDS.len(), 21);
        assert!(SECTION_KEYWORDS.iter().all(|k| k.is_ascii()));
    }

    #[test]
    fn test_segment_two_sections_in_order() {
        let lines = vec![
            "Jane Doe",
            "EXPERIENCE",
            "- Built the billing service",
            "- Led a team of four",
            "- Cut p99 latency by 40%",
            "EDUCATION",
            "BSc Computer Science",
            "State University, 2014",
        ];
        let seg = segment_sections(&lines);
        assert!(seg.any_header);
        assert_eq!(seg.sections.len(), 2);
        assert_eq!(seg.sections[0].title, "EXPERIENCE");
        assert_eq!(
            seg.sections[0].content,
            "- Built the billing service\n- Led a team of four\n- Cut p99 latency by 40%"
        );
        assert_eq!(seg.sections[1].title, "EDUCATION");
        assert_eq!(
            seg.sections[1].content,
            "BSc Computer Science\nState University, 2014"
        );
    }

    #[test]
    fn test_empty_section_is_dropped() {
        let lines = vec!["Jane Doe", "SUMMARY", "SKILLS", "Rust"];
        let seg = segment_sections(&lines);
        assert_eq!(seg.sections.len(), 1);
        assert_eq!(seg.sections[0].title, "SKILLS");
    }

    #[test]
    fn test_contact_lines_before_first_header_stay_out_of_preamble() {
        let lines = vec![
            "Jane Doe",
            "jane@example.com | (415) 555-1234",
            "Staff Engineer",
            "SUMMARY",
            "Engineer who ships.",
        ];
        let seg = segment_sections(&lines);
        assert_eq!(seg.preamble, vec!["Staff Engineer"]);
        assert_eq!(seg.sections[0].content, "Engineer who ships.");
    }

    #[test]
    fn test_contact_looking_body_lines_are_kept() {
        // `Python, JS` matches the loose City, ST pattern.
        let lines = vec!["Jane Doe", "SKILLS", "Python, JS", "Rust"];
        let seg = segment_sections(&lines);
        assert_eq!(seg.sections.len(), 1);
        assert_eq!(seg.sections[0].content, "Python, JS\nRust");
    }

    #[test]
    fn test_preamble_lines_do_not_join_sections() {
        let lines = vec!["Jane Doe", "Staff Engineer", "PROJECTS", "Compiler in Rust"];
        let seg = segment_sections(&lines);
        assert_eq!(seg.sections.len(), 1);
        assert_eq!(seg.sections[0].content, "Compiler in Rust");
        assert_eq!(seg.preamble, vec!["Staff Engineer"]);
    }

    #[test]
    fn test_header_on_first_line_opens_section() {
        let lines = vec!["SKILLS Python, Go, Rust"];
        let seg = segment_sections(&lines);
        assert_eq!(seg.sections.len(), 1);
        assert_eq!(seg.sections[0].title, "SKILLS");
        assert_eq!(seg.sections[0].content, "Python, Go, Rust");
    }
}
