//! Extraction quality analysis.
//!
//! `assess_quality` is a pure function of its input: the same text always
//! produces the same assessment. It decides nothing on its own; the pipeline
//! uses the tier to accept a candidate or move on to the next strategy.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ingest::extract::MIN_VIABLE_CHARS;

/// Above this share of non-printable characters text is considered garbled.
pub const GARBLED_RATIO_THRESHOLD: f64 = 0.15;
/// Distinct vocabulary hits needed for text to look like a resume.
pub const RESUME_KEYWORD_THRESHOLD: usize = 4;

/// Terms whose presence suggests the text is a resume. Matched as
/// case-insensitive substrings.
pub const RESUME_VOCABULARY: &[&str] = &[
    "resume",
    "curriculum vitae",
    "cv",
    "experience",
    "education",
    "skills",
    "projects",
    "contact",
    "summary",
    "certifications",
    "objective",
    "employment",
    "work history",
    "university",
    "degree",
    "bachelor",
    "master",
    "references",
    "achievements",
    "responsibilities",
    "languages",
    "profile",
    "internship",
    "volunteer",
    "awards",
    "publications",
];

const ZIP_LOCAL_HEADER: &str = "PK\u{3}\u{4}";

static REPLACEMENT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x{FFFD}{3,}").unwrap());
static NUL_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x00{3,}").unwrap());
static CONTROL_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]{5,}").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Poor,
    Acceptable,
    Good,
}

impl QualityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Poor => "poor",
            QualityTier::Acceptable => "acceptable",
            QualityTier::Good => "good",
        }
    }
}

/// A signal that lowered (or capped) the tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QualityIssue {
    TooShort,
    GarbledRatio,
    ZipSignature,
    ReplacementCharacters,
    NulRun,
    ControlCharacterRun,
    NonPrintableCharacters,
    NotResumeLike,
}

impl QualityIssue {
    /// Issues that force the tier to poor on their own.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            QualityIssue::NonPrintableCharacters | QualityIssue::NotResumeLike
        )
    }

    pub fn describe(&self) -> &'static str {
        match self {
            QualityIssue::TooShort => "too little text was recovered",
            QualityIssue::GarbledRatio => "too many unreadable characters",
            QualityIssue::ZipSignature => "raw ZIP container data leaked into the text",
            QualityIssue::ReplacementCharacters => "runs of undecodable characters",
            QualityIssue::NulRun => "runs of NUL bytes",
            QualityIssue::ControlCharacterRun => "runs of control characters",
            QualityIssue::NonPrintableCharacters => "some non-ASCII or non-printable characters",
            QualityIssue::NotResumeLike => "few resume-related terms",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub tier: QualityTier,
    pub garbled_ratio: f64,
    pub char_count: usize,
    pub word_count: usize,
    /// Vocabulary terms found, in vocabulary order.
    pub resume_keywords: Vec<String>,
    pub looks_like_resume: bool,
    pub issues: Vec<QualityIssue>,
}

impl QualityAssessment {
    pub fn is_usable(&self) -> bool {
        self.tier >= QualityTier::Acceptable
    }

    pub fn is_garbled(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.is_fatal() && *i != QualityIssue::TooShort)
    }

    /// Ranks two candidates: higher tier, then lower garbled ratio, then
    /// more words.
    pub fn compare(&self, other: &QualityAssessment) -> Ordering {
        self.tier
            .cmp(&other.tier)
            .then_with(|| {
                other
                    .garbled_ratio
                    .partial_cmp(&self.garbled_ratio)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| self.word_count.cmp(&other.word_count))
    }
}

/// Scores `text` for garbling, length and resume-likeness.
pub fn assess_quality(text: &str) -> QualityAssessment {
    let garbled_ratio = garbled_ratio(text);
    let trimmed_len = text.trim().chars().count();
    let word_count = text.split_whitespace().count();
    let resume_keywords = find_resume_keywords(text);
    let looks_like_resume = resume_keywords.len() >= RESUME_KEYWORD_THRESHOLD;

    let mut issues = Vec::new();
    if trimmed_len < MIN_VIABLE_CHARS {
        issues.push(QualityIssue::TooShort);
    }
    if garbled_ratio > GARBLED_RATIO_THRESHOLD {
        issues.push(QualityIssue::GarbledRatio);
    }
    issues.extend(garbled_patterns(text));
    if garbled_ratio > 0.0 && garbled_ratio <= GARBLED_RATIO_THRESHOLD {
        issues.push(QualityIssue::NonPrintableCharacters);
    }
    if !looks_like_resume {
        issues.push(QualityIssue::NotResumeLike);
    }

    let tier = if issues.iter().any(QualityIssue::is_fatal) {
        QualityTier::Poor
    } else if garbled_ratio > 0.0 || !looks_like_resume {
        QualityTier::Acceptable
    } else {
        QualityTier::Good
    };

    QualityAssessment {
        tier,
        garbled_ratio,
        char_count: text.chars().count(),
        word_count,
        resume_keywords,
        looks_like_resume,
        issues,
    }
}

/// Fraction of characters outside printable ASCII plus `\n`, `\r`, `\t`.
/// Zero for empty input.
pub fn garbled_ratio(text: &str) -> f64 {
    let mut total = 0usize;
    let mut bad = 0usize;
    for c in text.chars() {
        total += 1;
        if !is_clean_char(c) {
            bad += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        bad as f64 / total as f64
    }
}

fn is_clean_char(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\t' | ' '..='~')
}

/// Pattern checks that mark text as garbled regardless of the ratio.
pub fn garbled_patterns(text: &str) -> Vec<QualityIssue> {
    let mut found = Vec::new();
    if text.contains(ZIP_LOCAL_HEADER) {
        found.push(QualityIssue::ZipSignature);
    }
    if REPLACEMENT_RUN.is_match(text) {
        found.push(QualityIssue::ReplacementCharacters);
    }
    if NUL_RUN.is_match(text) {
        found.push(QualityIssue::NulRun);
    }
    if CONTROL_RUN.is_match(text) {
        found.push(QualityIssue::ControlCharacterRun);
    }
    found
}

pub fn find_resume_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    RESUME_VOCABULARY
        .iter()
        .filter(|term| lower.contains(*term))
        .map(|term| term.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const RESUME: &str = "Jane Doe\n\
        jane@example.com\n\
        SUMMARY\n\
        Backend engineer with eight years of experience building payment systems.\n\
        EXPERIENCE\n\
        Acme Corp, Staff Engineer\n\
        EDUCATION\n\
        BSc Computer Science, State University\n\
        SKILLS\n\
        Rust, Go, PostgreSQL\n";

    #[test]
    fn test_clean_resume_is_good() {
        let q = assess_quality(RESUME);
        assert_eq!(q.tier, QualityTier::Good);
        assert!(q.looks_like_resume);
        assert_eq!(q.garbled_ratio, 0.0);
        assert!(q.issues.is_empty());
    }

    #[test]
    fn test_short_text_is_poor() {
        let q = assess_quality("Jane Doe - resume - skills");
        assert_eq!(q.tier, QualityTier::Poor);
        assert!(q.issues.contains(&QualityIssue::TooShort));
    }

    #[test]
    fn test_twenty_percent_non_printable_is_poor() {
        let clean: String = RESUME.chars().take(200).collect();
        let mut injected = String::new();
        for (i, c) in clean.chars().enumerate() {
            injected.push(c);
            if i % 4 == 3 {
                injected.push('\u{1}');
            }
        }
        let ratio = garbled_ratio(&injected);
        assert!(ratio >= 0.19 && ratio <= 0.21, "ratio was {ratio}");
        assert_eq!(assess_quality(&injected).tier, QualityTier::Poor);

        let stripped: String = injected.chars().filter(|&c| c != '\u{1}').collect();
        let q = assess_quality(&stripped);
        assert!(!q.issues.contains(&QualityIssue::GarbledRatio));
        assert_ne!(q.tier, QualityTier::Poor);
    }

    #[test]
    fn test_zip_signature_forces_poor() {
        let text = format!("{RESUME}PK\u{3}\u{4}");
        let q = assess_quality(&text);
        assert_eq!(q.tier, QualityTier::Poor);
        assert!(q.issues.contains(&QualityIssue::ZipSignature));
    }

    #[test]
    fn test_replacement_run_forces_poor() {
        let text = format!("{RESUME}\u{FFFD}\u{FFFD}\u{FFFD}");
        assert_eq!(assess_quality(&text).tier, QualityTier::Poor);
    }

    #[test]
    fn test_two_replacement_chars_only_lower_to_acceptable() {
        let text = format!("{RESUME}\u{FFFD}\u{FFFD}");
        assert_eq!(assess_quality(&text).tier, QualityTier::Acceptable);
    }

    #[test]
    fn test_nul_run_forces_poor() {
        let text = format!("{RESUME}\0\0\0");
        assert!(assess_quality(&text).issues.contains(&QualityIssue::NulRun));
        assert_eq!(assess_quality(&text).tier, QualityTier::Poor);
    }

    #[test]
    fn test_control_run_forces_poor() {
        let text = format!("{RESUME}\u{2}\u{3}\u{5}\u{6}\u{7}");
        assert!(assess_quality(&text)
            .issues
            .contains(&QualityIssue::ControlCharacterRun));
    }

    #[test]
    fn test_whitespace_controls_are_not_garbled() {
        let text = RESUME.replace('\n', "\r\n\t");
        assert_eq!(garbled_ratio(&text), 0.0);
    }

    #[test]
    fn test_non_resume_text_is_acceptable() {
        let text = "The quick brown fox jumps over the lazy dog while the cat sleeps soundly.";
        let q = assess_quality(text);
        assert!(!q.looks_like_resume);
        assert_eq!(q.tier, QualityTier::Acceptable);
    }

    #[test]
    fn test_accented_text_is_acceptable_not_good() {
        let text = RESUME.replace("Jane", "Jos\u{e9}");
        assert_eq!(assess_quality(&text).tier, QualityTier::Acceptable);
    }

    #[test]
    fn test_keyword_detection_is_case_insensitive() {
        let found = find_resume_keywords("WORK HISTORY and Education");
        assert!(found.contains(&"work history".to_string()));
        assert!(found.contains(&"education".to_string()));
    }

    #[test]
    fn test_vocabulary_has_at_least_twenty_terms() {
        assert!(RESUME_VOCABULARY.len() >= 20);
    }

    #[test]
    fn test_compare_prefers_higher_tier_then_cleaner_text() {
        let good = assess_quality(RESUME);
        let poor = assess_quality("tiny");
        assert_eq!(good.compare(&poor), Ordering::Greater);

        let accented = assess_quality(&RESUME.replace("Jane", "Jos\u{e9}"));
        let plain_non_resume = assess_quality(
            "Plain prose without any of the magic words, long enough to pass the length check.",
        );
        assert_eq!(accented.tier, plain_non_resume.tier);
        assert_eq!(accented.compare(&plain_non_resume), Ordering::Less);
    }

    proptest! {
        #[test]
        fn prop_assessment_is_deterministic(text in "\\PC{0,300}") {
            prop_assert_eq!(assess_quality(&text), assess_quality(&text));
        }

        #[test]
        fn prop_garbled_ratio_in_unit_interval(text in any::<String>()) {
            let r = garbled_ratio(&text);
            prop_assert!((0.0..=1.0).contains(&r));
        }
    }
}
