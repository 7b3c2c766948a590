//! Contact-block heuristics. Each pattern is a named static so it can be
//! tested on its own. Phone and location patterns are loose and can match
//! things that are not phone numbers or places (date ranges, "Skill, Skill"
//! pairs); callers treat every field as a best guess.

use once_cell::sync::Lazy;
use regex::Regex;

/// Lines at the top of a resume searched for contact details.
pub const HEADER_WINDOW_LINES: usize = 10;

pub static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());

/// Optional country code, then 3+3+4 digits with space, dot or dash
/// separators. The area code may be parenthesized.
pub static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+?\d{1,3}[ .-]?)?\(?\d{3}\)?[ .-]?\d{3}[ .-]?\d{4}").unwrap()
});

pub static LINKEDIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:https?://)?(?:[a-z]{2,3}\.)?linkedin\.com/in/[A-Za-z0-9_%-]+/?").unwrap()
});

pub static WEBSITE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)https?://[a-z0-9-]+(?:\.[a-z0-9-]+)*\.[a-z]{2,}(?:/[^\s|,;]*)?").unwrap()
});

/// `City, ST`: capitalized words, a comma, a two-letter upper-case code.
pub static CITY_STATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][a-zA-Z.]+(?: [A-Z][a-zA-Z.]+)*, ?[A-Z]{2}\b").unwrap()
});

/// `City, Country`: capitalized words on both sides of a comma.
pub static CITY_COUNTRY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][a-zA-Z]+(?: [A-Z][a-zA-Z]+)*, ?[A-Z][a-zA-Z]+(?: [A-Z][a-zA-Z]+)*\b")
        .unwrap()
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFields {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub linkedin: Option<String>,
    pub website: Option<String>,
}

/// Runs every contact pattern independently over `header`. First match wins
/// per field.
pub fn extract_contact(header: &str) -> ContactFields {
    ContactFields {
        email: find_email(header),
        phone: find_phone(header),
        location: find_location(header),
        linkedin: find_linkedin(header),
        website: find_website(header),
    }
}

pub fn find_email(text: &str) -> Option<String> {
    first_match(&EMAIL_PATTERN, text)
}

pub fn find_phone(text: &str) -> Option<String> {
    first_match(&PHONE_PATTERN, text)
}

pub fn find_linkedin(text: &str) -> Option<String> {
    first_match(&LINKEDIN_PATTERN, text)
}

/// First `http(s)://` URL that is not a LinkedIn profile.
pub fn find_website(text: &str) -> Option<String> {
    WEBSITE_PATTERN
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|url| !LINKEDIN_PATTERN.is_match(url))
        .map(|url| url.trim_end_matches(['.', ')']).to_string())
}

/// `City, ST` is tried before `City, Country`.
pub fn find_location(text: &str) -> Option<String> {
    first_match(&CITY_STATE_PATTERN, text).or_else(|| first_match(&CITY_COUNTRY_PATTERN, text))
}

fn first_match(pattern: &Regex, text: &str) -> Option<String> {
    pattern.find(text).map(|m| m.as_str().trim().to_string())
}

/// True when a line holds nothing but contact details and separators,
/// e.g. `jane@example.com | (415) 555-1234`.
pub fn is_contact_only_line(line: &str) -> bool {
    let mut rest = line.to_string();
    let mut matched = false;
    for pattern in [
        &*LINKEDIN_PATTERN,
        &*WEBSITE_PATTERN,
        &*EMAIL_PATTERN,
        &*PHONE_PATTERN,
        &*CITY_STATE_PATTERN,
    ] {
        if pattern.is_match(&rest) {
            matched = true;
            rest = pattern.replace_all(&rest, " ").into_owned();
        }
    }
    matched && rest.chars().all(is_contact_separator)
}

fn is_contact_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '|' | ',' | ';' | '/' | '-' | '\u{2022}' | '\u{b7}')
}
