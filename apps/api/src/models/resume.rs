use serde::{Deserialize, Serialize};

/// A titled block of resume body text. `content` keeps the source line breaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeSection {
    pub title: String,
    pub content: String,
}

/// Output of the resume text parser: a contact block plus sections in
/// source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredResume {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub linkedin: Option<String>,
    pub website: Option<String>,
    pub sections: Vec<ResumeSection>,
}

impl StructuredResume {
    pub fn section(&self, title: &str) -> Option<&ResumeSection> {
        self.sections
            .iter()
            .find(|s| s.title.eq_ignore_ascii_case(title))
    }

    pub fn has_contact_fields(&self) -> bool {
        self.name.is_some()
            || self.email.is_some()
            || self.phone.is_some()
            || self.location.is_some()
            || self.linkedin.is_some()
            || self.website.is_some()
    }
}
