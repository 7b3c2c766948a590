use std::fmt;
use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A file as received at the system boundary.
///
/// `filename` and `mime_type` are whatever the client claimed. They are hints
/// for logging and diagnostics only; format detection never trusts them.
#[derive(Debug, Clone)]
pub struct RawUpload {
    pub bytes: Bytes,
    pub filename: String,
    pub mime_type: Option<String>,
}

impl RawUpload {
    pub fn new(bytes: impl Into<Bytes>, filename: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            filename: filename.into(),
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Format suggested by the declared MIME type, falling back to the
    /// filename extension. `None` when neither says anything useful.
    pub fn declared_format(&self) -> Option<DetectedFormat> {
        self.mime_type
            .as_deref()
            .and_then(DetectedFormat::from_mime_type)
            .or_else(|| DetectedFormat::from_filename(&self.filename))
    }
}

/// File format as determined by byte-signature inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectedFormat {
    Pdf,
    Docx,
    Txt,
    Unknown,
}

impl DetectedFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectedFormat::Pdf => "pdf",
            DetectedFormat::Docx => "docx",
            DetectedFormat::Txt => "txt",
            DetectedFormat::Unknown => "unknown",
        }
    }

    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())?;
        match ext.as_str() {
            "pdf" => Some(DetectedFormat::Pdf),
            "docx" => Some(DetectedFormat::Docx),
            "txt" | "text" | "md" => Some(DetectedFormat::Txt),
            _ => None,
        }
    }

    pub fn from_mime_type(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "application/pdf" => Some(DetectedFormat::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(DetectedFormat::Docx)
            }
            "text/plain" | "text/markdown" => Some(DetectedFormat::Txt),
            _ => None,
        }
    }
}

impl fmt::Display for DetectedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
