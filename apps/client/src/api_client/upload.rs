//! Resume payloads and the client-side checks run before any upload.

use std::path::Path;

use crate::errors::AppError;

/// Largest resume the backend accepts.
pub const MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;
const ACCEPTED_EXTENSION: &str = "pdf";

/// A resume document ready to be sent as a multipart file part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ResumeFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Reads a resume from disk. Validation happens separately in [`ResumeFile::validate`].
    pub fn read(path: &Path) -> Result<Self, AppError> {
        let bytes = std::fs::read(path).map_err(|e| {
            AppError::Validation(format!("Cannot read resume '{}': {e}", path.display()))
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "resume.pdf".to_string());
        Ok(Self::new(file_name, bytes))
    }

    /// Rejects empty, oversized, and non-PDF payloads.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.bytes.is_empty() {
            return Err(AppError::Validation(format!(
                "Resume file '{}' is empty",
                self.file_name
            )));
        }
        if self.bytes.len() > MAX_RESUME_BYTES {
            return Err(AppError::Validation(format!(
                "File size must be less than {}MB",
                MAX_RESUME_BYTES / (1024 * 1024)
            )));
        }
        let is_pdf = Path::new(&self.file_name)
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case(ACCEPTED_EXTENSION))
            .unwrap_or(false);
        if !is_pdf {
            return Err(AppError::Validation(format!(
                "Only .{ACCEPTED_EXTENSION} files are allowed"
            )));
        }
        Ok(())
    }

    pub(crate) fn to_part(&self) -> Result<reqwest::multipart::Part, reqwest::Error> {
        reqwest::multipart::Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str("application/pdf")
    }
}

/// Job descriptions and rewrite sections must carry text after trimming.
pub fn require_text(value: &str, what: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("Please enter {what}")));
    }
    Ok(())
}
