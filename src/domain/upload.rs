use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Local rejection of a resume before it reaches the network
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("File must be under {max_size_mb} MB")]
    TooLarge { max_size_mb: u64 },
    #[error("Please upload a {accepted} file")]
    UnsupportedType { accepted: String },
}

/// A resume ready to be uploaded
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ResumeFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumeFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ResumeFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
    }
}

/// Size and type limits for resume uploads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPolicy {
    pub max_size_mb: u64,
    pub accepted_extensions: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_size_mb: 10,
            accepted_extensions: vec!["pdf".into(), "docx".into(), "txt".into()],
        }
    }
}

impl UploadPolicy {
    pub fn max_bytes(&self) -> u64 {
        self.max_size_mb * 1024 * 1024
    }

    /// Size is checked before type, so an oversized file of the wrong type reports size.
    pub fn validate(&self, file: &ResumeFile) -> Result<(), ValidationError> {
        if file.size() > self.max_bytes() {
            return Err(ValidationError::TooLarge {
                max_size_mb: self.max_size_mb,
            });
        }
        let accepted = file.extension().is_some_and(|ext| {
            self.accepted_extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(&ext))
        });
        if !accepted {
            return Err(ValidationError::UnsupportedType {
                accepted: self.accepted_label(),
            });
        }
        Ok(())
    }

    /// "PDF, DOCX, or TXT"
    fn accepted_label(&self) -> String {
        let names: Vec<String> = self
            .accepted_extensions
            .iter()
            .map(|ext| ext.to_uppercase())
            .collect();
        match names.as_slice() {
            [] => String::from("supported"),
            [one] => one.clone(),
            [one, two] => format!("{one} or {two}"),
            [init @ .., last] => format!("{}, or {last}", init.join(", ")),
        }
    }
}
