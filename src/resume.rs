use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::errors::{ResolutionError, ValidationError};
use crate::models::GenerationTarget;
use crate::quiz_api::QuizApi;
use crate::topic_resolver::with_timeout;

// Import logging macros
use crate::{log_service_start, log_service_success};

pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;
const ALLOWED_EXTENSIONS: [&str; 3] = ["pdf", "docx", "doc"];

/// A resume file checked locally before it is sent anywhere
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    file_name: String,
    bytes: Vec<u8>,
}

impl ResumeUpload {
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Result<Self, ValidationError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ValidationError::UnsupportedFileType(file_name.to_string()));
        }
        if bytes.is_empty() {
            return Err(ValidationError::EmptyFile(file_name.to_string()));
        }
        if bytes.len() > MAX_RESUME_BYTES {
            return Err(ValidationError::FileTooLarge {
                size: bytes.len(),
                max: MAX_RESUME_BYTES,
            });
        }

        Ok(Self {
            file_name: file_name.to_string(),
            bytes,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Turns an uploaded resume into a generation target, the way topic
/// resolution turns a name into one
#[derive(Clone)]
pub struct ResumeResolver {
    api: Arc<dyn QuizApi>,
    request_timeout: Duration,
}

impl ResumeResolver {
    pub fn new(api: Arc<dyn QuizApi>, request_timeout: Duration) -> Self {
        Self { api, request_timeout }
    }

    pub async fn resolve(&self, upload: ResumeUpload) -> Result<GenerationTarget, ResolutionError> {
        log_service_start!("resume_resolver", "upload", topic = upload.file_name);
        debug!(file = %upload.file_name(), size_bytes = upload.size(), "Uploading resume");

        let ResumeUpload { file_name, bytes } = upload;
        let id = with_timeout(self.request_timeout, self.api.upload_resume(&file_name, bytes))
            .await
            .map_err(|source| ResolutionError::Unreachable {
                topic: file_name.clone(),
                source,
            })?;

        log_service_success!("resume_resolver", "upload", topic = file_name, format!("resume id {}", id));
        Ok(GenerationTarget::Resume(id))
    }
}
