//! Document upload wizard.

use serde::Serialize;

use crate::services::api::{
    ApiClient, ApiError, DEFAULT_UPLOAD_URL_FIELD, FileAttachment, MIME_DOC, MIME_DOCX, MIME_PDF,
    MIME_TEXT, UploadReceipt,
};

pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;
pub const ACCEPTED_MIME_TYPES: [&str; 4] = [MIME_PDF, MIME_DOC, MIME_DOCX, MIME_TEXT];

pub const FILE_TOO_LARGE: &str = "File size exceeds the 5MB limit.";
pub const FILE_TYPE_UNSUPPORTED: &str =
    "File type not supported. Please upload PDF, DOC, DOCX, or TXT files.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStep {
    Select,
    Review,
    Uploading,
    Done,
}

impl UploadStep {
    pub const ALL: [UploadStep; 4] = [
        UploadStep::Select,
        UploadStep::Review,
        UploadStep::Uploading,
        UploadStep::Done,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            UploadStep::Select => "Select File",
            UploadStep::Review => "Review",
            UploadStep::Uploading => "Upload",
            UploadStep::Done => "Complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Idle,
    Uploading,
    Success,
    Error,
}

pub fn validate_file(file: &FileAttachment) -> Result<(), ApiError> {
    if file.size() > MAX_FILE_SIZE {
        return Err(ApiError::invalid_input(FILE_TOO_LARGE));
    }
    if !ACCEPTED_MIME_TYPES.contains(&file.mime_type.as_str()) {
        return Err(ApiError::invalid_input(FILE_TYPE_UNSUPPORTED));
    }
    Ok(())
}

#[derive(Debug)]
pub struct UploadWizard {
    step: UploadStep,
    status: UploadStatus,
    file: Option<FileAttachment>,
    file_error: Option<String>,
    receipt: Option<UploadReceipt>,
}

impl Default for UploadWizard {
    fn default() -> Self {
        Self {
            step: UploadStep::Select,
            status: UploadStatus::Idle,
            file: None,
            file_error: None,
            receipt: None,
        }
    }
}

impl UploadWizard {
    pub fn step(&self) -> UploadStep {
        self.step
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn file(&self) -> Option<&FileAttachment> {
        self.file.as_ref()
    }

    pub fn file_error(&self) -> Option<&str> {
        self.file_error.as_deref()
    }

    pub fn receipt(&self) -> Option<&UploadReceipt> {
        self.receipt.as_ref()
    }

    /// Validate and stage a file. A rejected file clears any previous selection.
    pub fn select(&mut self, file: FileAttachment) -> Result<(), ApiError> {
        self.file_error = None;
        if let Err(err) = validate_file(&file) {
            self.file_error = Some(err.message().to_string());
            self.file = None;
            return Err(err);
        }
        self.file = Some(file);
        self.step = UploadStep::Review;
        Ok(())
    }

    /// Enter the uploading step, returning the staged file.
    pub fn begin(&mut self) -> Option<FileAttachment> {
        let file = self.file.clone()?;
        self.status = UploadStatus::Uploading;
        self.step = UploadStep::Uploading;
        Some(file)
    }

    pub fn finish(&mut self, result: Result<UploadReceipt, ApiError>) {
        match result {
            Ok(receipt) => {
                log::debug!("Upload accepted: request {}", receipt.request_id);
                self.receipt = Some(receipt);
                self.status = UploadStatus::Success;
                self.step = UploadStep::Done;
            }
            Err(err) => {
                log::error!("Upload failed: {}", err);
                self.status = UploadStatus::Error;
                self.step = UploadStep::Uploading;
            }
        }
    }

    pub async fn upload(&mut self, client: &ApiClient) -> UploadStatus {
        if let Some(file) = self.begin() {
            let result = client
                .upload_document(DEFAULT_UPLOAD_URL_FIELD, &file)
                .await;
            self.finish(result);
        }
        self.status
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
