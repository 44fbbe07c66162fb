use std::path::Path;

use super::error::ApiError;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_OCTET_STREAM: &str = "application/octet-stream";

/// A file picked by the user, held in memory until it is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct FileAttachment {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub fn mime_for_name(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => MIME_PDF,
        "doc" => MIME_DOC,
        "docx" => MIME_DOCX,
        "txt" => MIME_TEXT,
        _ => MIME_OCTET_STREAM,
    }
}

impl FileAttachment {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_for_name(&name).to_string();
        Self {
            name,
            mime_type,
            bytes,
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ApiError::invalid_input(format!("Invalid file path: {}", path.display())))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(name, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub(crate) fn to_part(&self) -> Result<reqwest::multipart::Part, ApiError> {
        reqwest::multipart::Part::bytes(self.bytes.clone())
            .file_name(self.name.clone())
            .mime_str(&self.mime_type)
            .map_err(|e| ApiError::invalid_input(format!("Invalid MIME type: {e}")))
    }
}
