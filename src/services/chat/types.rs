use serde::{Deserialize, Serialize};

use crate::services::api::FileAttachment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// Delivery status of a bubble. Only moves forward:
/// `Initial`/`Pending` -> `Success`/`Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Success,
    Error,
    Initial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub url: Option<String>,
}

impl From<&FileAttachment> for FileDescriptor {
    fn from(file: &FileAttachment) -> Self {
        Self {
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            size: file.size(),
            url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub seq: u64,
    pub text: String,
    pub file: Option<FileDescriptor>,
    pub sender: Sender,
    pub created_at_ms: u64,
    pub status: MessageStatus,
    pub reasoning: Option<String>,
    pub show_reasoning: bool,
}

impl Message {
    pub fn has_reasoning(&self) -> bool {
        self.reasoning
            .as_deref()
            .map(|r| !r.trim().is_empty())
            .unwrap_or(false)
    }
}

/// One outbound call produced by a submission.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub request_id: String,
    pub message_id: String,
    pub question: String,
    pub file: Option<FileAttachment>,
}

/// Ties an in-flight call to the user bubble that started it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub request_id: String,
    pub message_id: String,
}

/// Panel notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PanelEvent {
    Opened,
    Closed,
    MessageAppended { message: Message },
    TypingChanged { typing: bool },
    RequestCancelled { request_id: String },
    Cleared,
    ReasoningToggled { message_id: String, shown: bool },
    FileSelected { file: FileDescriptor },
    FileRemoved,
}
