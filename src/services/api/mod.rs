//! REST transport for the Legal AI Assistant backend.
//!
//! Notes:
//! - Every response goes through a typed serde decode; shape mismatches are
//!   reported as `ApiError::MalformedResponse` instead of leaking defaults.
//! - Cancellation lives one level up (`services::chat`); this layer only
//!   performs the call.

mod attachment;
mod client;
mod endpoints;
mod error;
mod types;

pub use attachment::{
    FileAttachment, MIME_DOC, MIME_DOCX, MIME_OCTET_STREAM, MIME_PDF, MIME_TEXT, mime_for_name,
};
pub use client::{ApiClient, ChatBackend, DEFAULT_UPLOAD_URL_FIELD};
pub use endpoints::Endpoint;
pub use error::ApiError;
pub use types::{
    ChatReply, LoginRequest, LoginResponse, SavedDocument, SearchResultItem, SignupForm,
    UploadReceipt,
};
