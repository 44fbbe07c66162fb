use serde::{Deserialize, Serialize};

/// Failure taxonomy for every backend call.
///
/// `Aborted` is kept apart from the other kinds so callers can swallow
/// cancellations without treating them as failures.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ApiError {
    #[error("Aborted: {message}")]
    Aborted { message: String },
    #[error("Network: {message}")]
    Network { message: String },
    #[error("Status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("MalformedResponse: {message}")]
    MalformedResponse { message: String },
    #[error("InvalidInput: {message}")]
    InvalidInput { message: String },
    #[error("Credential: {message}")]
    Credential { message: String },
    #[error("Io: {message}")]
    Io { message: String },
}

impl ApiError {
    pub fn aborted(message: impl Into<String>) -> Self {
        Self::Aborted {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential {
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Aborted { message }
            | Self::Network { message }
            | Self::Status { message, .. }
            | Self::MalformedResponse { message }
            | Self::InvalidInput { message }
            | Self::Credential { message }
            | Self::Io { message } => message,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::malformed(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::status(status.as_u16(), err.to_string());
        }
        Self::network(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(err.to_string())
    }
}
