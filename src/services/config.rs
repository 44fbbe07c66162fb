//! Shared configuration loading for the backend client.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 180;
const MAX_REQUEST_TIMEOUT_SECS: u64 = 3600;

/// Client configuration for the Legal AI Assistant backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub request_timeout: Duration,
    pub data_dir: Option<PathBuf>,
    /// Optional HS256 secret; when set, stored credentials are signature-checked.
    pub jwt_secret: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            data_dir: None,
            jwt_secret: None,
        }
    }
}

/// Trim, default the scheme and drop trailing slashes so endpoint paths join cleanly.
pub(crate) fn normalize_api_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_API_URL.to_string();
    }
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

fn parse_timeout_secs(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
        .clamp(1, MAX_REQUEST_TIMEOUT_SECS)
}

fn non_empty(value: Result<String, std::env::VarError>) -> Option<String> {
    value.ok().filter(|v| !v.trim().is_empty())
}

/// Load client configuration from `.env`/environment.
///
/// Reads:
/// - `LEGAL_API_URL` (fallback: `API_URL`)
/// - `LEGAL_REQUEST_TIMEOUT_SECS`
/// - `LEGAL_DATA_DIR`
/// - `LEGAL_JWT_SECRET`
pub fn load_client_config() -> ClientConfig {
    let _ = dotenvy::dotenv();

    let api_url = non_empty(std::env::var("LEGAL_API_URL"))
        .or_else(|| non_empty(std::env::var("API_URL")))
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    ClientConfig {
        api_url: normalize_api_url(&api_url),
        request_timeout: Duration::from_secs(parse_timeout_secs(
            std::env::var("LEGAL_REQUEST_TIMEOUT_SECS").ok().as_deref(),
        )),
        data_dir: non_empty(std::env::var("LEGAL_DATA_DIR")).map(PathBuf::from),
        jwt_secret: non_empty(std::env::var("LEGAL_JWT_SECRET")),
    }
}

/// Configuration summary that is safe to print (secrets omitted).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfig {
    pub api_url: String,
    pub request_timeout_secs: u64,
    pub verifies_signature: bool,
}

impl From<&ClientConfig> for PublicConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            api_url: config.api_url.clone(),
            request_timeout_secs: config.request_timeout.as_secs(),
            verifies_signature: config.jwt_secret.is_some(),
        }
    }
}
