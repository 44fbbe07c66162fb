use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::plugins::auth::AuthContext;
use crate::services::config::{ClientConfig, normalize_api_url};

use super::attachment::FileAttachment;
use super::endpoints::Endpoint;
use super::error::ApiError;
use super::types::{
    ChatReply, LoginRequest, LoginResponse, SavedDocument, SearchResultItem, SignupForm,
    UploadReceipt, decode_search_hits,
};

/// Longest slice of an error body kept in `ApiError::Status`.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Default `url` form field sent with uploads when the user gives none.
pub const DEFAULT_UPLOAD_URL_FIELD: &str = " ";

/// The two calls a chat panel needs.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, question: &str) -> Result<ChatReply, ApiError>;
    async fn doc_chat(&self, question: &str, file: &FileAttachment)
    -> Result<ChatReply, ApiError>;
}

/// REST client for the assistant backend.
///
/// Attaches the bearer credential from the shared [`AuthContext`] on every
/// authenticated call. No retries: failures surface to the caller as-is.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth: AuthContext,
}

fn truncate_body(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_string();
    }
    body.chars().take(MAX_ERROR_BODY_CHARS).collect::<String>() + "…"
}

async fn read_success_body(response: reqwest::Response) -> Result<Vec<u8>, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        log::warn!("Backend returned {}: {}", status, truncate_body(&body));
        return Err(ApiError::status(status.as_u16(), truncate_body(&body)));
    }
    let bytes = response.bytes().await?;
    Ok(bytes.to_vec())
}

async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let body = read_success_body(response).await?;
    serde_json::from_slice(&body).map_err(|e| ApiError::malformed(e.to_string()))
}

impl ApiClient {
    pub fn new(config: &ClientConfig, auth: AuthContext) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(8)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: normalize_api_url(&config.api_url),
            auth,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    /// Absolute link for backend-relative paths such as search `htm`/`pdf`.
    pub fn resolve_link(&self, path: &str) -> String {
        if path.contains("://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn anonymous(&self, endpoint: Endpoint) -> reqwest::RequestBuilder {
        self.http
            .request(endpoint.method(), endpoint.url(&self.base_url))
    }

    fn authorized(&self, endpoint: Endpoint) -> reqwest::RequestBuilder {
        let builder = self.anonymous(endpoint);
        match self.auth.bearer() {
            Some(token) => builder.bearer_auth(token.as_str()),
            None => builder,
        }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchResultItem>, ApiError> {
        let response = self
            .authorized(Endpoint::Search)
            .query(&[("q", query)])
            .send()
            .await?;
        let body = read_success_body(response).await?;
        decode_search_hits(&body)
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let response = self.anonymous(Endpoint::Login).json(request).send().await?;
        decode_json(response).await
    }

    pub async fn register(&self, form: &SignupForm) -> Result<serde_json::Value, ApiError> {
        let response = self.anonymous(Endpoint::Signup).json(form).send().await?;
        decode_json(response).await
    }

    pub async fn upload_document(
        &self,
        url: &str,
        file: &FileAttachment,
    ) -> Result<UploadReceipt, ApiError> {
        let form = reqwest::multipart::Form::new()
            .text("url", url.to_string())
            .part("file", file.to_part()?);
        let response = self
            .authorized(Endpoint::Upload)
            .multipart(form)
            .send()
            .await?;
        decode_json(response).await
    }

    /// Documents saved by the signed-in user. Requires a valid credential.
    pub async fn saved_docs(&self) -> Result<Vec<SavedDocument>, ApiError> {
        self.auth.guard()?;
        let response = self.authorized(Endpoint::SavedDocs).send().await?;
        decode_json(response).await
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn chat(&self, question: &str) -> Result<ChatReply, ApiError> {
        let response = self
            .authorized(Endpoint::Chat)
            .query(&[("q", question)])
            .send()
            .await?;
        decode_json(response).await
    }

    async fn doc_chat(
        &self,
        question: &str,
        file: &FileAttachment,
    ) -> Result<ChatReply, ApiError> {
        let form = reqwest::multipart::Form::new()
            .text("q", question.to_string())
            .part("file", file.to_part()?);
        let response = self
            .authorized(Endpoint::DocChat)
            .multipart(form)
            .send()
            .await?;
        decode_json(response).await
    }
}
