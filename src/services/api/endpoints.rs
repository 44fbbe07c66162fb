use reqwest::Method;

/// The fixed backend surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Search,
    Chat,
    DocChat,
    Login,
    Signup,
    Upload,
    SavedDocs,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Search => "/search",
            Endpoint::Chat => "/chatbot",
            Endpoint::DocChat => "/doc_chatbot",
            Endpoint::Login => "/login",
            Endpoint::Signup => "/register",
            Endpoint::Upload => "/upload_document/",
            Endpoint::SavedDocs => "/saved_docs/",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Endpoint::Search | Endpoint::Chat | Endpoint::SavedDocs => Method::GET,
            Endpoint::DocChat | Endpoint::Login | Endpoint::Signup | Endpoint::Upload => {
                Method::POST
            }
        }
    }

    /// Join onto a normalized base URL (no trailing slash).
    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path())
    }
}
