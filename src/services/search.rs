//! Search results page state.

use crate::services::api::{ApiClient, ApiError, SearchResultItem};

/// Characters of section text shown before the preview is cut.
pub const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    Uninitialized,
    Loading { previous: Option<T> },
    Loaded(T),
    Error { message: String, previous: Option<T> },
}

impl<T> FetchState<T> {
    fn take_data(&mut self) -> Option<T> {
        match std::mem::replace(self, FetchState::Uninitialized) {
            FetchState::Loaded(data) => Some(data),
            FetchState::Loading { previous } | FetchState::Error { previous, .. } => previous,
            FetchState::Uninitialized => None,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            FetchState::Loaded(data) => Some(data),
            FetchState::Loading { previous } | FetchState::Error { previous, .. } => {
                previous.as_ref()
            }
            FetchState::Uninitialized => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading { .. })
    }
}

pub fn section_preview(section: &str) -> String {
    if section.chars().count() <= PREVIEW_CHARS {
        return section.to_string();
    }
    section.chars().take(PREVIEW_CHARS).collect::<String>() + "..."
}

#[derive(Debug)]
pub struct SearchPage {
    query: Option<String>,
    state: FetchState<Vec<SearchResultItem>>,
    bookmarks: Vec<String>,
}

impl Default for SearchPage {
    fn default() -> Self {
        Self {
            query: None,
            state: FetchState::Uninitialized,
            bookmarks: Vec::new(),
        }
    }
}

impl SearchPage {
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn state(&self) -> &FetchState<Vec<SearchResultItem>> {
        &self.state
    }

    /// Move to `Loading` for a new query. Blank queries leave the page untouched.
    pub fn begin(&mut self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }
        self.query = Some(query.to_string());
        let previous = self.state.take_data();
        self.state = FetchState::Loading { previous };
        true
    }

    pub fn finish(&mut self, result: Result<Vec<SearchResultItem>, ApiError>) {
        let previous = self.state.take_data();
        self.state = match result {
            Ok(items) => FetchState::Loaded(items),
            Err(err) => {
                log::error!("Error fetching search results: {}", err);
                FetchState::Error {
                    message: err.message().to_string(),
                    previous,
                }
            }
        };
    }

    pub async fn fetch(
        &mut self,
        client: &ApiClient,
        query: &str,
    ) -> &FetchState<Vec<SearchResultItem>> {
        if self.begin(query) {
            let query = self.query.clone().unwrap_or_default();
            let result = client.search(&query).await;
            self.finish(result);
        }
        &self.state
    }

    /// Returns whether the document is bookmarked after the toggle.
    pub fn toggle_bookmark(&mut self, doc_id: &str) -> bool {
        if let Some(index) = self.bookmarks.iter().position(|id| id == doc_id) {
            self.bookmarks.remove(index);
            false
        } else {
            self.bookmarks.push(doc_id.to_string());
            true
        }
    }

    pub fn is_bookmarked(&self, doc_id: &str) -> bool {
        self.bookmarks.iter().any(|id| id == doc_id)
    }
}
