//! Saved-document listing: filtering and pagination over `/saved_docs/`.

use std::str::FromStr;

use crate::services::api::SavedDocument;

pub const DEFAULT_ROWS_PER_PAGE: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocumentFilter {
    #[default]
    All,
    Indexed,
    NotIndexed,
}

impl FromStr for DocumentFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "indexed" => Ok(Self::Indexed),
            "not-indexed" | "not_indexed" | "notindexed" => Ok(Self::NotIndexed),
            other => Err(format!("Unknown document filter: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentQuery {
    pub search_term: String,
    pub filter: DocumentFilter,
    /// Zero-based.
    pub page: usize,
    pub rows_per_page: usize,
}

impl Default for DocumentQuery {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            filter: DocumentFilter::All,
            page: 0,
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPage {
    pub rows: Vec<SavedDocument>,
    pub total_matching: usize,
    pub page: usize,
    pub page_count: usize,
    pub indexed: usize,
    pub not_indexed: usize,
}

fn matches_term(doc: &SavedDocument, term: &str) -> bool {
    term.is_empty()
        || doc.indexid.to_lowercase().contains(term)
        || doc.username.to_lowercase().contains(term)
        || doc.filepath.to_lowercase().contains(term)
}

fn matches_filter(doc: &SavedDocument, filter: DocumentFilter) -> bool {
    match filter {
        DocumentFilter::All => true,
        DocumentFilter::Indexed => doc.is_indexed,
        DocumentFilter::NotIndexed => !doc.is_indexed,
    }
}

/// Apply search term, status filter and pagination.
///
/// Counts cover the whole listing; a page past the end is clamped to the
/// last page.
pub fn paginate(docs: &[SavedDocument], query: &DocumentQuery) -> DocumentPage {
    let term = query.search_term.trim().to_lowercase();
    let matching: Vec<&SavedDocument> = docs
        .iter()
        .filter(|doc| matches_term(doc, &term) && matches_filter(doc, query.filter))
        .collect();

    let rows_per_page = query.rows_per_page.max(1);
    let page_count = matching.len().div_ceil(rows_per_page).max(1);
    let page = query.page.min(page_count - 1);

    let rows = matching
        .iter()
        .skip(page * rows_per_page)
        .take(rows_per_page)
        .map(|doc| (*doc).clone())
        .collect();
    let indexed = docs.iter().filter(|doc| doc.is_indexed).count();

    DocumentPage {
        rows,
        total_matching: matching.len(),
        page,
        page_count,
        indexed,
        not_indexed: docs.len() - indexed,
    }
}
