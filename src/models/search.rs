//! Search request and pagination models.

use serde::{Deserialize, Serialize};

/// Default number of records requested per result page.
pub const DEFAULT_PAGE_SIZE: u64 = 500;

/// A term-based search against one Entrez database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Database name (e.g. "sra", "assembly", "taxonomy")
    pub db: String,

    /// Free-text search term
    pub term: String,

    /// Hard cap on the total number of records retrieved
    pub limit: Option<u64>,

    /// Page size ("throughput"); clamped to `limit` when both are set
    pub page_size: Option<u64>,
}

impl SearchRequest {
    /// Create a new search request
    pub fn new(db: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            db: db.into(),
            term: term.into(),
            limit: None,
            page_size: None,
        }
    }

    /// Cap the total number of records retrieved
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the page size
    pub fn page_size(mut self, page_size: u64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Effective page size: the configured size (or the default), never
    /// exceeding `limit` when one is set.
    pub fn effective_page_size(&self) -> u64 {
        let size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        match self.limit {
            Some(limit) if limit > 0 => size.min(limit),
            _ => size,
        }
    }
}

/// Opaque history-server handle returned by an initial search.
///
/// The upstream service stores the matched uid set server-side; subsequent
/// page requests re-reference it through this token instead of resending
/// the full query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub webenv: String,
    pub querykey: String,
}

/// The decoded outcome of an initial search request: a result count plus
/// the session token needed to page through the matches.
#[derive(Debug, Clone)]
pub struct SearchSession {
    pub db: String,
    pub count: u64,
    pub token: SessionToken,
    /// URL of the originating search request, kept for error reporting and
    /// for the singleton short-circuit.
    pub search_url: String,
}

/// One bounded slice of a larger result set. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageCursor {
    pub db: String,
    pub token: SessionToken,
    pub offset: u64,
    pub page_size: u64,
    /// When set, the page request reuses this URL verbatim instead of a
    /// paginated summary URL (singleton result sets).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reuse_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_page_size_default() {
        let req = SearchRequest::new("sra", "human");
        assert_eq!(req.effective_page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_effective_page_size_clamped_to_limit() {
        let req = SearchRequest::new("sra", "human").limit(20).page_size(100);
        assert_eq!(req.effective_page_size(), 20);
    }

    #[test]
    fn test_effective_page_size_smaller_than_limit() {
        let req = SearchRequest::new("sra", "human").limit(100).page_size(10);
        assert_eq!(req.effective_page_size(), 10);
    }

    #[test]
    fn test_effective_page_size_never_zero() {
        let req = SearchRequest::new("sra", "human").page_size(0);
        assert_eq!(req.effective_page_size(), 1);
    }
}
