//! Entrez E-utilities endpoint definitions, error taxonomy and the
//! per-database capability registry.

mod query;
mod registry;

pub use query::{fetch_url, link_url, page_url, search_url};
pub use registry::{lookup, DbSpec, PostFilter};

/// Default E-utilities API root. Overridable through configuration, which
/// the test suite uses to point the pipelines at a local mock server.
pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/";

/// Default mirror root for accession-derived sequencing-run archives.
pub const DEFAULT_SRA_MIRROR: &str =
    "https://ftp-trace.ncbi.nlm.nih.gov/sra/sra-instant/reads/ByRun/sra/";

/// Errors surfaced by the pipelines
#[derive(Debug, thiserror::Error)]
pub enum EntrezError {
    /// Database name not present in the registry; detected before any
    /// network call is made
    #[error("unknown database: {0}")]
    UnknownDatabase(String),

    /// A transient failure kept recurring past the retry cap
    #[error("request failed after {attempts} attempts: {url}")]
    RetriesExhausted { url: String, attempts: u32 },

    /// The search response lacked the session token or result count.
    /// Fatal: repeated structural malformation indicates a request-shape
    /// problem, not a transient glitch.
    #[error("malformed search response (missing webenv/count): {url}")]
    MalformedSearch { url: String },

    /// The database exists but has no dataset file-layout rules
    #[error("no dataset locator for database: {0}")]
    NoLocator(String),

    /// Network or HTTP transport error
    #[error("network error: {0}")]
    Network(String),

    /// Parsing error (JSON, XML, HTML)
    #[error("parse error: {0}")]
    Parse(String),

    /// File system error during download
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for EntrezError {
    fn from(err: reqwest::Error) -> Self {
        EntrezError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for EntrezError {
    fn from(err: serde_json::Error) -> Self {
        EntrezError::Parse(format!("JSON: {}", err))
    }
}

impl From<quick_xml::DeError> for EntrezError {
    fn from(err: quick_xml::DeError) -> Self {
        EntrezError::Parse(format!("XML: {}", err))
    }
}

impl From<quick_xml::Error> for EntrezError {
    fn from(err: quick_xml::Error) -> Self {
        EntrezError::Parse(format!("XML: {}", err))
    }
}
