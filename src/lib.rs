//! # Entrez Stream
//!
//! A streaming client for the NCBI Entrez E-utilities: paginated search,
//! cross-database linking, record normalization and dataset download.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Record, SearchRequest, LinkResult, etc.)
//! - [`entrez`]: Endpoint URL construction and the per-database registry
//! - [`pipeline`]: Lazy search/link/fetch streams with retrying page fetches
//! - [`download`]: Dataset file location and streamed downloads
//! - [`utils`]: HTTP client and XML-to-JSON conversion
//! - [`config`]: Configuration management

pub mod config;
pub mod download;
pub mod entrez;
pub mod models;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use entrez::EntrezError;
pub use models::{DownloadLog, LinkResult, Record, SearchRequest, UrlEntry};
pub use pipeline::EntrezClient;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
