//! Core data structures shared across the pipelines.

mod record;
mod search;

pub use record::{DownloadLog, DownloadStatus, LinkResult, Record, UrlEntry};
pub use search::{
    PageCursor, SearchRequest, SearchSession, SessionToken, DEFAULT_PAGE_SIZE,
};
