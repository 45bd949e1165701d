//! Record, link and download models emitted by the pipelines.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One normalized per-uid record from a result page.
///
/// The field set is database-specific (sequencing-run metadata, assembly
/// metadata, ...) so everything beyond the uid lives in a free-form map
/// that serializes flattened alongside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub uid: String,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            fields: Map::new(),
        }
    }

    /// Look up a field by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Insert or replace a field
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }
}

/// All destination-database uids resolved for one source uid.
///
/// Destinations are batched into one ordered list per source uid, not
/// emitted one result per destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkResult {
    pub src_db: String,
    pub dest_db: String,
    pub src_uid: String,
    pub dest_uids: Vec<String>,
}

/// A downloadable location for one record.
///
/// `url` is a plain string for accession-derived archives (sra) and a
/// per-filetype map (`{type: {format: url}}`) for scraped assembly
/// directory listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlEntry {
    pub uid: String,
    pub url: Value,
}

/// Download lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Downloading,
    Completed,
}

/// One progress or completion entry from a download stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadLog {
    pub uid: String,
    pub url: String,
    pub path: String,
    pub status: DownloadStatus,

    /// Bytes written so far (final size on completion)
    pub bytes: u64,

    /// Total size from the Content-Length header, when the server sent one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,

    /// Instantaneous transfer speed in bytes per second
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

impl DownloadLog {
    /// A progress entry for an in-flight transfer
    pub fn progress(
        uid: &str,
        url: &str,
        path: &str,
        bytes: u64,
        total: Option<u64>,
        speed: f64,
    ) -> Self {
        Self {
            uid: uid.to_string(),
            url: url.to_string(),
            path: path.to_string(),
            status: DownloadStatus::Downloading,
            bytes,
            total,
            percent: total
                .filter(|t| *t > 0)
                .map(|t| (bytes as f64 / t as f64 * 100.0).min(100.0)),
            speed: Some(speed),
        }
    }

    /// The final entry for a finished (or already-present) file
    pub fn completed(uid: &str, url: &str, path: &str, bytes: u64) -> Self {
        Self {
            uid: uid.to_string(),
            url: url.to_string(),
            path: path.to_string(),
            status: DownloadStatus::Completed,
            bytes,
            total: Some(bytes),
            percent: Some(100.0),
            speed: None,
        }
    }
}
