//! Dataset location and download.
//!
//! `urls` maps normalized records to downloadable file locations;
//! `download` retrieves those files to per-uid directories with
//! skip-if-present idempotence and streamed progress entries. Files are
//! transferred one at a time per download stream.

mod assembly;
mod sra;

pub use assembly::{assembly_name, classify_listing, ftp_root};
pub use sra::{run_accessions, run_url};

use std::pin::Pin;
use std::time::Instant;

use async_stream::try_stream;
use futures_util::{Stream, StreamExt, TryStreamExt};
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::entrez::EntrezError;
use crate::models::{DownloadLog, SearchRequest, UrlEntry};
use crate::pipeline::EntrezClient;

/// A lazy stream of located dataset files.
pub type UrlStream = Pin<Box<dyn Stream<Item = Result<UrlEntry, EntrezError>> + Send>>;

/// A lazy stream of download progress/completion entries.
pub type DownloadStream = Pin<Box<dyn Stream<Item = Result<DownloadLog, EntrezError>> + Send>>;

/// Emit a progress entry about once per this many transferred bytes
const PROGRESS_INTERVAL_BYTES: u64 = 1 << 20;

/// Pick the concrete file to download out of a located entry: plain
/// string urls as-is; assembly filetype maps prefer the genomic fasta.
fn file_url(value: &Value) -> Option<String> {
    match value {
        Value::String(url) => Some(url.clone()),
        Value::Object(types) => {
            if let Some(url) = types
                .get("genomic")
                .and_then(|f| f.get("fna.gz"))
                .and_then(Value::as_str)
            {
                return Some(url.to_string());
            }
            types
                .values()
                .filter_map(Value::as_object)
                .flat_map(|formats| formats.values())
                .find_map(|v| v.as_str().map(str::to_string))
        }
        _ => None,
    }
}

/// Last path segment of a URL, without any query string.
fn basename(url: &str) -> &str {
    let path = url.split('?').next().unwrap_or(url);
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

impl EntrezClient {
    /// Search a database and map every matching record to its
    /// downloadable file location(s).
    ///
    /// Sequencing-run archives are derived from accession slicing; assembly
    /// files are discovered by scraping the record's canonical FTP root and
    /// classified by filename convention.
    pub fn urls(&self, request: SearchRequest) -> UrlStream {
        let client = self.clone();

        Box::pin(try_stream! {
            let db = request.db.clone();
            if db != "sra" && db != "assembly" {
                Err(EntrezError::NoLocator(db.clone()))?;
            }

            let mut records = client.search(request);
            while let Some(record) = records.try_next().await? {
                if db == "sra" {
                    for acc in run_accessions(&record) {
                        if let Some(url) = run_url(&client.config.api.sra_mirror, &acc) {
                            yield UrlEntry {
                                uid: record.uid.clone(),
                                url: Value::String(url),
                            };
                        }
                    }
                } else {
                    let Some(root) = ftp_root(&record) else {
                        debug!(uid = %record.uid, "assembly record has no ftp site list");
                        continue;
                    };
                    let listing = client.fetcher.fetch(&root).await?;
                    let files = classify_listing(&root, &listing.body);
                    if !files.is_empty() {
                        yield UrlEntry {
                            uid: record.uid.clone(),
                            url: Value::Object(files),
                        };
                    }
                }
            }
        })
    }

    /// Download every located file for a search, streaming progress and
    /// completion entries.
    ///
    /// Files land in a per-uid directory under the configured output
    /// directory; a file already present at its destination path is not
    /// re-fetched and yields a completion entry directly.
    pub fn download(&self, request: SearchRequest) -> DownloadStream {
        let client = self.clone();

        Box::pin(try_stream! {
            let out_dir = client.config.downloads.out_dir.clone();
            let mut located = client.urls(request);

            while let Some(entry) = located.try_next().await? {
                let Some(url) = file_url(&entry.url) else {
                    debug!(uid = %entry.uid, "located entry has no downloadable file");
                    continue;
                };

                let dir = out_dir.join(&entry.uid);
                fs::create_dir_all(&dir).await?;
                let name = basename(&url);
                let path = dir.join(name);
                let dest = path.display().to_string();

                if let Ok(meta) = fs::metadata(&path).await {
                    info!(path = %dest, "destination already exists, skipping transfer");
                    yield DownloadLog::completed(&entry.uid, &url, &dest, meta.len());
                    continue;
                }

                let response = client.fetcher.http().client().get(&url).send().await?;
                if !response.status().is_success() {
                    Err(EntrezError::Network(format!(
                        "HTTP {} fetching {}",
                        response.status(),
                        url
                    )))?;
                }
                let total = response.content_length();

                // Stream into a partial file, renamed into place on
                // completion so the skip-if-present check never sees a
                // half-written destination
                let part = dir.join(format!("{}.part", name));
                let mut file = fs::File::create(&part).await?;
                let mut written: u64 = 0;
                let mut window_bytes: u64 = 0;
                let mut window_start = Instant::now();
                let mut body = response.bytes_stream();

                while let Some(chunk) = body.next().await {
                    let chunk = chunk?;
                    file.write_all(&chunk).await?;
                    written += chunk.len() as u64;
                    window_bytes += chunk.len() as u64;

                    if window_bytes >= PROGRESS_INTERVAL_BYTES {
                        let speed = window_bytes as f64
                            / window_start.elapsed().as_secs_f64().max(1e-3);
                        yield DownloadLog::progress(
                            &entry.uid, &url, &dest, written, total, speed,
                        );
                        window_bytes = 0;
                        window_start = Instant::now();
                    }
                }

                file.flush().await?;
                drop(file);
                fs::rename(&part, &path).await?;

                yield DownloadLog::completed(&entry.uid, &url, &dest, written);
            }
        })
    }
}
