//! The search/fetch pipelines: term -> search -> pagination -> retrying
//! page fetches -> normalized records, as pull-based lazy streams.
//!
//! Pages are fetched and normalized in strict sequence; a slow consumer
//! suspends production because nothing is polled ahead, and dropping the
//! stream stops issuing further requests. Page 0 records always precede
//! page 1 records.

mod fetcher;
pub mod linkage;
mod normalize;
mod paginate;

pub use fetcher::{FetchedPage, Fetcher};
pub use normalize::{normalize_record, parse_page, Page};
pub use paginate::{page_cursors, parse_session};

use std::pin::Pin;
use std::time::Duration;

use async_stream::try_stream;
use futures_util::Stream;
use tracing::debug;

use crate::config::Config;
use crate::entrez::{self, lookup, EntrezError};
use crate::models::{LinkResult, Record, SearchRequest};
use crate::utils::HttpClient;

/// A lazy stream of normalized records.
pub type RecordStream = Pin<Box<dyn Stream<Item = Result<Record, EntrezError>> + Send>>;

/// A lazy stream of resolved cross-references.
pub type LinkStream = Pin<Box<dyn Stream<Item = Result<LinkResult, EntrezError>> + Send>>;

/// A lazy stream of raw fetched data chunks (one per page).
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, EntrezError>> + Send>>;

/// Client for the Entrez pipelines. Cheap to clone; streams returned by
/// its methods borrow nothing from it.
#[derive(Debug, Clone)]
pub struct EntrezClient {
    pub(crate) config: Config,
    pub(crate) fetcher: Fetcher,
}

impl EntrezClient {
    /// Build a client from configuration
    pub fn new(config: Config) -> Result<Self, EntrezError> {
        let http = HttpClient::new(Duration::from_secs(config.api.timeout_secs))?;
        let fetcher = Fetcher::new(http, config.retry.clone());
        Ok(Self { config, fetcher })
    }

    /// Run the initial search request and decode it into a session.
    pub(crate) async fn open_session(
        &self,
        request: &SearchRequest,
    ) -> Result<crate::models::SearchSession, EntrezError> {
        let url = entrez::search_url(&self.config.api.base_url, &request.db, &request.term);
        let page = self.fetcher.fetch(&url).await?;
        parse_session(&request.db, &page.url, &page.body)
    }

    /// Search a database, streaming one normalized record per matching uid.
    pub fn search(&self, request: SearchRequest) -> RecordStream {
        let client = self.clone();

        Box::pin(try_stream! {
            let spec = lookup(&request.db)?;
            let session = client.open_session(&request).await?;
            debug!(db = %request.db, count = session.count, "search session opened");

            let cursors = page_cursors(&session, request.limit, request.effective_page_size());
            let mut emitted: u64 = 0;

            'pages: for cursor in cursors {
                let url = match &cursor.reuse_url {
                    Some(url) => url.clone(),
                    None => entrez::page_url(
                        &client.config.api.base_url,
                        &cursor.db,
                        &cursor.token,
                        cursor.offset,
                        cursor.page_size,
                    ),
                };

                let fetched = client.fetcher.fetch(&url).await?;
                let mut page = parse_page(&fetched.body)?;
                let uids = std::mem::take(&mut page.uids);

                for uid in uids {
                    let Some(raw) = page.take(&uid) else { continue };
                    if let Some(record) = normalize_record(spec, &uid, raw)? {
                        yield record;
                        emitted += 1;
                        if request.limit.is_some_and(|limit| emitted >= limit) {
                            break 'pages;
                        }
                    }
                }
            }
        })
    }

    /// Search a database, then stream the raw record data for every
    /// match through the efetch endpoint, one chunk per page. `rettype`
    /// defaults to the database's registered fetch format.
    pub fn fetch_data(&self, request: SearchRequest, rettype: Option<String>) -> TextStream {
        let client = self.clone();

        Box::pin(try_stream! {
            let spec = lookup(&request.db)?;
            let rettype = rettype.as_deref().unwrap_or(spec.rettype).to_string();
            let session = client.open_session(&request).await?;

            // The singleton short-circuit does not apply here: raw data
            // always comes from efetch, never from the search body.
            for cursor in page_cursors(&session, request.limit, request.effective_page_size()) {
                let url = entrez::fetch_url(
                    &client.config.api.base_url,
                    &cursor.db,
                    &cursor.token,
                    cursor.offset,
                    cursor.page_size,
                    &rettype,
                    spec.retmode,
                );
                let fetched = client.fetcher.fetch(&url).await?;
                yield fetched.body;
            }
        })
    }
}
