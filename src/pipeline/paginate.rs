//! Pagination: turn a decoded search response into the bounded sequence
//! of page cursors needed to retrieve every result.

use serde::Deserialize;

use crate::entrez::EntrezError;
use crate::models::{PageCursor, SearchSession, SessionToken};

/// The `esearchresult` envelope of an esearch JSON response. Numbers
/// arrive as strings; missing fields mean the upstream emitted one of its
/// known-transient malformed bodies.
#[derive(Debug, Deserialize)]
struct EsearchBody {
    esearchresult: Option<EsearchResult>,
}

#[derive(Debug, Deserialize)]
struct EsearchResult {
    count: Option<String>,
    webenv: Option<String>,
    querykey: Option<String>,
}

/// Decode the initial search response into a session.
///
/// A response lacking the count or session token is fatal for this search
/// and is never retried: the request already passed the fetcher's transient
/// classification, so structural malformation at this point indicates a
/// request-shape problem.
pub fn parse_session(db: &str, url: &str, body: &str) -> Result<SearchSession, EntrezError> {
    let malformed = || EntrezError::MalformedSearch {
        url: url.to_string(),
    };

    let parsed: EsearchBody = serde_json::from_str(body).map_err(|_| malformed())?;
    let result = parsed.esearchresult.ok_or_else(malformed)?;

    let count = result
        .count
        .as_deref()
        .and_then(|c| c.parse::<u64>().ok())
        .ok_or_else(malformed)?;
    let webenv = result.webenv.ok_or_else(malformed)?;
    let querykey = result.querykey.ok_or_else(malformed)?;

    Ok(SearchSession {
        db: db.to_string(),
        count,
        token: SessionToken { webenv, querykey },
        search_url: url.to_string(),
    })
}

/// Compute every page cursor for a session.
///
/// Effective count is the session's reported count, capped by `limit` when
/// one is given; cursors cover offsets `0, p, 2p, ...`. A reported count of
/// exactly 1 short-circuits repagination: the single cursor reuses the
/// original search URL, skipping the summary-URL round trip.
pub fn page_cursors(session: &SearchSession, limit: Option<u64>, page_size: u64) -> Vec<PageCursor> {
    if session.count == 0 {
        return Vec::new();
    }

    if session.count == 1 {
        return vec![PageCursor {
            db: session.db.clone(),
            token: session.token.clone(),
            offset: 0,
            page_size: 1,
            reuse_url: Some(session.search_url.clone()),
        }];
    }

    let effective = match limit {
        Some(limit) if limit > 0 => session.count.min(limit),
        _ => session.count,
    };
    let page_size = page_size.max(1);
    let pages = effective.div_ceil(page_size);

    (0..pages)
        .map(|page| PageCursor {
            db: session.db.clone(),
            token: session.token.clone(),
            offset: page * page_size,
            page_size,
            reuse_url: None,
        })
        .collect()
}
