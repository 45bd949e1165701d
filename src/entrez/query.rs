//! Pure URL construction for the four E-utilities endpoint families.
//!
//! No network, no state. Malformed input simply yields a URL the server
//! will reject; that surfaces later through the fetcher.

use crate::models::SessionToken;

/// Protocol parameters shared by every request: JSON output where the
/// endpoint supports it, and the version 2.0 document summaries.
const PROTOCOL_PARAMS: &str = "retmode=json&version=2.0";

/// Percent-encode a search term, stripping quote characters first.
fn encode_term(term: &str) -> String {
    let stripped: String = term.chars().filter(|c| *c != '"' && *c != '\'').collect();
    urlencoding::encode(&stripped).into_owned()
}

/// Initial search: term -> session token + result count.
pub fn search_url(base: &str, db: &str, term: &str) -> String {
    format!(
        "{}esearch.fcgi?db={}&term={}&usehistory=y&{}",
        base,
        db,
        encode_term(term),
        PROTOCOL_PARAMS
    )
}

/// One result page: session token + offset + page size -> document summaries.
pub fn page_url(base: &str, db: &str, token: &SessionToken, offset: u64, page_size: u64) -> String {
    format!(
        "{}esummary.fcgi?db={}&query_key={}&WebEnv={}&retstart={}&retmax={}&{}",
        base, db, token.querykey, token.webenv, offset, page_size, PROTOCOL_PARAMS
    )
}

/// Cross-database link lookup: source id + db pair -> destination id list.
/// The elink endpoint only answers in XML.
pub fn link_url(base: &str, src_db: &str, dest_db: &str, uid: &str) -> String {
    format!(
        "{}elink.fcgi?dbfrom={}&db={}&id={}",
        base, src_db, dest_db, uid
    )
}

/// Raw record data over a history session: one page of sequence/record
/// data in the database's fetch format.
pub fn fetch_url(
    base: &str,
    db: &str,
    token: &SessionToken,
    offset: u64,
    page_size: u64,
    rettype: &str,
    retmode: &str,
) -> String {
    format!(
        "{}efetch.fcgi?db={}&query_key={}&WebEnv={}&retstart={}&retmax={}&rettype={}&retmode={}",
        base, db, token.querykey, token.webenv, offset, page_size, rettype, retmode
    )
}
