//! Record normalization: reshape one raw summary page into independent
//! per-uid records.
//!
//! A version 2.0 summary page arrives as `{"result": {"uids": [...],
//! "<uid>": {...}, ...}}`. The `uids` list is redundant envelope (every
//! uid keys its own summary) and is dropped; each summary becomes one
//! [`Record`]. Fields the database registry declares XML-bearing hold
//! embedded XML documents as strings and are parsed into structured JSON
//! in place, which also makes normalization idempotent: an already-parsed
//! field is no longer a string and is skipped.

use serde_json::{Map, Value};
use tracing::debug;

use crate::entrez::{DbSpec, EntrezError, PostFilter};
use crate::models::Record;
use crate::utils::xml_fragment_to_json;

/// A decoded summary page: uid order plus the keyed summary collection.
#[derive(Debug)]
pub struct Page {
    pub uids: Vec<String>,
    summaries: Map<String, Value>,
}

impl Page {
    /// Take the raw summary for one uid out of the page.
    pub fn take(&mut self, uid: &str) -> Option<Value> {
        self.summaries.remove(uid)
    }
}

/// Extract the results collection from a page body, discarding the
/// redundant uid-list envelope. A body without a `result` envelope (the
/// upstream emits these transiently) decodes as an empty page.
pub fn parse_page(body: &str) -> Result<Page, EntrezError> {
    let value: Value = serde_json::from_str(body)?;

    let Some(Value::Object(mut result)) = value.get("result").cloned() else {
        debug!("page body carries no result envelope");
        return Ok(Page {
            uids: Vec::new(),
            summaries: Map::new(),
        });
    };

    let uids = match result.remove("uids") {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        // No uid list: fall back to the collection's own key order
        _ => result.keys().cloned().collect(),
    };

    Ok(Page {
        uids,
        summaries: result,
    })
}

/// Normalize one raw summary into a record: parse embedded-XML fields in
/// place, then apply the database's post-filter. Returns `None` when the
/// post-filter rejects the record as an incomplete upstream entry.
pub fn normalize_record(
    spec: &DbSpec,
    uid: &str,
    raw: Value,
) -> Result<Option<Record>, EntrezError> {
    let Value::Object(mut fields) = raw else {
        return Ok(None);
    };
    fields.remove("uid");

    for field in spec.xml_fields {
        // Only string values still hold unparsed XML
        if let Some(Value::String(xml)) = fields.get(*field) {
            let parsed = xml_fragment_to_json(xml)?;
            fields.insert((*field).to_string(), parsed);
        }
    }

    match spec.post_filter {
        PostFilter::None => {}
        PostFilter::SraRuns => {
            if !filter_sra_runs(&mut fields) {
                debug!(uid, "dropping record with incomplete run metadata");
                return Ok(None);
            }
        }
    }

    Ok(Some(Record {
        uid: uid.to_string(),
        fields,
    }))
}

/// Force `runs.Run` into an array (the upstream returns single-element
/// collections unwrapped) and keep the record only when at least one run
/// carries `total_bases`; runs without it are incomplete upstream entries.
fn filter_sra_runs(fields: &mut Map<String, Value>) -> bool {
    let Some(runs) = fields.get_mut("runs").and_then(Value::as_object_mut) else {
        return false;
    };
    let Some(run) = runs.get_mut("Run") else {
        return false;
    };

    if !run.is_array() {
        let single = run.take();
        *run = Value::Array(vec![single]);
    }

    run.as_array()
        .map(|items| {
            items
                .iter()
                .any(|item| item.get("total_bases").is_some_and(|v| !v.is_null()))
        })
        .unwrap_or(false)
}
