//! Cross-reference resolution: link, expand and plink.

use async_stream::try_stream;
use futures_util::future::join_all;
use futures_util::TryStreamExt;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::entrez::{self, lookup, EntrezError};
use crate::models::{LinkResult, Record, SearchRequest};
use crate::pipeline::{EntrezClient, LinkStream, RecordStream};

/// Map a property name to the database it implies. The one special case:
/// a property of literally `tax` queries the `taxonomy` database, whose
/// search syntax additionally wants ids suffixed with `[uid]`.
fn property_db(property: &str) -> &str {
    if property == "tax" {
        "taxonomy"
    } else {
        property
    }
}

fn property_term(property: &str, id: &str) -> String {
    if property == "tax" {
        format!("{}[uid]", id)
    } else {
        id.to_string()
    }
}

/// Read the id values out of a `<property>id` field: a single string or
/// number, or an array of them.
fn id_values(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Number(n) => vec![n.to_string()],
        Value::Array(items) => items.iter().flat_map(id_values).collect(),
        _ => Vec::new(),
    }
}

// The elink response's nested link-set structure. Only the pieces the
// resolver matches on are kept; everything else is ignored.
#[derive(Debug, Deserialize)]
struct ELinkResult {
    #[serde(rename = "LinkSet", default)]
    link_sets: Vec<LinkSetXml>,
}

#[derive(Debug, Deserialize)]
struct LinkSetXml {
    #[serde(rename = "LinkSetDb", default)]
    dbs: Vec<LinkSetDbXml>,
}

#[derive(Debug, Deserialize)]
struct LinkSetDbXml {
    #[serde(rename = "LinkName", default)]
    link_name: String,
    #[serde(rename = "Link", default)]
    links: Vec<LinkXml>,
}

#[derive(Debug, Deserialize)]
struct LinkXml {
    #[serde(rename = "Id")]
    id: String,
}

/// Collect the destination ids under the link-set whose name is exactly
/// `<src>_<dest>`. `None` means no linked records exist — not an error.
pub(crate) fn parse_link_sets(
    src_db: &str,
    dest_db: &str,
    body: &str,
) -> Result<Option<Vec<String>>, EntrezError> {
    let parsed: ELinkResult = quick_xml::de::from_str(body)?;
    let wanted = format!("{}_{}", src_db, dest_db);

    for link_set in parsed.link_sets {
        for db in link_set.dbs {
            if db.link_name == wanted {
                return Ok(Some(db.links.into_iter().map(|link| link.id).collect()));
            }
        }
    }

    Ok(None)
}

impl EntrezClient {
    /// Resolve the destination-database uids linked to one source uid.
    ///
    /// All destinations for the source uid are batched into a single
    /// [`LinkResult`] with an ordered uid list. A source with no linked
    /// records yields an empty stream.
    pub fn link(&self, src_db: &str, dest_db: &str, uid: &str) -> LinkStream {
        let client = self.clone();
        let src_db = src_db.to_string();
        let dest_db = dest_db.to_string();
        let uid = uid.to_string();

        Box::pin(try_stream! {
            lookup(&src_db)?;
            lookup(&dest_db)?;

            let url = entrez::link_url(&client.config.api.base_url, &src_db, &dest_db, &uid);
            let fetched = client.fetcher.fetch(&url).await?;

            match parse_link_sets(&src_db, &dest_db, &fetched.body)? {
                Some(dest_uids) => {
                    yield LinkResult {
                        src_db: src_db.clone(),
                        dest_db: dest_db.clone(),
                        src_uid: uid.clone(),
                        dest_uids,
                    };
                }
                None => {
                    debug!(src_db, dest_db, uid, "no matching link-set");
                }
            }
        })
    }

    /// Record transform: for each incoming record, search the database
    /// implied by `property` for every id in the record's `<property>id`
    /// field and attach the matched record(s) under `dest_property`
    /// (defaulting to `property`). Records without the id field pass
    /// through unchanged. Ids fan out in parallel; the attachment lands
    /// on the record that carried them.
    pub fn expand(
        &self,
        property: &str,
        dest_property: Option<&str>,
        input: RecordStream,
    ) -> RecordStream {
        let client = self.clone();
        let property = property.to_string();
        let dest_property = dest_property.unwrap_or(property.as_str()).to_string();

        Box::pin(try_stream! {
            lookup(property_db(&property))?;
            let mut input = input;

            while let Some(mut record) = input.try_next().await? {
                let field = format!("{}id", property);
                let ids = match record.get(&field) {
                    Some(value) => id_values(value),
                    None => {
                        yield record;
                        continue;
                    }
                };

                let searches = ids.iter().map(|id| {
                    let request = SearchRequest::new(
                        property_db(&property),
                        property_term(&property, id),
                    );
                    client.search(request).try_collect::<Vec<Record>>()
                });

                let mut matched = Vec::new();
                for result in join_all(searches).await {
                    matched.extend(result?);
                }

                let attachment = match (ids.len(), matched.len()) {
                    (1, 1) => serde_json::to_value(&matched[0])?,
                    _ => serde_json::to_value(&matched)?,
                };
                record.set(&dest_property, attachment);

                yield record;
            }
        })
    }

    /// Record transform: like [`expand`](Self::expand), but resolves the
    /// ids through `link` instead of a search, attaching only the
    /// destination uid list under `<dest_db>id`.
    pub fn plink(&self, property: &str, dest_db: &str, input: RecordStream) -> RecordStream {
        let client = self.clone();
        let property = property.to_string();
        let dest_db = dest_db.to_string();

        Box::pin(try_stream! {
            let src_db = property_db(&property).to_string();
            lookup(&src_db)?;
            lookup(&dest_db)?;
            let mut input = input;

            while let Some(mut record) = input.try_next().await? {
                let field = format!("{}id", property);
                let ids = match record.get(&field) {
                    Some(value) => id_values(value),
                    None => {
                        yield record;
                        continue;
                    }
                };

                let mut dest_uids: Vec<String> = Vec::new();
                for id in &ids {
                    let mut links = client.link(&src_db, &dest_db, id);
                    while let Some(result) = links.try_next().await? {
                        dest_uids.extend(result.dest_uids);
                    }
                }

                record.set(
                    format!("{}id", dest_db),
                    serde_json::to_value(&dest_uids)?,
                );
                yield record;
            }
        })
    }
}
