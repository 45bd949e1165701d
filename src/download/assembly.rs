//! Assembly dataset discovery: FTP directory scraping and filename
//! classification.
//!
//! An assembly record's parsed `meta` carries a list of FTP site roots.
//! The catalog lists the same asset under duplicate GenBank/RefSeq roots;
//! the first listed root is taken as canonical and alternates are
//! discarded (best effort, not a contract of the data source). The root's
//! HTTP directory listing is scraped for anchors, and each discovered
//! file is classified by the `<assembly-name>_<type>.<format>` naming
//! convention into a map keyed by file type then format.

use scraper::{Html, Selector};
use serde_json::{Map, Value};
use url::Url;

use crate::models::Record;

/// The canonical (first listed) FTP site root of an assembly record,
/// rewritten to https for the listing fetch.
pub fn ftp_root(record: &Record) -> Option<String> {
    let paths = record.get("meta")?.get("FtpSites")?.get("FtpPath")?;

    let first = match paths {
        Value::Array(items) => items.first()?,
        single => single,
    };

    // Path elements carry their url as text, as `$` when the element
    // also has a `type` attribute
    let raw = match first {
        Value::String(url) => url.as_str(),
        Value::Object(map) => map.get("$")?.as_str()?,
        _ => return None,
    };

    // The catalog advertises ftp:// roots; the same trees are served
    // over https on the same hosts
    let mut url = Url::parse(raw).ok()?;
    if url.scheme() == "ftp" {
        url.set_scheme("https").ok()?;
    }
    Some(url.to_string())
}

/// Assembly name: the last path segment of the FTP root.
pub fn assembly_name(root: &str) -> &str {
    root.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

/// Scrape a directory listing and classify its files into
/// `{type: {format: url}}`. Files not following the
/// `<assembly-name>_<type>.<format>` convention are skipped.
pub fn classify_listing(root: &str, html: &str) -> Map<String, Value> {
    let name = assembly_name(root);
    let prefix = format!("{}_", name);
    let root = root.trim_end_matches('/');

    let document = Html::parse_document(html);
    let anchors = Selector::parse("a[href]").expect("valid selector");

    let mut files: Map<String, Value> = Map::new();

    for anchor in document.select(&anchors) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        // Plain file entries only; parent/volume links and subdirectories
        // don't follow the naming convention anyway
        let basename = href.rsplit('/').next().unwrap_or(href);
        let Some(rest) = basename.strip_prefix(&prefix) else {
            continue;
        };
        let Some((file_type, format)) = rest.split_once('.') else {
            continue;
        };
        if file_type.is_empty() || format.is_empty() {
            continue;
        }

        let url = format!("{}/{}", root, basename);
        files
            .entry(file_type.to_string())
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .expect("format map")
            .insert(format.to_string(), Value::String(url));
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assembly_record() -> Record {
        serde_json::from_value(json!({
            "uid": "202931",
            "meta": {"FtpSites": {"FtpPath": [
                {"type": "GenBank", "$": "ftp://ftp.ncbi.nlm.nih.gov/genomes/all/GCA_000315625.1_Guith1"},
                {"type": "RefSeq", "$": "ftp://ftp.ncbi.nlm.nih.gov/genomes/all/GCF_000315625.1_Guith1"}
            ]}}
        }))
        .unwrap()
    }

    const LISTING: &str = r#"<html><body><pre>
<a href="../">Parent Directory</a>
<a href="GCA_000315625.1_Guith1_genomic.fna.gz">GCA_000315625.1_Guith1_genomic.fna.gz</a>
<a href="GCA_000315625.1_Guith1_genomic.gff.gz">GCA_000315625.1_Guith1_genomic.gff.gz</a>
<a href="GCA_000315625.1_Guith1_protein.faa.gz">GCA_000315625.1_Guith1_protein.faa.gz</a>
<a href="md5checksums.txt">md5checksums.txt</a>
</pre></body></html>"#;

    #[test]
    fn test_ftp_root_picks_first_and_rewrites_scheme() {
        let root = ftp_root(&assembly_record()).unwrap();
        assert_eq!(
            root,
            "https://ftp.ncbi.nlm.nih.gov/genomes/all/GCA_000315625.1_Guith1"
        );
    }

    #[test]
    fn test_ftp_root_single_unwrapped_path() {
        let record: Record = serde_json::from_value(json!({
            "uid": "1",
            "meta": {"FtpSites": {"FtpPath": {"$": "ftp://host/genomes/GCA_1_x", "type": "GenBank"}}}
        }))
        .unwrap();
        assert_eq!(ftp_root(&record).unwrap(), "https://host/genomes/GCA_1_x");
    }

    #[test]
    fn test_ftp_root_missing_meta() {
        assert!(ftp_root(&Record::new("1")).is_none());
    }

    #[test]
    fn test_assembly_name() {
        assert_eq!(
            assembly_name("https://host/genomes/all/GCA_000315625.1_Guith1"),
            "GCA_000315625.1_Guith1"
        );
    }

    #[test]
    fn test_classify_listing() {
        let root = "https://ftp.ncbi.nlm.nih.gov/genomes/all/GCA_000315625.1_Guith1";
        let files = classify_listing(root, LISTING);

        assert_eq!(
            files["genomic"]["fna.gz"],
            format!("{}/GCA_000315625.1_Guith1_genomic.fna.gz", root)
        );
        assert_eq!(
            files["genomic"]["gff.gz"],
            format!("{}/GCA_000315625.1_Guith1_genomic.gff.gz", root)
        );
        assert_eq!(
            files["protein"]["faa.gz"],
            format!("{}/GCA_000315625.1_Guith1_protein.faa.gz", root)
        );
        // Files outside the naming convention are skipped
        assert!(!files.contains_key("md5checksums"));
    }
}
