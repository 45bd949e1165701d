//! Accession-derived archive URLs for sequencing runs.
//!
//! Run archives live at a deterministic mirror path sliced out of the
//! accession itself: `<mirror>/<acc[0:3]>/<acc[0:6]>/<acc>/<acc>.sra`.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::models::Record;

fn accession_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{3}\d{6,}$").expect("valid accession pattern"))
}

/// Archive URL for one run accession. Accessions too short or not in the
/// `XXX`-plus-digits shape yield nothing.
pub fn run_url(mirror: &str, acc: &str) -> Option<String> {
    if !accession_re().is_match(acc) {
        return None;
    }

    let mirror = mirror.trim_end_matches('/');
    Some(format!(
        "{}/{}/{}/{}/{}.sra",
        mirror,
        &acc[..3],
        &acc[..6],
        acc,
        acc
    ))
}

/// Every run accession in a normalized sequencing-run record
/// (`runs.Run[*].acc`).
pub fn run_accessions(record: &Record) -> Vec<String> {
    let Some(Value::Array(runs)) = record.get("runs").and_then(|r| r.get("Run")) else {
        return Vec::new();
    };

    runs.iter()
        .filter_map(|run| run.get("acc").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MIRROR: &str = "https://ftp-trace.ncbi.nlm.nih.gov/sra/sra-instant/reads/ByRun/sra/";

    #[test]
    fn test_run_url_slicing() {
        let url = run_url(MIRROR, "SRR070675").unwrap();
        assert_eq!(
            url,
            "https://ftp-trace.ncbi.nlm.nih.gov/sra/sra-instant/reads/ByRun/sra/SRR/SRR070/SRR070675/SRR070675.sra"
        );
    }

    #[test]
    fn test_run_url_rejects_malformed_accessions() {
        assert!(run_url(MIRROR, "SRR").is_none());
        assert!(run_url(MIRROR, "SRR07").is_none());
        assert!(run_url(MIRROR, "not-an-accession").is_none());
    }

    #[test]
    fn test_run_accessions() {
        let record: Record = serde_json::from_value(json!({
            "uid": "35526",
            "runs": {"Run": [
                {"acc": "SRR070675", "total_bases": "10035049"},
                {"acc": "SRR070676", "total_bases": "20000000"}
            ]}
        }))
        .unwrap();

        assert_eq!(run_accessions(&record), vec!["SRR070675", "SRR070676"]);
    }

    #[test]
    fn test_run_accessions_missing_runs() {
        let record = Record::new("1");
        assert!(run_accessions(&record).is_empty());
    }
}
