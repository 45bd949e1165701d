//! Per-database capability records.
//!
//! Everything database-specific in the pipelines, which summary fields
//! carry embedded XML, which post-filter applies, what format efetch
//! should return, lives in one lookup table resolved once at call entry.
//! Unknown database names are rejected here before any network call.

use crate::entrez::EntrezError;

/// Database-specific record post-processing applied by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    /// No post-processing
    None,
    /// Force `runs.Run` into an array and drop records whose run metadata
    /// lacks the `total_bases` field (incomplete upstream entries)
    SraRuns,
}

/// Static description of one Entrez database.
#[derive(Debug, Clone, Copy)]
pub struct DbSpec {
    pub name: &'static str,

    /// Summary fields whose values are XML-encoded strings rather than
    /// structured JSON; the normalizer parses these in place
    pub xml_fields: &'static [&'static str],

    pub post_filter: PostFilter,

    /// Default efetch output format
    pub rettype: &'static str,
    pub retmode: &'static str,
}

const DATABASES: &[DbSpec] = &[
    DbSpec {
        name: "sra",
        xml_fields: &["expxml", "runs"],
        post_filter: PostFilter::SraRuns,
        rettype: "full",
        retmode: "xml",
    },
    DbSpec {
        name: "assembly",
        xml_fields: &["meta"],
        post_filter: PostFilter::None,
        rettype: "docsum",
        retmode: "xml",
    },
    DbSpec {
        name: "biosample",
        xml_fields: &["sampledata"],
        post_filter: PostFilter::None,
        rettype: "full",
        retmode: "xml",
    },
    DbSpec {
        name: "bioproject",
        xml_fields: &[],
        post_filter: PostFilter::None,
        rettype: "xml",
        retmode: "xml",
    },
    DbSpec {
        name: "taxonomy",
        xml_fields: &[],
        post_filter: PostFilter::None,
        rettype: "null",
        retmode: "xml",
    },
    DbSpec {
        name: "nucleotide",
        xml_fields: &[],
        post_filter: PostFilter::None,
        rettype: "fasta",
        retmode: "text",
    },
    DbSpec {
        name: "protein",
        xml_fields: &[],
        post_filter: PostFilter::None,
        rettype: "fasta",
        retmode: "text",
    },
    DbSpec {
        name: "gene",
        xml_fields: &[],
        post_filter: PostFilter::None,
        rettype: "gene_table",
        retmode: "text",
    },
    DbSpec {
        name: "pubmed",
        xml_fields: &[],
        post_filter: PostFilter::None,
        rettype: "abstract",
        retmode: "text",
    },
];

/// Resolve a database name, rejecting unknown names up front.
pub fn lookup(name: &str) -> Result<&'static DbSpec, EntrezError> {
    DATABASES
        .iter()
        .find(|spec| spec.name == name)
        .ok_or_else(|| EntrezError::UnknownDatabase(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known() {
        let sra = lookup("sra").unwrap();
        assert_eq!(sra.xml_fields, &["expxml", "runs"]);
        assert_eq!(sra.post_filter, PostFilter::SraRuns);

        let assembly = lookup("assembly").unwrap();
        assert_eq!(assembly.xml_fields, &["meta"]);
        assert_eq!(assembly.post_filter, PostFilter::None);
    }

    #[test]
    fn test_lookup_unknown() {
        let err = lookup("genbank").unwrap_err();
        assert!(matches!(err, EntrezError::UnknownDatabase(name) if name == "genbank"));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert!(lookup("SRA").is_err());
    }
}
