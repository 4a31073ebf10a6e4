//! Document serialization.
//!
//! Two artifact modes: one pretty-printed JSON file per article
//! (`PMC<id>.json`) or one compact JSON document per line for stream
//! processing. Key order is fixed by the Document struct; Unicode is written
//! unescaped and values found in the XML stay strings.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::document::Document;

pub const PER_ITEM_EXT: &str = "json";
pub const STREAM_EXT: &str = "jsonl";

pub fn artifact_file_name(pmc_id: &str) -> String {
    format!("PMC{pmc_id}.{PER_ITEM_EXT}")
}

pub fn document_to_value(doc: &Document) -> serde_json::Value {
    serde_json::to_value(doc).expect("Document serialization is infallible")
}

pub fn document_to_pretty_json(doc: &Document) -> String {
    serde_json::to_string_pretty(doc).expect("Document serialization is infallible")
}

/// One compact line for stream mode, newline included.
pub fn document_to_stream_line(doc: &Document) -> String {
    let mut line = serde_json::to_string(doc).expect("Document serialization is infallible");
    line.push('\n');
    line
}

/// Write the per-item artifact into `dir`, returning its path.
pub fn write_per_item(doc: &Document, dir: &Path) -> io::Result<PathBuf> {
    let path = dir.join(artifact_file_name(&doc.pmc_id));
    let mut file = fs::File::create(&path)?;
    file.write_all(document_to_pretty_json(doc).as_bytes())?;
    file.write_all(b"\n")?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::document_from_xml;
    use crate::identifiers::Pmcid;

    const CONTRACT_KEYS: [&str; 48] = [
        "pmc_id",
        "title",
        "abstract_text",
        "abstract",
        "body",
        "body_nested",
        "paragraphs",
        "authors",
        "non_author_contributors",
        "article_id",
        "journal_title",
        "journal_id",
        "publisher_name",
        "publisher_location",
        "volume",
        "issue",
        "first_page",
        "last_page",
        "elocation_id",
        "published_date",
        "history_dates",
        "keywords",
        "article_types",
        "article_categories",
        "citations",
        "tables",
        "figures",
        "equations",
        "supplementary_materials",
        "footnotes",
        "acknowledgements",
        "notes",
        "appendices",
        "glossary",
        "funding",
        "ethics",
        "permissions",
        "copyright_statement",
        "license_type",
        "related_articles",
        "conference",
        "translated_titles",
        "translated_abstracts",
        "version_history",
        "counts",
        "self_uris",
        "custom_meta",
        "full_text",
    ];

    fn minimal_doc() -> Document {
        let xml = b"<article><front><article-meta>
            <title-group><article-title>T</article-title></title-group>
            </article-meta></front></article>";
        document_from_xml(&Pmcid::parse("42").unwrap(), xml).unwrap()
    }

    #[test]
    fn top_level_key_order_matches_contract() {
        let value = document_to_value(&minimal_doc());
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, CONTRACT_KEYS);
    }

    #[test]
    fn missing_fields_emit_empty_values_not_omissions() {
        let value = document_to_value(&minimal_doc());
        let obj = value.as_object().unwrap();
        assert_eq!(obj["abstract_text"], "");
        assert!(obj["body"].as_object().unwrap().is_empty());
        assert!(obj["citations"].as_array().unwrap().is_empty());
        assert!(obj["custom_meta"].as_object().unwrap().is_empty());
    }

    #[test]
    fn unicode_is_preserved_unescaped() {
        let mut doc = minimal_doc();
        doc.title = "β-catenin régulation".to_string();
        let json = document_to_pretty_json(&doc);
        assert!(json.contains("β-catenin régulation"));
        assert!(!json.contains("\\u"));
    }

    #[test]
    fn page_numbers_stay_strings() {
        let xml = b"<article><front><article-meta>
            <volume>38</volume><fpage>276</fpage>
            </article-meta></front></article>";
        let doc = document_from_xml(&Pmcid::parse("1").unwrap(), xml).unwrap();
        let value = document_to_value(&doc);
        assert_eq!(value["volume"], "38");
        assert_eq!(value["first_page"], "276");
    }

    #[test]
    fn per_item_file_is_named_after_the_pmcid() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_per_item(&minimal_doc(), dir.path()).unwrap();
        assert!(path.ends_with("PMC42.json"));
        assert!(path.exists());
    }

    #[test]
    fn stream_line_is_single_line_json() {
        let line = document_to_stream_line(&minimal_doc());
        assert!(line.ends_with('\n'));
        assert_eq!(line.trim_end().lines().count(), 1);
        let parsed: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(parsed["pmc_id"], "42");
    }

    #[test]
    fn serialization_is_byte_identical_across_parses() {
        let xml = b"<article><front><article-meta>
            <title-group><article-title>Stable</article-title></title-group>
            </article-meta></front><body><sec><title>S</title><p>text</p></sec></body></article>";
        let a = document_from_xml(&Pmcid::parse("9").unwrap(), xml).unwrap();
        let b = document_from_xml(&Pmcid::parse("9").unwrap(), xml).unwrap();
        assert_eq!(document_to_pretty_json(&a), document_to_pretty_json(&b));
    }
}
