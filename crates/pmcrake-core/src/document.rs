//! The structured-document model built from one JATS article.
//!
//! Field declaration order on [`Document`] is the serialized key order of the
//! emitted artifact, so reordering fields here is a breaking change to the
//! on-disk format.

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// One parsed article. Built once per article by a single worker, then
/// serialized; never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub pmc_id: String,
    pub title: String,
    pub abstract_text: String,
    #[serde(rename = "abstract")]
    pub abstract_sections: IndexMap<String, String>,
    pub body: IndexMap<String, String>,
    pub body_nested: IndexMap<String, NestedSection>,
    pub paragraphs: Vec<Paragraph>,
    pub authors: Vec<Contributor>,
    pub non_author_contributors: Vec<Contributor>,
    pub article_id: IndexMap<String, String>,
    pub journal_title: String,
    pub journal_id: IndexMap<String, String>,
    pub publisher_name: String,
    pub publisher_location: String,
    pub volume: String,
    pub issue: String,
    pub first_page: String,
    pub last_page: String,
    pub elocation_id: String,
    pub published_date: IndexMap<String, String>,
    pub history_dates: IndexMap<String, String>,
    pub keywords: Vec<String>,
    pub article_types: Vec<String>,
    pub article_categories: Vec<String>,
    pub citations: Vec<Citation>,
    pub tables: Vec<Table>,
    pub figures: Vec<Figure>,
    pub equations: Vec<Equation>,
    pub supplementary_materials: Vec<SupplementaryMaterial>,
    pub footnotes: Vec<String>,
    pub acknowledgements: Vec<String>,
    pub notes: Vec<String>,
    pub appendices: IndexMap<String, String>,
    pub glossary: IndexMap<String, String>,
    pub funding: Vec<String>,
    pub ethics: IndexMap<String, String>,
    pub permissions: IndexMap<String, String>,
    pub copyright_statement: String,
    pub license_type: String,
    pub related_articles: Vec<RelatedArticle>,
    pub conference: IndexMap<String, String>,
    pub translated_titles: IndexMap<String, String>,
    pub translated_abstracts: IndexMap<String, String>,
    pub version_history: Vec<VersionRecord>,
    pub counts: IndexMap<String, String>,
    pub self_uris: Vec<SelfUri>,
    pub custom_meta: IndexMap<String, String>,
    pub full_text: String,
}

impl Document {
    /// Recompute `abstract_text` and `full_text` from the section maps.
    /// Called once at assembly time; both views join entries with blank lines.
    pub fn compute_derived(&mut self) {
        self.abstract_text = join_values(&self.abstract_sections);
        let body_text = join_values(&self.body);
        self.full_text = match (self.abstract_text.is_empty(), body_text.is_empty()) {
            (false, false) => format!("{}\n\n{}", self.abstract_text, body_text),
            (false, true) => self.abstract_text.clone(),
            (true, false) => body_text,
            (true, true) => String::new(),
        };
    }

    /// Ordered top-level section titles.
    pub fn get_toc(&self) -> Vec<String> {
        self.body.keys().cloned().collect()
    }
}

fn join_values(map: &IndexMap<String, String>) -> String {
    map.values()
        .filter(|v| !v.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// One node of the nested body view. Serialized as a mapping whose first key
/// is the reserved `_text` entry, followed by child sections in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NestedSection {
    pub text: String,
    pub children: IndexMap<String, NestedSection>,
}

impl Serialize for NestedSection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1 + self.children.len()))?;
        map.serialize_entry("_text", &self.text)?;
        for (title, child) in &self.children {
            map.serialize_entry(title, child)?;
        }
        map.end()
    }
}

/// One leaf paragraph with its position in the section hierarchy.
/// `subsection` is empty for paragraphs sitting directly under a top-level
/// section; `paragraph_index` is zero-based within the leaf section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Paragraph {
    pub section: String,
    pub subsection: String,
    pub paragraph_index: usize,
    pub text: String,
}

/// A contributor record. Known fields are typed; rarely used attributes
/// (orcid, isni, degrees, equal-contrib) live in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Contributor {
    pub contributor_type: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub affiliations: Vec<String>,
    pub extra: IndexMap<String, String>,
}

/// A reference-list entry. `raw` always carries the verbatim citation text;
/// the structured fields are best-effort and empty when unparseable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Citation {
    pub id: String,
    pub raw: String,
    pub authors: Vec<String>,
    pub title: String,
    pub source: String,
    pub year: String,
    pub volume: String,
    pub pages: String,
    pub doi: String,
    pub pmid: String,
    pub pmcid: String,
}

/// A table as a dense rectangular matrix: header rows first, then body rows,
/// spans expanded, short rows right-padded with empty cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub label: String,
    pub caption: String,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Figure {
    pub id: String,
    pub label: String,
    pub caption: String,
    pub graphic_href: String,
    pub alt_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Equation {
    pub id: String,
    pub mathml: String,
    pub tex: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SupplementaryMaterial {
    pub label: String,
    pub caption: String,
    pub href: String,
    pub tag: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelatedArticle {
    pub relation_type: String,
    pub href: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VersionRecord {
    pub version: String,
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelfUri {
    pub content_type: String,
    pub href: String,
}
