//! Author and non-author contributor extraction.
//!
//! Affiliations are either nested directly in the `<contrib>` or referenced
//! by an `<xref ref-type="aff" rid="...">` resolving to an `<aff>` block
//! elsewhere in the front matter. Emails show up inline on the contributor
//! or inside the resolved affiliation.

use indexmap::IndexMap;

use crate::document::Contributor;
use crate::xml::{collapse_ws, Element};

/// Contributors with declared type `author` (or no declared type).
pub fn extract_authors(article: &Element) -> Vec<Contributor> {
    extract_contributors(article, true)
}

/// Everyone else: editors, translators, curators, ...
pub fn extract_non_author_contributors(article: &Element) -> Vec<Contributor> {
    extract_contributors(article, false)
}

fn extract_contributors(article: &Element, authors: bool) -> Vec<Contributor> {
    let mut out = Vec::new();
    for group in article.find_all("contrib-group") {
        for contrib in group.children_named("contrib") {
            let declared = contrib.attr("contrib-type").unwrap_or("author");
            let is_author = declared.eq_ignore_ascii_case("author");
            if is_author != authors {
                continue;
            }
            out.push(contributor_record(article, contrib, declared));
        }
    }
    out
}

fn contributor_record(article: &Element, contrib: &Element, declared: &str) -> Contributor {
    let first_name = contrib
        .find_text("given-names")
        .map(|t| t.trim().to_string())
        .unwrap_or_default();
    let last_name = contrib
        .find_text("surname")
        .map(|t| t.trim().to_string())
        .unwrap_or_default();

    let mut affiliations: Vec<String> = contrib
        .children_named("aff")
        .map(|aff| affiliation_text(aff))
        .filter(|t| !t.is_empty())
        .collect();

    let mut aff_email = None;
    for xref in contrib.find_all("xref") {
        if xref.attr("ref-type") != Some("aff") {
            continue;
        }
        let Some(rid) = xref.attr("rid") else { continue };
        if let Some(aff) = resolve_affiliation(article, rid) {
            let text = affiliation_text(aff);
            if !text.is_empty() {
                affiliations.push(format!("{rid}: {text}"));
            }
            if aff_email.is_none() {
                aff_email = aff.find_text("email").filter(|e| !e.is_empty());
            }
        }
    }

    let email = contrib
        .find_text("email")
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .or(aff_email);

    let mut extra = IndexMap::new();
    for cid in contrib.find_all("contrib-id") {
        if let Some(id_type) = cid.attr("contrib-id-type") {
            let value = cid.collapsed_text();
            if !value.is_empty() {
                extra.insert(id_type.to_string(), value);
            }
        }
    }
    if let Some(degrees) = contrib.find_text("degrees").filter(|d| !d.is_empty()) {
        extra.insert("degrees".to_string(), degrees);
    }
    if contrib.attr("equal-contrib") == Some("yes") {
        extra.insert("equal-contrib".to_string(), "yes".to_string());
    }

    Contributor {
        contributor_type: capitalize(declared),
        first_name,
        last_name,
        email,
        affiliations,
        extra,
    }
}

fn resolve_affiliation<'a>(article: &'a Element, rid: &str) -> Option<&'a Element> {
    article
        .find_all("aff")
        .into_iter()
        .find(|aff| aff.attr("id") == Some(rid))
}

/// Affiliation text with label and superscript markers stripped; institutions
/// from `institution-wrap` lead the string when present.
fn affiliation_text(aff: &Element) -> String {
    let institutions: Vec<String> = aff
        .find_all("institution")
        .into_iter()
        .map(|i| i.collapsed_text())
        .filter(|t| !t.is_empty())
        .collect();
    let rest = aff.collapsed_text_excluding(&["label", "sup", "institution-wrap", "email"]);
    let mut parts = institutions;
    if !rest.is_empty() {
        parts.push(rest);
    }
    collapse_ws(&parts.join(" "))
        .trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
