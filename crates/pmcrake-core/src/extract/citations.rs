//! Reference-list parsing.
//!
//! Citations are parsed to best-effort structured form; the verbatim `raw`
//! text is always retained so nothing is lost when a publisher's markup
//! defeats the field extraction.

use crate::document::Citation;
use crate::xml::clean::tidy_paragraph;
use crate::xml::Element;

const CITATION_TAGS: &[&str] = &["element-citation", "mixed-citation", "citation", "nlm-citation"];

pub fn extract_citations(article: &Element) -> Vec<Citation> {
    let mut out = Vec::new();
    for ref_list in article.find_all("ref-list") {
        for r in ref_list.children_named("ref") {
            out.push(parse_ref(r));
        }
    }
    out
}

fn parse_ref(r: &Element) -> Citation {
    let id = r.attr("id").unwrap_or_default().to_string();
    let citation_el = r
        .child_elements()
        .find(|e| CITATION_TAGS.contains(&e.local_name()));

    let raw_source = citation_el.unwrap_or(r);
    let raw = tidy_paragraph(&raw_source.collapsed_text_excluding(&["label"]));

    let mut citation = Citation {
        id,
        raw,
        ..Citation::default()
    };

    let Some(el) = citation_el else {
        return citation;
    };

    citation.authors = parse_authors(el);
    citation.title = el
        .find_text("article-title")
        .or_else(|| el.find_text("chapter-title"))
        .unwrap_or_default();
    citation.source = el.find_text("source").unwrap_or_default();
    citation.year = el.find_text("year").unwrap_or_default();
    citation.volume = el.find_text("volume").unwrap_or_default();
    citation.pages = parse_pages(el);

    for pub_id in el.find_all("pub-id") {
        let value = pub_id.collapsed_text();
        match pub_id.attr("pub-id-type") {
            Some("doi") => citation.doi = value,
            Some("pmid") => citation.pmid = value,
            Some("pmcid") | Some("pmc") => citation.pmcid = value,
            _ => {}
        }
    }

    citation
}

fn parse_authors(el: &Element) -> Vec<String> {
    let mut authors = Vec::new();
    let groups: Vec<&Element> = el
        .find_all("person-group")
        .into_iter()
        .filter(|g| matches!(g.attr("person-group-type"), None | Some("author")))
        .collect();

    if groups.is_empty() {
        // Some publishers put <name> elements straight into the citation.
        collect_names(el, &mut authors);
        return authors;
    }
    for group in groups {
        collect_names(group, &mut authors);
    }
    authors
}

fn collect_names(el: &Element, out: &mut Vec<String>) {
    for name in el.children_named("name") {
        let given = name.child_text("given-names").unwrap_or_default();
        let surname = name.child_text("surname").unwrap_or_default();
        let full = format!("{} {}", given.trim(), surname.trim());
        let full = full.trim().to_string();
        if !full.is_empty() {
            out.push(full);
        }
    }
    for collab in el.children_named("collab") {
        let text = collab.collapsed_text();
        if !text.is_empty() {
            out.push(text);
        }
    }
    for string_name in el.children_named("string-name") {
        let text = string_name.collapsed_text();
        if !text.is_empty() {
            out.push(text);
        }
    }
}

fn parse_pages(el: &Element) -> String {
    let fpage = el.find_text("fpage").unwrap_or_default();
    let lpage = el.find_text("lpage").unwrap_or_default();
    match (fpage.is_empty(), lpage.is_empty()) {
        (false, false) => format!("{fpage}-{lpage}"),
        (false, true) => fpage,
        _ => el.find_text("page-range").unwrap_or_default(),
    }
}
