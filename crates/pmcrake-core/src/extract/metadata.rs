//! Bibliographic and journal metadata extraction.

use indexmap::IndexMap;

use crate::identifiers::Pmcid;
use crate::xml::Element;

fn article_meta(article: &Element) -> Option<&Element> {
    article
        .child("front")
        .and_then(|f| f.child("article-meta"))
        .or_else(|| article.find("article-meta"))
}

fn journal_meta(article: &Element) -> Option<&Element> {
    article
        .child("front")
        .and_then(|f| f.child("journal-meta"))
        .or_else(|| article.find("journal-meta"))
}

/// Article title from the front-matter title group. Searching the whole tree
/// would hit citation titles first, so the path is walked explicitly.
pub fn extract_title(article: &Element) -> String {
    article_meta(article)
        .and_then(|m| m.child("title-group"))
        .and_then(|g| g.child("article-title"))
        .map(|t| t.collapsed_text())
        .unwrap_or_default()
}

/// Journal identifiers keyed by `journal-id-type`, with ISSNs folded in as
/// `issn-<pub-type>` entries.
pub fn extract_journal_id(article: &Element) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    let Some(meta) = journal_meta(article) else {
        return out;
    };
    for jid in meta.children_named("journal-id") {
        let key = jid.attr("journal-id-type").unwrap_or("journal-id");
        out.insert(key.to_string(), jid.collapsed_text());
    }
    for issn in meta.children_named("issn") {
        let key = match issn.attr("pub-type").or_else(|| issn.attr("publication-format")) {
            Some(t) => format!("issn-{t}"),
            None => "issn".to_string(),
        };
        out.insert(key, issn.collapsed_text());
    }
    out
}

pub fn extract_journal_title(article: &Element) -> String {
    journal_meta(article)
        .and_then(|m| m.find("journal-title"))
        .map(|t| t.collapsed_text())
        .unwrap_or_default()
}

pub fn extract_publisher(article: &Element) -> (String, String) {
    let publisher = journal_meta(article).and_then(|m| m.child("publisher"));
    let name = publisher
        .and_then(|p| p.child_text("publisher-name"))
        .unwrap_or_default();
    let location = publisher
        .and_then(|p| p.child_text("publisher-loc"))
        .unwrap_or_default();
    (name, location)
}

/// Article identifiers keyed by `pub-id-type`. The `pmcid` entry is always
/// present, injected from the requested ID when the XML does not carry one.
pub fn extract_article_ids(article: &Element, pmcid: &Pmcid) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    if let Some(meta) = article_meta(article) {
        for aid in meta.children_named("article-id") {
            let key = aid.attr("pub-id-type").unwrap_or("article-id");
            out.insert(key.to_string(), aid.collapsed_text());
        }
    }
    if !out.contains_key("pmcid") {
        out.insert("pmcid".to_string(), pmcid.prefixed());
    }
    out
}

/// Heading subject-group entries: the article's primary type classification.
pub fn extract_article_types(article: &Element) -> Vec<String> {
    let Some(cats) = article_meta(article).and_then(|m| m.child("article-categories")) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for group in cats.children_named("subj-group") {
        if group.attr("subj-group-type") == Some("heading") {
            collect_subjects(group, &mut out);
        }
    }
    dedup(out)
}

/// Non-heading, non-keyword subject groups.
pub fn extract_article_categories(article: &Element) -> Vec<String> {
    let Some(cats) = article_meta(article).and_then(|m| m.child("article-categories")) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for group in cats.children_named("subj-group") {
        match group.attr("subj-group-type") {
            Some("heading") | Some("kwd") | Some("keyword") => {}
            _ => collect_subjects(group, &mut out),
        }
    }
    dedup(out)
}

fn collect_subjects(group: &Element, out: &mut Vec<String>) {
    for subject in group.children_named("subject") {
        let text = subject.collapsed_text();
        if !text.is_empty() {
            out.push(text);
        }
    }
    for nested in group.children_named("subj-group") {
        collect_subjects(nested, out);
    }
}

/// Keywords from `kwd-group` elements plus keyword-typed subject groups,
/// deduplicated preserving first-seen order.
pub fn extract_keywords(article: &Element) -> Vec<String> {
    let mut out = Vec::new();
    for group in article.find_all("kwd-group") {
        for kwd in group.find_all("kwd") {
            let text = kwd.collapsed_text();
            if !text.is_empty() {
                out.push(text);
            }
        }
    }
    if let Some(cats) = article_meta(article).and_then(|m| m.child("article-categories")) {
        for group in cats.children_named("subj-group") {
            if matches!(group.attr("subj-group-type"), Some("kwd") | Some("keyword")) {
                collect_subjects(group, &mut out);
            }
        }
    }
    dedup(out)
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Publication dates keyed by `pub-type` (falling back to `date-type`),
/// formatted `YYYY-MM-DD` with missing month/day defaulting to `01`.
pub fn extract_published_dates(article: &Element) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    let Some(meta) = article_meta(article) else {
        return out;
    };
    for pd in meta.children_named("pub-date") {
        let key = pd
            .attr("pub-type")
            .or_else(|| pd.attr("date-type"))
            .unwrap_or("unknown");
        if let Some(date) = assemble_date(pd) {
            out.insert(key.to_string(), date);
        }
    }
    out
}

/// Manuscript history dates (received, accepted, revised, ...).
pub fn extract_history_dates(article: &Element) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    let Some(history) = article_meta(article).and_then(|m| m.child("history")) else {
        return out;
    };
    for date in history.children_named("date") {
        let key = date.attr("date-type").unwrap_or("unknown");
        if let Some(iso) = assemble_date(date) {
            out.insert(key.to_string(), iso);
        }
    }
    out
}

/// Build an ISO date from year/month/day children. A date without a year is
/// dropped; out-of-range day/month values fall back to `01`.
pub fn assemble_date(el: &Element) -> Option<String> {
    let year: i32 = el.child_text("year")?.trim().parse().ok()?;
    let month: u32 = el
        .child_text("month")
        .and_then(|m| m.trim().parse().ok())
        .unwrap_or(1);
    let day: u32 = el
        .child_text("day")
        .and_then(|d| d.trim().parse().ok())
        .unwrap_or(1);
    let date = chrono::NaiveDate::from_ymd_opt(year, month, day)
        .or_else(|| chrono::NaiveDate::from_ymd_opt(year, month, 1))
        .or_else(|| chrono::NaiveDate::from_ymd_opt(year, 1, 1))?;
    Some(date.format("%Y-%m-%d").to_string())
}

pub struct Pagination {
    pub volume: String,
    pub issue: String,
    pub first_page: String,
    pub last_page: String,
    pub elocation_id: String,
}

pub fn extract_pagination(article: &Element) -> Pagination {
    let meta = article_meta(article);
    let text = |name: &str| {
        meta.and_then(|m| m.child_text(name))
            .map(|t| t.trim().to_string())
            .unwrap_or_default()
    };
    Pagination {
        volume: text("volume"),
        issue: text("issue"),
        first_page: text("fpage"),
        last_page: text("lpage"),
        elocation_id: text("elocation-id"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_article;

    const META_XML: &str = r#"<article>
      <front>
        <journal-meta>
          <journal-id journal-id-type="nlm-ta">Nat Biotechnol</journal-id>
          <journal-id journal-id-type="iso-abbrev">Nat. Biotechnol.</journal-id>
          <issn pub-type="ppub">1087-0156</issn>
          <issn pub-type="epub">1546-1696</issn>
          <journal-title-group><journal-title>Nature Biotechnology</journal-title></journal-title-group>
          <publisher>
            <publisher-name>Nature Publishing Group</publisher-name>
            <publisher-loc>New York</publisher-loc>
          </publisher>
        </journal-meta>
        <article-meta>
          <article-id pub-id-type="pmid">33087749</article-id>
          <article-id pub-id-type="doi">10.1038/s41586-020-2832-5</article-id>
          <title-group><article-title>A study of things</article-title></title-group>
          <article-categories>
            <subj-group subj-group-type="heading"><subject>Research Article</subject></subj-group>
            <subj-group subj-group-type="discipline"><subject>Genomics</subject></subj-group>
            <subj-group subj-group-type="kwd"><subject>CRISPR</subject></subj-group>
          </article-categories>
          <volume>38</volume>
          <issue>4</issue>
          <fpage>276</fpage>
          <lpage>284</lpage>
          <elocation-id>e1001</elocation-id>
          <history>
            <date date-type="received"><day>03</day><month>01</month><year>2020</year></date>
            <date date-type="accepted"><month>3</month><year>2020</year></date>
          </history>
          <pub-date pub-type="epub"><day>15</day><month>4</month><year>2020</year></pub-date>
          <pub-date pub-type="collection"><year>2020</year></pub-date>
          <kwd-group kwd-group-type="author">
            <kwd>gene editing</kwd><kwd>CRISPR</kwd><kwd>gene editing</kwd>
          </kwd-group>
        </article-meta>
      </front>
    </article>"#;

    fn article() -> Element {
        parse_article(META_XML.as_bytes()).unwrap()
    }

    #[test]
    fn title_comes_from_front_matter() {
        assert_eq!(extract_title(&article()), "A study of things");
    }

    #[test]
    fn journal_ids_include_issn_entries() {
        let ids = extract_journal_id(&article());
        assert_eq!(ids.get("nlm-ta").unwrap(), "Nat Biotechnol");
        assert_eq!(ids.get("issn-ppub").unwrap(), "1087-0156");
        assert_eq!(ids.get("issn-epub").unwrap(), "1546-1696");
    }

    #[test]
    fn pmcid_is_injected_when_absent() {
        let ids = extract_article_ids(&article(), &Pmcid::parse("7181753").unwrap());
        assert_eq!(ids.get("pmcid").unwrap(), "PMC7181753");
        assert_eq!(ids.get("pmid").unwrap(), "33087749");
        assert_eq!(ids.get("doi").unwrap(), "10.1038/s41586-020-2832-5");
    }

    #[test]
    fn types_and_categories_are_split() {
        let a = article();
        assert_eq!(extract_article_types(&a), ["Research Article"]);
        assert_eq!(extract_article_categories(&a), ["Genomics"]);
    }

    #[test]
    fn keywords_deduplicate_first_seen() {
        assert_eq!(
            extract_keywords(&article()),
            ["gene editing", "CRISPR"]
        );
    }

    #[test]
    fn dates_default_missing_parts_to_one() {
        let a = article();
        let pub_dates = extract_published_dates(&a);
        assert_eq!(pub_dates.get("epub").unwrap(), "2020-04-15");
        assert_eq!(pub_dates.get("collection").unwrap(), "2020-01-01");

        let history = extract_history_dates(&a);
        assert_eq!(history.get("received").unwrap(), "2020-01-03");
        assert_eq!(history.get("accepted").unwrap(), "2020-03-01");
    }

    #[test]
    fn pagination_fields_stay_strings() {
        let p = extract_pagination(&article());
        assert_eq!(p.volume, "38");
        assert_eq!(p.issue, "4");
        assert_eq!(p.first_page, "276");
        assert_eq!(p.last_page, "284");
        assert_eq!(p.elocation_id, "e1001");
    }

    #[test]
    fn publisher_name_and_location() {
        let (name, loc) = extract_publisher(&article());
        assert_eq!(name, "Nature Publishing Group");
        assert_eq!(loc, "New York");
    }
}
