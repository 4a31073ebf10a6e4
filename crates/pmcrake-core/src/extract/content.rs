//! Permissions, funding, ethics and the long tail of back-matter metadata.

use indexmap::IndexMap;

use crate::document::{RelatedArticle, SelfUri, SupplementaryMaterial, VersionRecord};
use crate::extract::metadata::assemble_date;
use crate::xml::clean::tidy_paragraph;
use crate::xml::Element;

fn article_meta(article: &Element) -> Option<&Element> {
    article
        .child("front")
        .and_then(|f| f.child("article-meta"))
        .or_else(|| article.find("article-meta"))
}

pub struct Permissions {
    pub map: IndexMap<String, String>,
    pub copyright_statement: String,
    pub license_type: String,
}

/// Copyright and license data from `<permissions>`. The license type comes
/// from the `license-type` attribute when present, otherwise from the first
/// Creative Commons URL found inside the license block.
pub fn extract_permissions(article: &Element) -> Permissions {
    let mut map = IndexMap::new();
    let mut copyright_statement = String::new();
    let mut license_type = String::new();

    if let Some(perms) = article_meta(article).and_then(|m| m.child("permissions")) {
        if let Some(statement) = perms.child_text("copyright-statement") {
            copyright_statement = statement;
        }
        if let Some(year) = perms.child_text("copyright-year") {
            map.insert("copyright_year".to_string(), year);
        }
        if let Some(holder) = perms.child_text("copyright-holder") {
            map.insert("copyright_holder".to_string(), holder);
        }
        if let Some(license) = perms.child("license") {
            license_type = license
                .attr("license-type")
                .map(str::to_string)
                .or_else(|| license_url_type(license))
                .unwrap_or_default();
            let text = license
                .children_named("license-p")
                .map(|p| tidy_paragraph(&p.collapsed_text()))
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            if !text.is_empty() {
                map.insert("license_text".to_string(), text);
            }
        }
    }

    if !copyright_statement.is_empty() {
        map.insert(
            "copyright_statement".to_string(),
            copyright_statement.clone(),
        );
    }
    if !license_type.is_empty() {
        map.insert("license_type".to_string(), license_type.clone());
    }

    Permissions {
        map,
        copyright_statement,
        license_type,
    }
}

fn license_url_type(license: &Element) -> Option<String> {
    let mut urls = Vec::new();
    if let Some(href) = license.attr("href") {
        urls.push(href.to_string());
    }
    collect_hrefs(license, &mut urls);
    for url in urls {
        if let Some(rest) = url.split("creativecommons.org/licenses/").nth(1) {
            let code = rest.split('/').next().unwrap_or("");
            if !code.is_empty() {
                return Some(format!("cc-{code}"));
            }
        }
    }
    None
}

fn collect_hrefs(el: &Element, out: &mut Vec<String>) {
    for child in el.child_elements() {
        if let Some(href) = child.attr("href") {
            out.push(href.to_string());
        }
        collect_hrefs(child, out);
    }
}

/// Funding institutions from award groups, deduplicated.
pub fn extract_funding(article: &Element) -> Vec<String> {
    let mut out = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for group in article.find_all("funding-group") {
        for source in group.find_all("funding-source") {
            let institutions = source.find_all("institution");
            let texts: Vec<String> = if institutions.is_empty() {
                vec![source.collapsed_text()]
            } else {
                institutions.iter().map(|i| i.collapsed_text()).collect()
            };
            for text in texts {
                if !text.is_empty() && seen.insert(text.clone()) {
                    out.push(text);
                }
            }
        }
    }
    out
}

/// Ethics and disclosure statements. Keys are stable snake_case names; the
/// conflict-of-interest footnote fallback mirrors how publishers actually
/// file these.
pub fn extract_ethics(article: &Element) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    let fields: [(&str, &str); 5] = [
        ("conflicts_of_interest", "conflict-of-interest"),
        ("ethics_statement", "ethics-statement"),
        ("data_availability", "data-availability"),
        ("author_contributions", "author-notes"),
        ("patient_consent", "patient-consent"),
    ];
    for (key, tag) in fields {
        let texts: Vec<String> = article
            .find_all(tag)
            .into_iter()
            .map(|el| tidy_paragraph(&el.collapsed_text()))
            .filter(|t| !t.is_empty())
            .collect();
        if !texts.is_empty() {
            out.insert(key.to_string(), texts.join("\n"));
        }
    }

    let trials: Vec<String> = article
        .find_all("clinical-trial-number")
        .into_iter()
        .chain(
            article
                .find_all("other-id")
                .into_iter()
                .filter(|el| el.attr("other-id-type") == Some("clinical-trial-number")),
        )
        .map(|el| el.collapsed_text())
        .filter(|t| !t.is_empty())
        .collect();
    if !trials.is_empty() {
        out.insert("clinical_trial_registration".to_string(), trials.join("\n"));
    }

    if !out.contains_key("conflicts_of_interest") {
        let texts: Vec<String> = article
            .find_all("fn")
            .into_iter()
            .filter(|fn_el| fn_el.attr("fn-type") == Some("conflict"))
            .map(|fn_el| tidy_paragraph(&fn_el.collapsed_text()))
            .filter(|t| !t.is_empty())
            .collect();
        if !texts.is_empty() {
            out.insert("conflicts_of_interest".to_string(), texts.join("\n"));
        }
    }
    out
}

pub fn extract_supplementary(article: &Element) -> Vec<SupplementaryMaterial> {
    let mut out = Vec::new();
    for tag in ["supplementary-material", "media"] {
        for supp in article.find_all(tag) {
            let href = supp
                .attr("href")
                .map(str::to_string)
                .or_else(|| {
                    supp.find("ext-link")
                        .and_then(|e| e.attr("href"))
                        .map(str::to_string)
                })
                .or_else(|| {
                    supp.find("graphic")
                        .and_then(|g| g.attr("href"))
                        .map(str::to_string)
                })
                .unwrap_or_default();
            out.push(SupplementaryMaterial {
                label: supp
                    .child_text("label")
                    .or_else(|| supp.attr("id").map(str::to_string))
                    .unwrap_or_default(),
                caption: supp
                    .child("caption")
                    .map(|c| tidy_paragraph(&c.collapsed_text()))
                    .unwrap_or_default(),
                href,
                tag: tag.to_string(),
            });
        }
    }
    out
}

/// Footnote paragraphs from back-matter fn-groups.
pub fn extract_footnotes(article: &Element) -> Vec<String> {
    let Some(back) = article.child("back") else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for group in back.find_all("fn-group") {
        for fn_el in group.children_named("fn") {
            let text = tidy_paragraph(&fn_el.collapsed_text_excluding(&["label"]));
            if !text.is_empty() {
                out.push(text);
            }
        }
    }
    out
}

pub fn extract_acknowledgements(article: &Element) -> Vec<String> {
    article
        .find_all("ack")
        .into_iter()
        .map(|ack| tidy_paragraph(&ack.collapsed_text()))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Top-level notes, nested notes indented under their parent.
pub fn extract_notes(article: &Element) -> Vec<String> {
    let mut out = Vec::new();
    collect_top_level_notes(article, &mut out);
    out
}

fn collect_top_level_notes(el: &Element, out: &mut Vec<String>) {
    for child in el.child_elements() {
        if child.is("notes") {
            let text = stringify_note(child);
            if !text.is_empty() {
                out.push(text);
            }
        } else {
            collect_top_level_notes(child, out);
        }
    }
}

fn stringify_note(note: &Element) -> String {
    let mut buf = String::new();
    for child in note.child_elements() {
        match child.local_name() {
            "title" => {
                buf.push_str("Title: ");
                buf.push_str(&child.collapsed_text());
                buf.push('\n');
            }
            "p" => {
                buf.push_str(&tidy_paragraph(&child.collapsed_text()));
                buf.push('\n');
            }
            "notes" => {
                for line in stringify_note(child).lines() {
                    buf.push_str("    ");
                    buf.push_str(line);
                    buf.push('\n');
                }
            }
            _ => {}
        }
    }
    buf.trim().to_string()
}

pub fn extract_appendices(article: &Element) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    for (idx, app) in article.find_all("app").into_iter().enumerate() {
        let title = app
            .child_text("title")
            .or_else(|| app.child_text("label"))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("Appendix {}", idx + 1));
        let text = tidy_paragraph(&app.collapsed_text_excluding(&["title", "label"]));
        if !text.is_empty() {
            out.insert(title, text);
        }
    }
    out
}

pub fn extract_glossary(article: &Element) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    for glossary in article.find_all("glossary") {
        for item in glossary.find_all("def-item") {
            let term = item.find_text("term").unwrap_or_default();
            let definition = item
                .find("def")
                .map(|d| tidy_paragraph(&d.collapsed_text()))
                .unwrap_or_default();
            if !term.is_empty() {
                out.insert(term, definition);
            }
        }
    }
    out
}

pub fn extract_related_articles(article: &Element) -> Vec<RelatedArticle> {
    article
        .find_all("related-article")
        .into_iter()
        .map(|rel| RelatedArticle {
            relation_type: rel
                .attr("related-article-type")
                .unwrap_or_default()
                .to_string(),
            href: rel.attr("href").unwrap_or_default().to_string(),
            text: rel.collapsed_text(),
        })
        .collect()
}

pub fn extract_conference(article: &Element) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    let Some(conf) = article_meta(article).and_then(|m| m.child("conference")) else {
        return out;
    };
    for (key, tag) in [
        ("name", "conf-name"),
        ("location", "conf-loc"),
        ("date", "conf-date"),
        ("acronym", "conf-acronym"),
        ("sponsor", "conf-sponsor"),
    ] {
        if let Some(value) = conf.child_text(tag).filter(|v| !v.is_empty()) {
            out.insert(key.to_string(), value);
        }
    }
    out
}

/// Translated titles keyed by language (`und` when no `xml:lang` is given).
pub fn extract_translated_titles(article: &Element) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    let Some(meta) = article_meta(article) else {
        return out;
    };
    for trans in meta.find_all("trans-title-group") {
        let lang = trans.attr("lang").unwrap_or("und").to_string();
        if let Some(title) = trans.find_text("trans-title").filter(|t| !t.is_empty()) {
            out.insert(lang, title);
        }
    }
    if out.is_empty() {
        for title in meta.find_all("trans-title") {
            let lang = title.attr("lang").unwrap_or("und").to_string();
            let text = title.collapsed_text();
            if !text.is_empty() {
                out.insert(lang, text);
            }
        }
    }
    out
}

pub fn extract_translated_abstracts(article: &Element) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    let Some(meta) = article_meta(article) else {
        return out;
    };
    for trans in meta.children_named("trans-abstract") {
        let lang = trans.attr("lang").unwrap_or("und").to_string();
        let text: Vec<String> = trans
            .find_all("p")
            .into_iter()
            .map(|p| tidy_paragraph(&p.collapsed_text()))
            .filter(|t| !t.is_empty())
            .collect();
        if !text.is_empty() {
            out.insert(lang, text.join(" "));
        }
    }
    out
}

pub fn extract_version_history(article: &Element) -> Vec<VersionRecord> {
    let Some(meta) = article_meta(article) else {
        return Vec::new();
    };
    meta.find_all("article-version")
        .into_iter()
        .map(|ver| VersionRecord {
            version: ver
                .attr("version")
                .map(str::to_string)
                .or_else(|| ver.child_text("version"))
                .unwrap_or_else(|| ver.collapsed_text()),
            date: ver.child("date").and_then(assemble_date).unwrap_or_default(),
        })
        .collect()
}

/// `<counts>` children keyed by element name: fig-count, table-count, ...
pub fn extract_counts(article: &Element) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    let Some(counts) = article_meta(article).and_then(|m| m.child("counts")) else {
        return out;
    };
    for counter in counts.child_elements() {
        let value = counter
            .attr("count")
            .map(str::to_string)
            .unwrap_or_else(|| counter.collapsed_text());
        if !value.is_empty() {
            out.insert(counter.local_name().to_string(), value);
        }
    }
    out
}

pub fn extract_self_uris(article: &Element) -> Vec<SelfUri> {
    let Some(meta) = article_meta(article) else {
        return Vec::new();
    };
    meta.find_all("self-uri")
        .into_iter()
        .map(|uri| SelfUri {
            content_type: uri.attr("content-type").unwrap_or_default().to_string(),
            href: uri
                .attr("href")
                .map(str::to_string)
                .unwrap_or_else(|| uri.collapsed_text()),
        })
        .collect()
}

pub fn extract_custom_meta(article: &Element) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    for meta in article.find_all("custom-meta") {
        let Some(name) = meta.child_text("meta-name").filter(|n| !n.is_empty()) else {
            continue;
        };
        let value = meta.child_text("meta-value").unwrap_or_default();
        if !value.is_empty() {
            out.insert(name, value);
        }
    }
    out
}
