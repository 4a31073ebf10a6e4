//! Abstract and body section extraction.
//!
//! Runs against the cleaned tree. The body is traversed once into an
//! intermediate section tree with titles already deduplicated, and the three
//! views (flat, nested, paragraph list) are derived from it so they can never
//! disagree on titles or ordering.

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::document::{NestedSection, Paragraph};
use crate::xml::clean::tidy_paragraph;
use crate::xml::Element;

pub const UNTITLED: &str = "Untitled Section";

pub struct BodyViews {
    pub flat: IndexMap<String, String>,
    pub nested: IndexMap<String, NestedSection>,
    pub paragraphs: Vec<Paragraph>,
}

/// Abstract as an ordered label -> text mapping. Labeled sub-sections keep
/// their label casing; unlabeled prose accumulates under the single key
/// `Abstract`. Paragraphs inside one entry join with a single space.
pub fn extract_abstract(article: &Element) -> IndexMap<String, String> {
    let Some(abstract_el) = first_abstract(article) else {
        return IndexMap::new();
    };

    let mut out: IndexMap<String, String> = IndexMap::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for child in abstract_el.child_elements() {
        match child.local_name() {
            "sec" => {
                let label = child
                    .child_text("title")
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty());
                match label {
                    Some(label) => {
                        let key = dedup_title(&mut seen, &label);
                        out.insert(key, section_prose(child));
                    }
                    None => append_prose(&mut out, &section_prose(child)),
                }
            }
            "p" => append_prose(&mut out, &tidy_paragraph(&child.collapsed_text())),
            // The abstract's own <title> ("Abstract") adds nothing.
            _ => {}
        }
    }

    out.retain(|_, v| !v.is_empty());
    out
}

fn first_abstract(article: &Element) -> Option<&Element> {
    article
        .child("front")
        .and_then(|f| f.child("article-meta"))
        .and_then(|m| m.child("abstract"))
        .or_else(|| article.find("abstract"))
}

fn append_prose(out: &mut IndexMap<String, String>, text: &str) {
    if text.is_empty() {
        return;
    }
    match out.get_mut("Abstract") {
        Some(existing) if !existing.is_empty() => {
            existing.push(' ');
            existing.push_str(text);
        }
        Some(existing) => *existing = text.to_string(),
        None => {
            out.insert("Abstract".to_string(), text.to_string());
        }
    }
}

/// All paragraph text under a node, joined with single spaces, subsections
/// included in document order.
fn section_prose(sec: &Element) -> String {
    let mut parts = Vec::new();
    collect_prose(sec, &mut parts);
    parts.join(" ")
}

fn collect_prose(el: &Element, parts: &mut Vec<String>) {
    for child in el.child_elements() {
        match child.local_name() {
            "p" => {
                let text = tidy_paragraph(&child.collapsed_text());
                if !text.is_empty() {
                    parts.push(text);
                }
            }
            "sec" | "list" | "list-item" => collect_prose(child, parts),
            _ => {}
        }
    }
}

/// Build all three body views in one traversal of the `<body>` element.
pub fn extract_body(article: &Element) -> BodyViews {
    let tree = match article.child("body").or_else(|| article.find("body")) {
        Some(body) => build_section_tree(body),
        None => Vec::new(),
    };

    let mut flat = IndexMap::new();
    let mut nested = IndexMap::new();
    let mut paragraphs = Vec::new();

    for node in &tree {
        flat.insert(node.title.clone(), flat_text(node));
        nested.insert(node.title.clone(), nested_view(node));
        collect_paragraphs(node, &node.title, true, &mut paragraphs);
    }

    BodyViews {
        flat,
        nested,
        paragraphs,
    }
}

struct SecNode {
    title: String,
    paragraphs: Vec<String>,
    children: Vec<SecNode>,
}

fn build_section_tree(body: &Element) -> Vec<SecNode> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut nodes: Vec<SecNode> = Vec::new();
    let mut loose: Vec<String> = Vec::new();
    let mut loose_at: Option<usize> = None;

    for child in body.child_elements() {
        match child.local_name() {
            "sec" => nodes.push(build_section(child, &mut seen)),
            "p" | "list" => {
                let text = tidy_paragraph(&child.collapsed_text());
                if !text.is_empty() {
                    loose_at.get_or_insert(nodes.len());
                    loose.push(text);
                }
            }
            other => tracing::debug!(tag = other, "skipping unexpected tag in body"),
        }
    }

    // Loose top-level prose becomes its own section at the position of its
    // first paragraph.
    if !loose.is_empty() {
        let title = dedup_title(&mut seen, UNTITLED);
        let node = SecNode {
            title,
            paragraphs: loose,
            children: Vec::new(),
        };
        nodes.insert(loose_at.unwrap_or(nodes.len()).min(nodes.len()), node);
    }

    nodes
}

fn build_section(sec: &Element, seen: &mut HashMap<String, usize>) -> SecNode {
    let raw_title = sec
        .child_text("title")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());
    let title = dedup_title(seen, &raw_title);

    let mut child_seen: HashMap<String, usize> = HashMap::new();
    let mut paragraphs = Vec::new();
    let mut children = Vec::new();

    for child in sec.child_elements() {
        match child.local_name() {
            "p" | "list" => {
                let text = tidy_paragraph(&child.collapsed_text());
                if !text.is_empty() {
                    paragraphs.push(text);
                }
            }
            "sec" => children.push(build_section(child, &mut child_seen)),
            _ => {}
        }
    }

    SecNode {
        title,
        paragraphs,
        children,
    }
}

/// Duplicate titles at the same level get deterministic ` (2)`, ` (3)`
/// suffixes in encounter order.
fn dedup_title(seen: &mut HashMap<String, usize>, title: &str) -> String {
    let count = seen.entry(title.to_string()).or_insert(0);
    *count += 1;
    if *count == 1 {
        title.to_string()
    } else {
        format!("{title} ({count})")
    }
}

/// Flat text of one top-level section: own paragraphs, then each subsection
/// as an indented `SECTION:` block.
fn flat_text(node: &SecNode) -> String {
    let mut parts: Vec<String> = node.paragraphs.clone();
    for child in &node.children {
        let inner = flat_text(child);
        parts.push(format!(
            "SECTION: {}:\n\n    {}",
            child.title,
            inner.replace('\n', "\n    ")
        ));
    }
    parts.join("\n\n")
}

fn nested_view(node: &SecNode) -> NestedSection {
    let mut out = NestedSection {
        text: node.paragraphs.join("\n\n"),
        children: IndexMap::new(),
    };
    for child in &node.children {
        out.children.insert(child.title.clone(), nested_view(child));
    }
    out
}

fn collect_paragraphs(node: &SecNode, top: &str, is_top: bool, out: &mut Vec<Paragraph>) {
    for (idx, text) in node.paragraphs.iter().enumerate() {
        out.push(Paragraph {
            section: top.to_string(),
            subsection: if is_top {
                String::new()
            } else {
                node.title.clone()
            },
            paragraph_index: idx,
            text: text.clone(),
        });
    }
    for child in &node.children {
        collect_paragraphs(child, top, false, out);
    }
}
