//! In-place tree cleaning applied before text extraction.
//!
//! Two passes over the article tree: one to flatten presentational markup,
//! one to delete inline cross-reference and float stubs. Tail text lives in
//! sibling text nodes, so deleting an element never eats the whitespace
//! around it; leftover citation brackets are tidied per paragraph.

use super::tree::{collapse_ws, Element, Node};

/// Presentational wrappers whose children are spliced into the parent.
const UNWRAP: &[&str] = &[
    "italic",
    "bold",
    "underline",
    "i",
    "b",
    "u",
    "sc",
    "monospace",
    "styled-content",
    "named-content",
    "ext-link",
    "uri",
];

/// Inline stubs removed from the text flow. The dedicated extractors have
/// already seen the full entities by the time this runs.
const REMOVE: &[&str] = &[
    "xref",
    "target",
    "ref",
    "fig",
    "table-wrap",
    "table-wrap-foot",
    "supplementary-material",
    "media",
    "disp-formula",
    "graphic",
    "inline-graphic",
    "object-id",
];

pub fn clean_article(article: &mut Element) {
    strip_styling(article);
    remove_inline_stubs(article);
}

/// Unwrap emphasis markup, turn `sub`/`sup` into `_`/`^` markers.
pub fn strip_styling(el: &mut Element) {
    let children = std::mem::take(&mut el.children);
    let mut out = Vec::with_capacity(children.len());
    for node in children {
        match node {
            Node::Element(mut child) => {
                strip_styling(&mut child);
                let name = child.local_name();
                if UNWRAP.contains(&name) {
                    out.extend(child.children);
                } else if name == "sub" {
                    out.push(Node::Text(format!("_{}_", raw_text(&child))));
                } else if name == "sup" {
                    out.push(Node::Text(format!("^{}^", raw_text(&child))));
                } else {
                    out.push(Node::Element(child));
                }
            }
            text => out.push(text),
        }
    }
    el.children = out;
}

pub fn remove_inline_stubs(el: &mut Element) {
    el.children.retain(|node| match node {
        Node::Element(child) => !REMOVE.contains(&child.local_name()),
        Node::Text(_) => true,
    });
    for node in &mut el.children {
        if let Node::Element(child) = node {
            remove_inline_stubs(child);
        }
    }
}

fn raw_text(el: &Element) -> String {
    let mut buf = String::new();
    for node in &el.children {
        match node {
            Node::Text(t) => buf.push_str(t),
            Node::Element(e) => buf.push_str(&raw_text(e)),
        }
    }
    buf
}

/// Final pass over an extracted paragraph string: drop bracket pairs emptied
/// by xref removal, collapse whitespace, repair punctuation spacing.
pub fn tidy_paragraph(text: &str) -> String {
    let mut out = collapse_ws(&strip_empty_brackets(text));
    loop {
        let fixed = out
            .replace(" ,", ",")
            .replace(" ;", ";")
            .replace(" .", ".")
            .replace(" )", ")")
            .replace("( ", "(")
            .replace(",,", ",")
            .replace(", ,", ",")
            .replace(";;", ";");
        if fixed == out {
            break;
        }
        out = fixed;
    }
    out.trim().to_string()
}

fn strip_empty_brackets(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '[' || c == '(' {
            let close = if c == '[' { ']' } else { ')' };
            if let Some(j) = matching_close(&chars, i + 1, c, close) {
                let only_separators = chars[i + 1..j]
                    .iter()
                    .all(|&x| x.is_whitespace() || matches!(x, ',' | ';' | '-' | '\u{2013}' | '\u{2014}'));
                if only_separators {
                    i = j + 1;
                    continue;
                }
            }
        }
        out.push(c);
        i += 1;
    }
    out
}

fn matching_close(chars: &[char], start: usize, open: char, close: char) -> Option<usize> {
    // Bounded scan: emptied citation brackets are short.
    for (offset, &c) in chars[start..].iter().take(24).enumerate() {
        if c == close {
            return Some(start + offset);
        }
        if c == open {
            return None;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::tree::parse;

    #[test]
    fn unwraps_emphasis_keeping_text() {
        let mut el = parse(b"<p>shown <italic>in vivo</italic> here</p>").unwrap();
        strip_styling(&mut el);
        assert_eq!(el.collapsed_text(), "shown in vivo here");
    }

    #[test]
    fn sub_and_sup_become_markers() {
        let mut el = parse(b"<p>H<sub>2</sub>O and x<sup>2</sup></p>").unwrap();
        strip_styling(&mut el);
        assert_eq!(el.collapsed_text(), "H_2_O and x^2^");
    }

    #[test]
    fn xref_removal_preserves_surrounding_whitespace() {
        let mut el =
            parse(b"<p>as shown <xref ref-type=\"bibr\" rid=\"B1\">1</xref> previously</p>")
                .unwrap();
        remove_inline_stubs(&mut el);
        assert_eq!(el.collapsed_text(), "as shown previously");
    }

    #[test]
    fn citation_brackets_collapse_without_duplicate_punctuation() {
        let mut el = parse(
            b"<p>reported [<xref rid=\"B1\">1</xref>,<xref rid=\"B2\">2</xref>]. Next sentence.</p>",
        )
        .unwrap();
        remove_inline_stubs(&mut el);
        let text = tidy_paragraph(&el.collapsed_text());
        assert_eq!(text, "reported. Next sentence.");
    }

    #[test]
    fn inline_table_and_figure_stubs_are_dropped() {
        let mut el = parse(
            b"<sec><p>intro</p><fig id=\"F1\"><caption><p>cap</p></caption></fig><p>outro</p></sec>",
        )
        .unwrap();
        remove_inline_stubs(&mut el);
        assert_eq!(el.find_all("fig").len(), 0);
        assert_eq!(el.collapsed_text(), "intro outro");
    }

    #[test]
    fn keeps_non_empty_brackets() {
        assert_eq!(
            tidy_paragraph("values (p < 0.05) were [] significant"),
            "values (p < 0.05) were significant"
        );
    }

    #[test]
    fn ext_link_text_is_preserved() {
        let mut el = parse(
            b"<p>data at <ext-link xlink:href=\"https://example.org\" xmlns:xlink=\"http://www.w3.org/1999/xlink\">the repository</ext-link>.</p>",
        )
        .unwrap();
        strip_styling(&mut el);
        assert_eq!(el.collapsed_text(), "data at the repository.");
    }
}
