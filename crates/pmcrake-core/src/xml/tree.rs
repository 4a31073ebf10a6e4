//! Owned XML tree built from quick-xml events.
//!
//! JATS articles arrive with a mix of namespaces (`mml:`, `xlink:`, default).
//! Matching is namespace-agnostic: lookups compare local names only, while
//! the stored qualified name is kept so subtrees (MathML in particular) can
//! be re-serialized faithfully.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Qualified name as it appeared in the source (`mml:math`, `sec`, ...).
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// Common XHTML named entities that show up in PMC payloads but are not part
/// of the XML built-ins quick-xml resolves on its own.
fn resolve_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "nbsp" => "\u{a0}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "hellip" => "\u{2026}",
        "middot" => "\u{b7}",
        "deg" => "\u{b0}",
        "plusmn" => "\u{b1}",
        "times" => "\u{d7}",
        "divide" => "\u{f7}",
        "micro" => "\u{b5}",
        "alpha" => "\u{3b1}",
        "beta" => "\u{3b2}",
        "gamma" => "\u{3b3}",
        "delta" => "\u{3b4}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "sect" => "\u{a7}",
        _ => return None,
    })
}

fn unescape_text(raw: &str) -> String {
    match quick_xml::escape::unescape_with(raw, |e| resolve_entity(e)) {
        Ok(cow) => cow.into_owned(),
        // Unknown entity: keep the raw text rather than dropping content.
        Err(_) => raw.to_string(),
    }
}

fn local(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

/// Parse bytes into the root element of the document.
pub fn parse(bytes: &[u8]) -> Result<Element> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| CoreError::Parse(format!("at byte {}: {e}", reader.buffer_position())))?;
        match event {
            Event::Start(ref e) => {
                stack.push(element_from_start(e));
            }
            Event::Empty(ref e) => {
                let el = element_from_start(e);
                attach(&mut stack, &mut root, Node::Element(el));
            }
            Event::End(_) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| CoreError::Parse("unbalanced end tag".into()))?;
                attach(&mut stack, &mut root, Node::Element(el));
            }
            Event::Text(ref t) => {
                let text = unescape_text(&String::from_utf8_lossy(t));
                if !text.is_empty() {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Text(text));
                    }
                }
            }
            Event::CData(ref t) => {
                let text = String::from_utf8_lossy(t).into_owned();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text(text));
                }
            }
            Event::Eof => break,
            // Prolog, doctype, comments and processing instructions carry no
            // article content.
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(CoreError::Parse("unclosed element at end of input".into()));
    }
    root.ok_or_else(|| CoreError::Parse("no root element".into()))
}

/// Parse bytes and return the first `article` element, wherever it sits
/// (PMC wraps responses in `pmc-articleset`).
pub fn parse_article(bytes: &[u8]) -> Result<Element> {
    let root = parse(bytes)?;
    let root_name = root.local_name().to_string();
    find_owned(root, "article")
        .ok_or_else(|| CoreError::Validation(format!("no <article> element under <{root_name}>")))
}

fn element_from_start(e: &quick_xml::events::BytesStart<'_>) -> Element {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = unescape_text(&String::from_utf8_lossy(&attr.value));
        attrs.push((key, value));
    }
    Element {
        name,
        attrs,
        children: Vec::new(),
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    } else if let Node::Element(el) = node {
        if root.is_none() {
            *root = Some(el);
        }
    }
}

fn find_owned(el: Element, name: &str) -> Option<Element> {
    if el.is(name) {
        return Some(el);
    }
    for child in el.children {
        if let Node::Element(c) = child {
            if let Some(found) = find_owned(c, name) {
                return Some(found);
            }
        }
    }
    None
}

/// Collapse internal whitespace runs to single spaces.
pub fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl Element {
    pub fn local_name(&self) -> &str {
        local(&self.name)
    }

    pub fn is(&self, name: &str) -> bool {
        self.local_name() == name
    }

    /// Attribute lookup by local name (`href` matches `xlink:href`).
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| local(k) == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// First direct child with the given local name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.is(name))
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.child_elements().filter(move |e| e.is(name))
    }

    /// First descendant (depth-first, document order) with the local name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        for e in self.child_elements() {
            if e.is(name) {
                return Some(e);
            }
            if let Some(found) = e.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants with the local name, document order.
    pub fn find_all(&self, name: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect_named(name, &mut out);
        out
    }

    fn collect_named<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        for e in self.child_elements() {
            if e.is(name) {
                out.push(e);
            }
            e.collect_named(name, out);
        }
    }

    /// Whitespace-collapsed text of all descendants.
    pub fn collapsed_text(&self) -> String {
        let mut buf = String::new();
        self.push_text(&mut buf, &[]);
        collapse_ws(&buf)
    }

    /// Same as [`collapsed_text`], skipping subtrees with the given local names.
    pub fn collapsed_text_excluding(&self, skip: &[&str]) -> String {
        let mut buf = String::new();
        self.push_text(&mut buf, skip);
        collapse_ws(&buf)
    }

    fn push_text(&self, buf: &mut String, skip: &[&str]) {
        for node in &self.children {
            match node {
                Node::Text(t) => buf.push_str(t),
                Node::Element(e) => {
                    if !skip.contains(&e.local_name()) {
                        e.push_text(buf, skip);
                    }
                }
            }
        }
    }

    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).map(|e| e.collapsed_text())
    }

    pub fn find_text(&self, name: &str) -> Option<String> {
        self.find(name).map(|e| e.collapsed_text())
    }

    /// Re-serialize this subtree, preserving qualified names and attributes.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out);
        out
    }

    fn write_xml(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attrs {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            out.push_str(&escape_xml(v));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for node in &self.children {
            match node {
                Node::Text(t) => out.push_str(&escape_xml(t)),
                Node::Element(e) => e.write_xml(out),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_preserving_order() {
        let root = parse(b"<a><b>one</b><c x=\"1\">two</c><b>three</b></a>").unwrap();
        assert_eq!(root.name, "a");
        let names: Vec<_> = root.child_elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["b", "c", "b"]);
        assert_eq!(root.child("c").unwrap().attr("x"), Some("1"));
    }

    #[test]
    fn matches_local_names_across_namespaces() {
        let root = parse(
            b"<article xmlns:mml=\"http://www.w3.org/1998/Math/MathML\"><mml:math><mml:mi>x</mml:mi></mml:math></article>",
        )
        .unwrap();
        let math = root.find("math").unwrap();
        assert_eq!(math.name, "mml:math");
        assert_eq!(math.collapsed_text(), "x");
    }

    #[test]
    fn attr_lookup_ignores_namespace_prefix() {
        let root =
            parse(b"<graphic xmlns:xlink=\"http://x\" xlink:href=\"fig1.jpg\"/>").unwrap();
        assert_eq!(root.attr("href"), Some("fig1.jpg"));
    }

    #[test]
    fn decodes_standard_and_xhtml_entities() {
        let root = parse(b"<p>Fisher&#x2019;s test &amp; more&nbsp;data &ndash; done</p>").unwrap();
        let text = root.collapsed_text();
        assert!(text.contains("Fisher\u{2019}s test & more"));
        assert!(text.contains("\u{2013} done"));
    }

    #[test]
    fn parse_article_unwraps_article_set() {
        let root = parse_article(
            b"<pmc-articleset><article><front/></article><article/></pmc-articleset>",
        )
        .unwrap();
        assert_eq!(root.local_name(), "article");
        assert!(root.child("front").is_some());
    }

    #[test]
    fn parse_article_rejects_non_article_payload() {
        let err = parse_article(b"<html><body>error page</body></html>").unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        assert!(matches!(parse(b"<a><b></a>"), Err(CoreError::Parse(_))));
    }

    #[test]
    fn collapses_whitespace_runs() {
        let root = parse(b"<p>\n  spread   over\n  lines\n</p>").unwrap();
        assert_eq!(root.collapsed_text(), "spread over lines");
    }

    #[test]
    fn roundtrips_mathml_subtree() {
        let root = parse(
            b"<disp-formula><mml:math id=\"M1\"><mml:mi>E</mml:mi><mml:mo>=</mml:mo></mml:math></disp-formula>",
        )
        .unwrap();
        let math = root.find("math").unwrap();
        assert_eq!(
            math.to_xml(),
            "<mml:math id=\"M1\"><mml:mi>E</mml:mi><mml:mo>=</mml:mo></mml:math>"
        );
    }
}
