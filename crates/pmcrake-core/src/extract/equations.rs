//! Equation extraction: MathML subtrees are re-serialized verbatim, TeX
//! annotations are pulled out when a publisher supplies them.

use crate::document::Equation;
use crate::xml::Element;

pub fn extract_equations(article: &Element) -> Vec<Equation> {
    let mut out = Vec::new();
    walk(article, &mut out);
    out
}

fn walk(el: &Element, out: &mut Vec<Equation>) {
    for child in el.child_elements() {
        match child.local_name() {
            "disp-formula" | "inline-formula" => {
                if let Some(eq) = from_formula(child) {
                    out.push(eq);
                }
            }
            "math" => out.push(Equation {
                id: child.attr("id").unwrap_or_default().to_string(),
                mathml: child.to_xml(),
                tex: String::new(),
            }),
            _ => walk(child, out),
        }
    }
}

fn from_formula(formula: &Element) -> Option<Equation> {
    let math = formula.find("math");
    let tex = formula
        .find_text("tex-math")
        .or_else(|| {
            formula
                .find_all("annotation")
                .into_iter()
                .find(|a| {
                    a.attr("encoding")
                        .map(|e| e.to_ascii_lowercase().contains("tex"))
                        .unwrap_or(false)
                })
                .map(|a| a.collapsed_text())
        })
        .unwrap_or_default();

    if math.is_none() && tex.is_empty() {
        return None;
    }
    let id = formula
        .attr("id")
        .or_else(|| math.and_then(|m| m.attr("id")))
        .unwrap_or_default()
        .to_string();
    Some(Equation {
        id,
        mathml: math.map(|m| m.to_xml()).unwrap_or_default(),
        tex,
    })
}
