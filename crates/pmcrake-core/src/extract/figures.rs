//! Figure metadata extraction. Image bytes are never downloaded; the
//! `graphic_href` is the relative link as it appears in the XML.

use crate::document::Figure;
use crate::xml::clean::tidy_paragraph;
use crate::xml::Element;

pub fn extract_figures(article: &Element) -> Vec<Figure> {
    article
        .find_all("fig")
        .into_iter()
        .map(|fig| Figure {
            id: fig.attr("id").unwrap_or_default().to_string(),
            label: fig.child_text("label").unwrap_or_default(),
            caption: fig
                .child("caption")
                .map(|c| tidy_paragraph(&c.collapsed_text()))
                .unwrap_or_default(),
            graphic_href: fig
                .find("graphic")
                .and_then(|g| g.attr("href"))
                .unwrap_or_default()
                .to_string(),
            alt_text: fig
                .find_text("alt-text")
                .unwrap_or_default(),
        })
        .collect()
}
