//! XML tree construction and cleaning.

pub mod clean;
pub mod tree;

pub use tree::{collapse_ws, parse, parse_article, Element, Node};
