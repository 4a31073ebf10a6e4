//! Per-entity extraction routines.
//!
//! Extractors are pure functions over the parsed tree: they return empty
//! values when their entity is absent and never fail. Only well-formedness
//! problems surface earlier, from the XML layer.

pub mod citations;
pub mod content;
pub mod contributors;
pub mod equations;
pub mod figures;
pub mod metadata;
pub mod sections;
pub mod tables;
