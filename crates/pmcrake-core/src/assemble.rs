//! Document assembly: runs the extractors in a fixed order over one article
//! tree and computes the derived views. Given identical input bytes the
//! resulting Document is identical.

use crate::document::Document;
use crate::error::Result;
use crate::extract::{
    citations, content, contributors, equations, figures, metadata, sections, tables,
};
use crate::identifiers::Pmcid;
use crate::xml::{clean, parse_article, Element};

/// Parse article bytes and assemble the full Document.
pub fn document_from_xml(pmcid: &Pmcid, bytes: &[u8]) -> Result<Document> {
    let article = parse_article(bytes)?;
    Ok(assemble_document(pmcid, &article))
}

/// Assemble a Document from an already-parsed `<article>` element.
///
/// Entity extractors (citations, tables, figures, equations, metadata) run
/// against the original tree; the text extractors run against a cleaned
/// clone with inline stubs removed.
pub fn assemble_document(pmcid: &Pmcid, article: &Element) -> Document {
    let mut doc = Document {
        pmc_id: pmcid.as_str().to_string(),
        ..Document::default()
    };

    // Identifiers first so later fields can rely on them.
    doc.article_id = metadata::extract_article_ids(article, pmcid);
    doc.journal_id = metadata::extract_journal_id(article);
    doc.journal_title = metadata::extract_journal_title(article);
    let (publisher_name, publisher_location) = metadata::extract_publisher(article);
    doc.publisher_name = publisher_name;
    doc.publisher_location = publisher_location;

    let pagination = metadata::extract_pagination(article);
    doc.volume = pagination.volume;
    doc.issue = pagination.issue;
    doc.first_page = pagination.first_page;
    doc.last_page = pagination.last_page;
    doc.elocation_id = pagination.elocation_id;

    doc.published_date = metadata::extract_published_dates(article);
    doc.history_dates = metadata::extract_history_dates(article);
    doc.keywords = metadata::extract_keywords(article);
    doc.article_types = metadata::extract_article_types(article);
    doc.article_categories = metadata::extract_article_categories(article);

    doc.authors = contributors::extract_authors(article);
    doc.non_author_contributors = contributors::extract_non_author_contributors(article);

    doc.citations = citations::extract_citations(article);
    doc.tables = tables::extract_tables(article);
    doc.figures = figures::extract_figures(article);
    doc.equations = equations::extract_equations(article);

    let permissions = content::extract_permissions(article);
    doc.permissions = permissions.map;
    doc.copyright_statement = permissions.copyright_statement;
    doc.license_type = permissions.license_type;
    doc.funding = content::extract_funding(article);
    doc.ethics = content::extract_ethics(article);
    doc.supplementary_materials = content::extract_supplementary(article);
    doc.footnotes = content::extract_footnotes(article);
    doc.acknowledgements = content::extract_acknowledgements(article);
    doc.notes = content::extract_notes(article);
    doc.appendices = content::extract_appendices(article);
    doc.glossary = content::extract_glossary(article);
    doc.related_articles = content::extract_related_articles(article);
    doc.conference = content::extract_conference(article);
    doc.translated_titles = content::extract_translated_titles(article);
    doc.translated_abstracts = content::extract_translated_abstracts(article);
    doc.version_history = content::extract_version_history(article);
    doc.counts = content::extract_counts(article);
    doc.self_uris = content::extract_self_uris(article);
    doc.custom_meta = content::extract_custom_meta(article);

    // Text views run on the cleaned tree.
    let mut cleaned = article.clone();
    clean::clean_article(&mut cleaned);
    doc.title = metadata::extract_title(&cleaned);
    doc.abstract_sections = sections::extract_abstract(&cleaned);
    let body = sections::extract_body(&cleaned);
    doc.body = body.flat;
    doc.body_nested = body.nested;
    doc.paragraphs = body.paragraphs;

    doc.compute_derived();
    doc
}
