//! End-to-end transformation checks over a realistic JATS article.

use pmcrake_core::serialize::{document_to_pretty_json, document_to_value};
use pmcrake_core::{document_from_xml, Document, Pmcid};

const ARTICLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<pmc-articleset>
<article xmlns:xlink="http://www.w3.org/1999/xlink" xmlns:mml="http://www.w3.org/1998/Math/MathML" article-type="research-article">
  <front>
    <journal-meta>
      <journal-id journal-id-type="nlm-ta">Front Genet</journal-id>
      <issn pub-type="epub">1664-8021</issn>
      <journal-title-group><journal-title>Frontiers in Genetics</journal-title></journal-title-group>
      <publisher>
        <publisher-name>Frontiers Media S.A.</publisher-name>
        <publisher-loc>Lausanne</publisher-loc>
      </publisher>
    </journal-meta>
    <article-meta>
      <article-id pub-id-type="pmid">32457925</article-id>
      <article-id pub-id-type="doi">10.3389/fgene.2020.00482</article-id>
      <article-categories>
        <subj-group subj-group-type="heading"><subject>Genetics</subject></subj-group>
      </article-categories>
      <title-group>
        <article-title>Single-cell profiling of <italic>KRAS</italic>-mutant tumors</article-title>
      </title-group>
      <contrib-group>
        <contrib contrib-type="author">
          <name><surname>Nguyen</surname><given-names>Linh</given-names></name>
          <email>linh.nguyen@uni.example</email>
          <xref ref-type="aff" rid="aff1"><sup>1</sup></xref>
        </contrib>
        <contrib contrib-type="author">
          <name><surname>Okafor</surname><given-names>Chidi</given-names></name>
          <xref ref-type="aff" rid="aff1"><sup>1</sup></xref>
        </contrib>
        <aff id="aff1"><label>1</label>Institute of Molecular Biology, Riverside University</aff>
      </contrib-group>
      <pub-date pub-type="epub"><day>12</day><month>5</month><year>2020</year></pub-date>
      <pub-date pub-type="collection"><year>2020</year></pub-date>
      <history>
        <date date-type="received"><day>20</day><month>1</month><year>2020</year></date>
        <date date-type="accepted"><day>17</day><month>4</month><year>2020</year></date>
      </history>
      <volume>11</volume>
      <elocation-id>482</elocation-id>
      <permissions>
        <copyright-statement>Copyright © 2020 Nguyen and Okafor.</copyright-statement>
        <copyright-year>2020</copyright-year>
        <license xlink:href="https://creativecommons.org/licenses/by/4.0/">
          <license-p>Distributed under the terms of the Creative Commons Attribution License.</license-p>
        </license>
      </permissions>
      <abstract>
        <sec><title>Background</title><p>KRAS mutations drive many cancers.</p></sec>
        <sec><title>Results</title><p>We profiled 4,000 cells.</p></sec>
      </abstract>
      <kwd-group><kwd>KRAS</kwd><kwd>single-cell</kwd></kwd-group>
      <counts><fig-count count="1"/><table-count count="1"/></counts>
    </article-meta>
  </front>
  <body>
    <sec id="s1"><title>Introduction</title>
      <p>Oncogenic KRAS signalling has been studied extensively [<xref ref-type="bibr" rid="B1">1</xref>,<xref ref-type="bibr" rid="B2">2</xref>]. It remains hard to target.</p>
    </sec>
    <sec id="s2"><title>Results</title>
      <p>We observed three clusters.</p>
      <sec><title>Exp A</title><p>Cluster one expressed MYC.</p></sec>
      <sec><title>Exp B</title><p>Cluster two was quiescent.</p><p>Cluster three resembled stroma.</p></sec>
      <fig id="F1">
        <label>Figure 1</label>
        <caption><p>UMAP of tumor cells.</p></caption>
        <graphic xlink:href="fgene-11-00482-g001.jpg"/>
      </fig>
      <table-wrap id="T1">
        <label>Table 1</label>
        <caption><p>Cluster sizes.</p></caption>
        <table>
          <thead><tr><th>Cluster</th><th colspan="2">Cells</th></tr></thead>
          <tbody>
            <tr><td>A</td><td>1200</td><td>30%</td></tr>
            <tr><td>B</td><td>1800</td><td>45%</td></tr>
          </tbody>
        </table>
      </table-wrap>
      <disp-formula id="E1">
        <mml:math><mml:mi>f</mml:mi><mml:mo>=</mml:mo><mml:mn>0.45</mml:mn></mml:math>
      </disp-formula>
    </sec>
  </body>
  <back>
    <ack><p>We thank the sequencing core.</p></ack>
    <ref-list>
      <ref id="B1"><element-citation publication-type="journal">
        <person-group person-group-type="author"><name><surname>Prior</surname><given-names>I</given-names></name></person-group>
        <article-title>A comprehensive survey of Ras mutations</article-title>
        <source>Cancer Res</source><year>2012</year><volume>72</volume>
        <fpage>2457</fpage><lpage>2467</lpage>
        <pub-id pub-id-type="pmid">22589270</pub-id>
      </element-citation></ref>
      <ref id="B2"><mixed-citation>Waters A. KRAS: the critical driver. 2018.</mixed-citation></ref>
    </ref-list>
  </back>
</article>
</pmc-articleset>
"#;

fn parse() -> Document {
    document_from_xml(&Pmcid::parse("7181753").unwrap(), ARTICLE.as_bytes()).unwrap()
}

#[test]
fn front_matter_is_extracted() {
    let doc = parse();
    assert_eq!(doc.pmc_id, "7181753");
    assert_eq!(doc.title, "Single-cell profiling of KRAS-mutant tumors");
    assert_eq!(doc.article_id.get("pmcid").unwrap(), "PMC7181753");
    assert_eq!(doc.article_id.get("doi").unwrap(), "10.3389/fgene.2020.00482");
    assert_eq!(doc.journal_title, "Frontiers in Genetics");
    assert_eq!(doc.publisher_name, "Frontiers Media S.A.");
    assert_eq!(doc.volume, "11");
    assert_eq!(doc.elocation_id, "482");
    assert_eq!(doc.article_types, vec!["Genetics".to_string()]);
    assert_eq!(doc.keywords, vec!["KRAS".to_string(), "single-cell".to_string()]);
    assert_eq!(doc.published_date.get("epub").unwrap(), "2020-05-12");
    assert_eq!(doc.published_date.get("collection").unwrap(), "2020-01-01");
    assert_eq!(doc.history_dates.get("received").unwrap(), "2020-01-20");
    assert_eq!(doc.counts.get("fig-count").unwrap(), "1");
}

#[test]
fn authors_resolve_names_emails_and_affiliations() {
    let doc = parse();
    assert_eq!(doc.authors.len(), 2);
    assert_eq!(doc.authors[0].first_name, "Linh");
    assert_eq!(doc.authors[0].last_name, "Nguyen");
    assert_eq!(doc.authors[0].email.as_deref(), Some("linh.nguyen@uni.example"));
    assert!(doc.authors[0].affiliations[0].contains("Institute of Molecular Biology"));
    assert!(doc.authors[1].email.is_none());
    assert!(doc.non_author_contributors.is_empty());
}

#[test]
fn abstract_keeps_labeled_sections_in_order() {
    let doc = parse();
    let keys: Vec<&String> = doc.abstract_sections.keys().collect();
    assert_eq!(keys, ["Background", "Results"]);
    assert_eq!(
        doc.abstract_text,
        "KRAS mutations drive many cancers.\n\nWe profiled 4,000 cells."
    );
}

#[test]
fn body_views_agree_on_structure() {
    let doc = parse();
    assert_eq!(doc.get_toc(), ["Introduction", "Results"]);

    // Inline citation brackets collapse without leaving punctuation debris.
    let intro = doc.body.get("Introduction").unwrap();
    assert_eq!(
        intro,
        "Oncogenic KRAS signalling has been studied extensively. It remains hard to target."
    );

    let results = doc.body.get("Results").unwrap();
    assert!(results.starts_with("We observed three clusters."));
    assert!(results.contains("SECTION: Exp A:\n\n    Cluster one expressed MYC."));
    assert!(results.contains("SECTION: Exp B:\n\n    Cluster two was quiescent."));

    let nested = doc.body_nested.get("Results").unwrap();
    assert_eq!(nested.text, "We observed three clusters.");
    assert_eq!(
        nested.children.get("Exp A").unwrap().text,
        "Cluster one expressed MYC."
    );

    // Every paragraph record points at a section present in the flat body
    // with an in-range index.
    for paragraph in &doc.paragraphs {
        let section_text = doc.body.get(&paragraph.section).unwrap();
        assert!(!section_text.is_empty());
        let in_leaf = doc
            .paragraphs
            .iter()
            .filter(|p| p.section == paragraph.section && p.subsection == paragraph.subsection)
            .count();
        assert!(paragraph.paragraph_index < in_leaf);
    }
}

#[test]
fn floats_and_references_are_extracted() {
    let doc = parse();

    assert_eq!(doc.figures.len(), 1);
    assert_eq!(doc.figures[0].label, "Figure 1");
    assert_eq!(doc.figures[0].graphic_href, "fgene-11-00482-g001.jpg");

    assert_eq!(doc.tables.len(), 1);
    let table = &doc.tables[0];
    assert_eq!(table.label, "Table 1");
    let width = table.rows.iter().map(Vec::len).max().unwrap();
    assert!(table.rows.iter().all(|row| row.len() == width));
    assert_eq!(table.rows[0], ["Cluster", "Cells", "Cells"]);

    assert_eq!(doc.equations.len(), 1);
    assert!(doc.equations[0].mathml.contains("<mml:mn>0.45</mml:mn>"));

    assert_eq!(doc.citations.len(), 2);
    assert_eq!(doc.citations[0].pages, "2457-2467");
    assert_eq!(doc.citations[0].pmid, "22589270");
    assert_eq!(doc.citations[1].raw, "Waters A. KRAS: the critical driver. 2018.");
    assert!(doc.citations[1].title.is_empty());

    assert_eq!(doc.acknowledgements, vec!["We thank the sequencing core.".to_string()]);
}

#[test]
fn license_and_copyright_are_recovered() {
    let doc = parse();
    assert_eq!(doc.copyright_statement, "Copyright © 2020 Nguyen and Okafor.");
    assert_eq!(doc.license_type, "cc-by");
    assert!(doc
        .permissions
        .get("license_text")
        .unwrap()
        .contains("Creative Commons Attribution License"));
}

#[test]
fn full_text_composes_abstract_then_body() {
    let doc = parse();
    let expected_prefix = format!("{}\n\n", doc.abstract_text);
    assert!(doc.full_text.starts_with(&expected_prefix));
    assert!(doc.full_text.contains("Oncogenic KRAS signalling"));
}

#[test]
fn repeated_parses_serialize_identically() {
    let a = document_to_pretty_json(&parse());
    let b = document_to_pretty_json(&parse());
    assert_eq!(a, b);
}

#[test]
fn serialized_artifact_has_required_scenario_fields() {
    let value = document_to_value(&parse());
    assert_eq!(value["pmc_id"], "7181753");
    assert_ne!(value["title"], "");
    let body = value["body"].as_object().unwrap();
    assert!(body.keys().any(|k| k == "Introduction" || k == "Results"));
    assert_ne!(value["authors"][0]["last_name"], "");
    assert_eq!(value["article_id"]["pmcid"], "PMC7181753");
}
