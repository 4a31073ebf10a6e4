//! Table extraction with span expansion.
//!
//! Header rows (thead) come first, then body rows. `colspan`/`rowspan`
//! attributes are expanded by repeating the cell value into every spanned
//! position, and the final matrix is right-padded rectangular so downstream
//! matrix code never sees ragged rows.

use crate::document::Table;
use crate::xml::clean::tidy_paragraph;
use crate::xml::Element;

pub fn extract_tables(article: &Element) -> Vec<Table> {
    article
        .find_all("table-wrap")
        .into_iter()
        .map(parse_table_wrap)
        .collect()
}

fn parse_table_wrap(wrap: &Element) -> Table {
    let label = wrap.child_text("label").unwrap_or_default();
    let caption = wrap
        .child("caption")
        .map(|c| tidy_paragraph(&c.collapsed_text()))
        .unwrap_or_default();

    let rows = match wrap.find("table") {
        Some(table) => expand_rows(&gather_rows(table)),
        None => Vec::new(),
    };

    Table {
        label,
        caption,
        rows,
    }
}

/// thead rows first, then tbody rows, then any stray direct `tr` children.
fn gather_rows<'a>(table: &'a Element) -> Vec<&'a Element> {
    let mut rows = Vec::new();
    for thead in table.children_named("thead") {
        rows.extend(thead.find_all("tr"));
    }
    for tbody in table.children_named("tbody") {
        rows.extend(tbody.find_all("tr"));
    }
    rows.extend(table.children_named("tr"));
    rows
}

fn expand_rows(trs: &[&Element]) -> Vec<Vec<String>> {
    let mut grid: Vec<Vec<Option<String>>> = vec![Vec::new(); trs.len()];

    for (r, tr) in trs.iter().enumerate() {
        let mut c = 0usize;
        for cell in tr
            .child_elements()
            .filter(|e| matches!(e.local_name(), "td" | "th"))
        {
            while filled(&grid, r, c) {
                c += 1;
            }
            let text = tidy_paragraph(&cell.collapsed_text());
            let colspan = span_attr(cell, "colspan");
            let rowspan = span_attr(cell, "rowspan");
            for dr in 0..rowspan {
                for dc in 0..colspan {
                    set(&mut grid, r + dr, c + dc, text.clone());
                }
            }
            c += colspan;
        }
    }

    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    grid.into_iter()
        .filter(|row| !row.is_empty())
        .map(|row| {
            let mut cells: Vec<String> =
                row.into_iter().map(|c| c.unwrap_or_default()).collect();
            cells.resize(width, String::new());
            cells
        })
        .collect()
}

fn span_attr(cell: &Element, name: &str) -> usize {
    cell.attr(name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&v| v >= 1)
        .unwrap_or(1)
}

fn filled(grid: &[Vec<Option<String>>], r: usize, c: usize) -> bool {
    grid.get(r)
        .and_then(|row| row.get(c))
        .map(Option::is_some)
        .unwrap_or(false)
}

fn set(grid: &mut Vec<Vec<Option<String>>>, r: usize, c: usize, value: String) {
    while grid.len() <= r {
        grid.push(Vec::new());
    }
    let row = &mut grid[r];
    while row.len() <= c {
        row.push(None);
    }
    row[c] = Some(value);
}
