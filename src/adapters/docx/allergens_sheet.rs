//! Writes an [`AllergensSheet`] into the allergen table of a template.

use super::xml::{Element, Node};
use super::{add_bold, for_each_paragraph, paragraph_text, rewrite_paragraph, set_centered, text_run, Segment};
use crate::domain::model::{Allergen, AllergensRow, AllergensSheet, RowKind};
use crate::utils::error::{MenuError, Result, TemplateMismatchError};
use std::convert::Infallible;

pub const TICK: &str = "\u{2714}";

/// A header row needs at least this many recognisable allergen columns.
const MIN_ALLERGEN_COLUMNS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
struct TableLayout {
    header_row: usize,
    label_column: usize,
    columns: Vec<(usize, Allergen)>,
}

fn cell_text(tc: &Element) -> String {
    tc.children_named("w:p")
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join(" ")
}

fn header_layout(table: &Element) -> Option<TableLayout> {
    for (row_index, tr) in table.children_named("w:tr").enumerate() {
        let mut columns: Vec<(usize, Allergen)> = Vec::new();
        for (col, tc) in tr.children_named("w:tc").enumerate() {
            if let Some(allergen) = Allergen::from_column_heading(&cell_text(tc)) {
                if !columns.iter().any(|(_, a)| *a == allergen) {
                    columns.push((col, allergen));
                }
            }
        }
        if columns.len() < MIN_ALLERGEN_COLUMNS {
            continue;
        }
        let width = tr.children_named("w:tc").count();
        let label_column = (0..width).find(|c| columns.iter().all(|(col, _)| col != c))?;
        return Some(TableLayout {
            header_row: row_index,
            label_column,
            columns,
        });
    }
    None
}

/// Replaces the cell content with a single paragraph, keeping the cell's
/// first paragraph and run formatting.
fn set_cell_text(tc: &mut Element, text: &str, bold: bool, centered: bool) {
    let first_p = tc.child("w:p");
    let mut p_pr = first_p.and_then(|p| p.child("w:pPr")).cloned();
    let mut r_pr = first_p
        .and_then(|p| p.children_named("w:r").find_map(|r| r.child("w:rPr")))
        .cloned();

    tc.children
        .retain(|c| !matches!(c, Node::Element(e) if e.name == "w:p"));

    let mut p = Element::new("w:p");
    if centered {
        let props = p_pr.get_or_insert_with(|| Element::new("w:pPr"));
        set_centered(props);
    }
    if let Some(props) = p_pr {
        p.children.push(Node::Element(props));
    }
    if !text.is_empty() {
        if bold {
            add_bold(r_pr.get_or_insert_with(|| Element::new("w:rPr")));
        }
        p.children
            .push(Node::Element(text_run(r_pr.as_ref(), text, false)));
    }
    tc.children.push(Node::Element(p));
}

fn fill_row(tr: &mut Element, layout: &TableLayout, row: Option<&AllergensRow>) {
    let mut cells: Vec<&mut Element> = tr.elements_mut().filter(|e| e.name == "w:tc").collect();
    for (col, tc) in cells.iter_mut().enumerate() {
        let allergen = layout
            .columns
            .iter()
            .find(|(c, _)| *c == col)
            .map(|(_, a)| *a);
        match (row, allergen) {
            (Some(row), None) if col == layout.label_column => {
                let banner = row.kind == RowKind::Banner;
                set_cell_text(tc, &row.label, banner, banner);
            }
            (Some(row), Some(allergen)) if row.kind == RowKind::Dish => {
                let tick = if row.ticks.contains(&allergen) { TICK } else { "" };
                set_cell_text(tc, tick, false, false);
            }
            _ => set_cell_text(tc, "", false, false),
        }
    }
}

/// Fills the first table whose header names enough allergens. Rows after the
/// header take the sheet rows in order; leftover rows are cleared.
pub fn fill_table(root: &mut Element, sheet: &AllergensSheet, template_name: &str) -> Result<()> {
    let mismatch = |reason: String| {
        MenuError::TemplateMismatch(TemplateMismatchError {
            template: template_name.to_string(),
            reason,
            missing: Vec::new(),
        })
    };

    let mut outcome: Option<Result<()>> = None;
    let _ = root.visit_mut("w:tbl", &mut |table: &mut Element| {
        if outcome.is_some() {
            return Ok::<(), Infallible>(());
        }
        let Some(layout) = header_layout(table) else {
            return Ok(());
        };

        let mut rows: Vec<&mut Element> = table
            .elements_mut()
            .filter(|e| e.name == "w:tr")
            .skip(layout.header_row + 1)
            .collect();
        if sheet.rows.len() > rows.len() {
            outcome = Some(Err(mismatch(format!(
                "has room for {} allergen rows but {} are needed",
                rows.len(),
                sheet.rows.len()
            ))));
            return Ok(());
        }

        for (i, tr) in rows.iter_mut().enumerate() {
            fill_row(tr, &layout, sheet.rows.get(i));
        }
        tracing::debug!(
            "Allergens table: {} of {} rows used, {} allergen columns",
            sheet.rows.len(),
            rows.len(),
            layout.columns.len()
        );
        outcome = Some(Ok(()));
        Ok(())
    });

    outcome.unwrap_or_else(|| {
        Err(mismatch(format!(
            "has no table with at least {} allergen column headings",
            MIN_ALLERGEN_COLUMNS
        )))
    })
}

/// Replaces a literal marker in paragraph text. Returns the number of paragraphs changed.
pub fn replace_literal(root: &mut Element, marker: &str, replacement: &str) -> usize {
    let mut hits = 0;
    let _ = for_each_paragraph(root, &mut |p: &mut Element| {
        let text = paragraph_text(p);
        if text.contains(marker) {
            rewrite_paragraph(p, &[Segment::plain(text.replace(marker, replacement))]);
            hits += 1;
        }
        Ok::<(), Infallible>(())
    });
    hits
}
