use super::xml::{self, Element};
use super::DOCUMENT_PART;
use crate::core::grid::{RawCell, RawGrid};
use crate::utils::error::Result;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Reads one XML part out of a .docx package.
pub fn read_part(docx: &[u8], part: &str) -> Result<Element> {
    let mut archive = ZipArchive::new(Cursor::new(docx))?;
    let mut data = Vec::new();
    archive.by_name(part)?.read_to_end(&mut data)?;
    xml::parse(&data)
}

/// Cell text: paragraphs joined by newlines.
fn cell_text(tc: &Element) -> String {
    tc.children_named("w:p")
        .map(|p| p.text())
        .collect::<Vec<_>>()
        .join("\n")
}

fn grid_span(tc: &Element) -> usize {
    tc.child("w:tcPr")
        .and_then(|pr| pr.child("w:gridSpan"))
        .and_then(|span| span.attr("w:val"))
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1)
}

/// `<w:vMerge/>` or `w:val="continue"` marks a continuation; `restart` starts a merge.
fn is_vmerge_continuation(tc: &Element) -> bool {
    tc.child("w:tcPr")
        .and_then(|pr| pr.child("w:vMerge"))
        .is_some_and(|m| m.attr("w:val").map_or(true, |v| v == "continue"))
}

/// The first table of the document body as a [`RawGrid`], merges expanded to grid columns.
pub fn read_grid(docx: &[u8]) -> Result<RawGrid> {
    let document = read_part(docx, DOCUMENT_PART)?;
    let Some(table) = document.child("w:body").and_then(|b| b.find("w:tbl")) else {
        tracing::debug!("No table in the weekly document");
        return Ok(RawGrid::default());
    };

    let mut rows: Vec<Vec<RawCell>> = Vec::new();
    for tr in table.children_named("w:tr") {
        let mut row: Vec<RawCell> = Vec::new();
        for tc in tr.children_named("w:tc") {
            let vmerge_copy = is_vmerge_continuation(tc);
            // a continuation repeats whatever the merge above it holds
            let text = match rows.last().and_then(|above| above.get(row.len())) {
                Some(above) if vmerge_copy => above.text.clone(),
                _ => cell_text(tc),
            };
            for copy in 0..grid_span(tc) {
                row.push(RawCell {
                    text: text.clone(),
                    span_copy: copy > 0,
                    vmerge_copy,
                });
            }
        }
        rows.push(row);
    }

    tracing::debug!(
        "Read weekly table: {} rows, widest {} columns",
        rows.len(),
        rows.iter().map(Vec::len).max().unwrap_or(0)
    );
    Ok(RawGrid { rows })
}
