//! WordprocessingML (.docx) adapters: grid reading and template filling.

pub mod allergens_sheet;
pub mod reader;
pub mod template;
pub mod xml;

pub use reader::read_grid;
pub use template::DocxRenderer;

use crate::utils::error::Result;
use std::io::{Cursor, Read, Write};
use xml::{Element, Node};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const DOCUMENT_PART: &str = "word/document.xml";

/// Parts that may carry placeholder text.
pub(crate) fn is_text_part(name: &str) -> bool {
    name == DOCUMENT_PART
        || ((name.starts_with("word/header") || name.starts_with("word/footer"))
            && name.ends_with(".xml"))
}

pub(crate) fn deflated() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Copies a .docx package entry by entry; parts selected by `is_target` go
/// through `edit` as XML trees, everything else is copied untouched.
pub(crate) fn rewrite_package(
    docx: &[u8],
    is_target: impl Fn(&str) -> bool,
    mut edit: impl FnMut(&str, &mut Element) -> Result<()>,
) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(docx))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for i in 0..archive.len() {
        let name = archive.by_index_raw(i)?.name().to_string();
        if !is_target(&name) {
            writer.raw_copy_file(archive.by_index_raw(i)?)?;
            continue;
        }

        let mut data = Vec::new();
        archive.by_index(i)?.read_to_end(&mut data)?;
        let mut root = xml::parse(&data)?;
        edit(&name, &mut root)?;
        writer.start_file(name.as_str(), deflated())?;
        writer.write_all(&xml::serialize(&root)?)?;
    }

    Ok(writer.finish()?.into_inner())
}

const TEXT_RUN_CHILDREN: [&str; 7] = [
    "w:rPr",
    "w:t",
    "w:tab",
    "w:br",
    "w:cr",
    "w:lastRenderedPageBreak",
    "w:noBreakHyphen",
];

/// Runs holding only text; runs with drawings, fields or objects are left alone.
pub(crate) fn is_text_run(run: &Element) -> bool {
    run.name == "w:r" && run.elements().all(|e| TEXT_RUN_CHILDREN.contains(&e.name.as_str()))
}

/// Visible text of a paragraph's own text runs.
pub(crate) fn paragraph_text(p: &Element) -> String {
    p.elements().filter(|e| is_text_run(e)).map(Element::text).collect()
}

/// Calls `f` on every paragraph below `root`, inner paragraphs (text boxes) first.
pub(crate) fn for_each_paragraph<E>(
    root: &mut Element,
    f: &mut impl FnMut(&mut Element) -> std::result::Result<(), E>,
) -> std::result::Result<(), E> {
    for child in root.elements_mut() {
        for_each_paragraph(child, f)?;
        if child.name == "w:p" {
            f(child)?;
        }
    }
    Ok(())
}

/// A piece of paragraph text and whether it is highlighted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment {
    pub text: String,
    pub highlighted: bool,
}

impl Segment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            highlighted: false,
        }
    }
}

const RPR_AFTER_HIGHLIGHT: [&str; 13] = [
    "w:u",
    "w:effect",
    "w:bdr",
    "w:shd",
    "w:fitText",
    "w:vertAlign",
    "w:rtl",
    "w:cs",
    "w:em",
    "w:lang",
    "w:eastAsianLayout",
    "w:specVanish",
    "w:oMath",
];

const PPR_AFTER_JC: [&str; 9] = [
    "w:textDirection",
    "w:textAlignment",
    "w:textboxTightWrap",
    "w:outlineLvl",
    "w:divId",
    "w:cnfStyle",
    "w:rPr",
    "w:sectPr",
    "w:pPrChange",
];

/// Sets a property element, replacing one of the same name or inserting it
/// before the first sibling that the schema orders after it.
fn set_property(props: &mut Element, prop: Element, later: &[&str]) {
    if let Some(existing) = props.child_mut(&prop.name) {
        *existing = prop;
        return;
    }
    let at = props
        .children
        .iter()
        .position(|c| matches!(c, Node::Element(e) if later.contains(&e.name.as_str())))
        .unwrap_or(props.children.len());
    props.children.insert(at, Node::Element(prop));
}

pub(crate) fn add_highlight(r_pr: &mut Element) {
    set_property(
        r_pr,
        Element::new("w:highlight").with_attr("w:val", "yellow"),
        &RPR_AFTER_HIGHLIGHT,
    );
}

pub(crate) fn add_bold(r_pr: &mut Element) {
    if r_pr.child("w:b").is_some() {
        return;
    }
    // w:b follows only the style and font references
    let at = r_pr
        .children
        .iter()
        .rposition(|c| matches!(c, Node::Element(e) if e.name == "w:rStyle" || e.name == "w:rFonts"))
        .map_or(0, |i| i + 1);
    r_pr.children.insert(at, Node::Element(Element::new("w:b")));
}

pub(crate) fn set_centered(p_pr: &mut Element) {
    set_property(
        p_pr,
        Element::new("w:jc").with_attr("w:val", "center"),
        &PPR_AFTER_JC,
    );
}

/// Builds one run; newlines in `text` become `w:br`.
pub(crate) fn text_run(r_pr: Option<&Element>, text: &str, highlighted: bool) -> Element {
    let mut run = Element::new("w:r");
    let mut props = r_pr.cloned().unwrap_or_else(|| Element::new("w:rPr"));
    if highlighted {
        add_highlight(&mut props);
    }
    if !props.children.is_empty() {
        run.children.push(Node::Element(props));
    }
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            run.children.push(Node::Element(Element::new("w:br")));
        }
        run.children.push(Node::Element(
            Element::new("w:t")
                .with_attr("xml:space", "preserve")
                .with_text(line),
        ));
    }
    run
}

/// Replaces a paragraph's text runs with `segments`, all formatted like the
/// first text run. Non-text runs and paragraph properties stay in place.
pub(crate) fn rewrite_paragraph(p: &mut Element, segments: &[Segment]) {
    let first = p
        .children
        .iter()
        .position(|c| matches!(c, Node::Element(e) if is_text_run(e)));
    let Some(first) = first else {
        return;
    };
    let r_pr = match &p.children[first] {
        Node::Element(run) => run.child("w:rPr").cloned(),
        Node::Text(_) => None,
    };

    let runs: Vec<Node> = segments
        .iter()
        .filter(|s| !s.text.is_empty())
        .map(|s| Node::Element(text_run(r_pr.as_ref(), &s.text, s.highlighted)))
        .collect();

    let mut kept = Vec::with_capacity(p.children.len());
    for (i, child) in std::mem::take(&mut p.children).into_iter().enumerate() {
        if i == first {
            kept.extend(runs.iter().cloned());
        }
        if !matches!(&child, Node::Element(e) if is_text_run(e)) {
            kept.push(child);
        }
    }
    p.children = kept;
}
