use super::allergens_sheet;
use super::xml::Element;
use super::{
    for_each_paragraph, is_text_part, paragraph_text, rewrite_package, rewrite_paragraph, Segment,
    DOCUMENT_PART,
};
use crate::core::rules::REQUIRED_PLACEHOLDERS;
use crate::domain::model::{AllergensSheet, FieldMap, ResolvedField};
use crate::domain::ports::DocumentRenderer;
use crate::utils::error::{MenuError, Result, TemplateMismatchError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::convert::Infallible;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.\[\]]+)\s*\}\}").unwrap());
static INDEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\d+)\]").unwrap());

pub const DATE_BANNER: &str = "date_banner";

/// `lunch.mains[0].title` -> `lunch.mains.0.title`
pub fn normalise_placeholder(name: &str) -> String {
    INDEX.replace_all(name.trim(), ".$1").into_owned()
}

/// Placeholder names found in a template, and those with no value.
#[derive(Debug, Default)]
struct FillReport {
    found: BTreeSet<String>,
    unknown: BTreeSet<String>,
}

/// Substitutes every `{{ name }}` in the paragraphs below `root`.
fn fill_placeholders(root: &mut Element, fields: &FieldMap, report: &mut FillReport) {
    let _ = for_each_paragraph(root, &mut |p: &mut Element| {
        let text = paragraph_text(p);
        if !text.contains("{{") {
            return Ok::<(), Infallible>(());
        }

        let mut segments = Vec::new();
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(&text) {
            let (Some(whole), Some(raw)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            segments.push(Segment::plain(&text[last..whole.start()]));
            last = whole.end();

            let name = normalise_placeholder(raw.as_str());
            match fields.get(&name) {
                Some(ResolvedField {
                    text, highlighted, ..
                }) => segments.push(Segment {
                    text: text.clone(),
                    highlighted: *highlighted,
                }),
                None => {
                    report.unknown.insert(name.clone());
                }
            }
            report.found.insert(name);
        }
        if last == 0 {
            // braces without a well-formed placeholder
            return Ok(());
        }
        segments.push(Segment::plain(&text[last..]));
        rewrite_paragraph(p, &segments);
        Ok(())
    });
}

/// Fills menu and allergens templates (.docx) in memory.
#[derive(Debug, Clone, Default)]
pub struct DocxRenderer {
    banner_marker: Option<String>,
}

impl DocxRenderer {
    /// `banner_marker`: literal text older allergens templates use instead of `{{ date_banner }}`.
    pub fn new(banner_marker: Option<String>) -> Self {
        Self {
            banner_marker: banner_marker.filter(|m| !m.trim().is_empty()),
        }
    }
}

impl DocumentRenderer for DocxRenderer {
    fn render_menu(&self, template_name: &str, template: &[u8], fields: &FieldMap) -> Result<Vec<u8>> {
        let mut report = FillReport::default();
        let bytes = rewrite_package(template, is_text_part, |_, root| {
            fill_placeholders(root, fields, &mut report);
            Ok(())
        })?;

        for name in &report.unknown {
            tracing::warn!("⚠️ {}: no value for placeholder '{}', left empty", template_name, name);
        }

        let missing: Vec<String> = REQUIRED_PLACEHOLDERS
            .iter()
            .filter(|name| !report.found.contains(**name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(MenuError::TemplateMismatch(TemplateMismatchError {
                template: template_name.to_string(),
                reason: "is missing required placeholders".to_string(),
                missing,
            }));
        }

        tracing::debug!(
            "Rendered {} ({} placeholders)",
            template_name,
            report.found.len()
        );
        Ok(bytes)
    }

    fn render_allergens(
        &self,
        template_name: &str,
        template: &[u8],
        sheet: &AllergensSheet,
    ) -> Result<Vec<u8>> {
        let mut banner_fields = FieldMap::new();
        banner_fields.insert(
            DATE_BANNER.to_string(),
            ResolvedField {
                name: DATE_BANNER.to_string(),
                text: sheet.banner.clone(),
                highlighted: false,
            },
        );

        let mut report = FillReport::default();
        let mut marker_hits = 0;
        let mut table_filled = false;
        let bytes = rewrite_package(template, is_text_part, |part, root| {
            fill_placeholders(root, &banner_fields, &mut report);
            if let Some(marker) = &self.banner_marker {
                marker_hits += allergens_sheet::replace_literal(root, marker, &sheet.banner);
            }
            if part == DOCUMENT_PART {
                allergens_sheet::fill_table(root, sheet, template_name)?;
                table_filled = true;
            }
            Ok(())
        })?;

        if !table_filled {
            return Err(MenuError::TemplateMismatch(TemplateMismatchError {
                template: template_name.to_string(),
                reason: format!("has no {}", DOCUMENT_PART),
                missing: Vec::new(),
            }));
        }
        for name in report.unknown {
            tracing::warn!("⚠️ {}: no value for placeholder '{}', left empty", template_name, name);
        }
        if !report.found.contains(DATE_BANNER) && marker_hits == 0 {
            tracing::warn!("⚠️ {}: no date banner placeholder found", template_name);
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::docx::tests::{docx_with_body, document_of};

    fn field(name: &str, text: &str, highlighted: bool) -> (String, ResolvedField) {
        (
            name.to_string(),
            ResolvedField {
                name: name.to_string(),
                text: text.to_string(),
                highlighted,
            },
        )
    }

    fn required_fields() -> FieldMap {
        REQUIRED_PLACEHOLDERS
            .iter()
            .map(|name| field(name, "x", false))
            .collect()
    }

    fn menu_body(extra: &str) -> String {
        let mut body: String = REQUIRED_PLACEHOLDERS
            .iter()
            .map(|name| format!("<w:p><w:r><w:t>{{{{ {} }}}}</w:t></w:r></w:p>", name))
            .collect();
        body.push_str(extra);
        body
    }

    #[test]
    fn test_normalise_placeholder() {
        assert_eq!(normalise_placeholder("lunch.mains[1].title"), "lunch.mains.1.title");
        assert_eq!(normalise_placeholder(" header.date "), "header.date");
    }

    #[test]
    fn test_render_menu_substitutes_and_highlights() {
        let mut fields = required_fields();
        fields.extend([
            field("lunch.desserts.0.title", "Apple crumble (Ve)", true),
            field("header.theme", "Harvest", false),
        ]);
        let template = docx_with_body(&menu_body(
            r#"<w:p><w:r><w:rPr><w:i/></w:rPr><w:t>Theme: {{ header.</w:t></w:r><w:r><w:t>theme }} !</w:t></w:r></w:p>"#,
        ));

        let out = DocxRenderer::default()
            .render_menu("vegan.docx", &template, &fields)
            .unwrap();
        let document = document_of(&out);
        let mut paragraphs = Vec::new();
        document.find_all("w:p", &mut paragraphs);
        let texts: Vec<String> = paragraphs.iter().map(|p| paragraph_text(p)).collect();
        assert!(texts.contains(&"Theme: Harvest !".to_string()));
        assert!(texts.contains(&"Apple crumble (Ve)".to_string()));

        let dessert = paragraphs
            .iter()
            .find(|p| paragraph_text(p) == "Apple crumble (Ve)")
            .unwrap();
        assert!(dessert.find("w:highlight").is_some());
        let theme = paragraphs
            .iter()
            .find(|p| paragraph_text(p) == "Theme: Harvest !")
            .unwrap();
        assert!(theme.find("w:highlight").is_none());
        assert!(theme.find("w:i").is_some());
    }

    #[test]
    fn test_index_syntax_and_unknown_placeholders() {
        let fields = required_fields();
        let template = docx_with_body(&menu_body(
            "<w:p><w:r><w:t>[{{ lunch.mains[0].title }}|{{ nothing.here }}]</w:t></w:r></w:p>",
        ));
        let out = DocxRenderer::default()
            .render_menu("standard.docx", &template, &fields)
            .unwrap();
        let document = document_of(&out);
        let mut paragraphs = Vec::new();
        document.find_all("w:p", &mut paragraphs);
        assert!(paragraphs.iter().any(|p| paragraph_text(p) == "[x|]"));
    }

    #[test]
    fn test_missing_required_placeholder() {
        let template = docx_with_body("<w:p><w:r><w:t>{{ header.date }}</w:t></w:r></w:p>");
        let err = DocxRenderer::default()
            .render_menu("standard.docx", &template, &required_fields())
            .unwrap_err();
        match err {
            MenuError::TemplateMismatch(e) => {
                assert_eq!(e.template, "standard.docx");
                assert!(e.missing.contains(&"lunch.mains.0.title".to_string()));
                assert!(!e.missing.contains(&"header.date".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_other_package_parts_are_kept() {
        let template = docx_with_body(&menu_body(""));
        let out = DocxRenderer::default()
            .render_menu("standard.docx", &template, &required_fields())
            .unwrap();
        let archive = zip::ZipArchive::new(std::io::Cursor::new(out)).unwrap();
        let names: Vec<_> = archive.file_names().collect();
        assert!(names.contains(&"[Content_Types].xml"));
        assert!(names.contains(&"_rels/.rels"));
        assert!(names.contains(&DOCUMENT_PART));
    }
}
