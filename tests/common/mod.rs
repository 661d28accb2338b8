//! In-memory .docx fixtures for the end-to-end tests.

use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::{SimpleFileOptions, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

pub const DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

pub fn docx_with_body(body: &str) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", RELS),
        ("word/document.xml", document.as_str()),
    ] {
        writer.start_file(name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn tc(text: &str) -> String {
    let paragraphs: String = text
        .split('\n')
        .map(|line| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", escape(line)))
        .collect();
    format!("<w:tc>{}</w:tc>", paragraphs)
}

/// The weekly grid for 15/09/2025 - 21/09/2025 as rows of cell text.
pub fn weekly_rows() -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut push = |label: &str, f: &dyn Fn(usize) -> String| {
        let mut row = vec![label.to_string()];
        row.extend((0..7).map(f));
        rows.push(row);
    };
    push("", &|d| DAYS[d].to_string());
    push("Date", &|d| format!("{:02}/09/2025", 15 + d));
    push("Theme", &|d| format!("Theme {}", d + 1));
    push("Soup", &|_| "Leek and potato soup\nCelery, Milk".to_string());
    push("Starter", &|_| "Prawn cocktail\nFish, Eggs".to_string());
    push("Vegan main", &|_| "Lentil dahl (Ve)\nMustard".to_string());
    push("Vegetarian main", &|_| {
        "Cauliflower cheese\nWith crusty bread\nMilk, Gluten".to_string()
    });
    push("Meat main", &|_| "Roast chicken\nWith gravy\nCelery".to_string());
    push("Optional sides", &|_| "Roast potatoes\nGreens".to_string());
    push("Dessert", &|_| "STICKY TOFFEE PUDDING\nMilk, Eggs, Gluten".to_string());
    push("Ice cream", &|_| "Milk".to_string());
    push("Supper", &|_| String::new());
    push("Soup", &|_| "Chef's choice soup\nCelery".to_string());
    push("Vegan special", &|_| "Falafel wrap (Ve)\nGluten".to_string());
    push("Sandwich selection", &|_| String::new());
    push("Supper special", &|_| "Welsh rarebit\nMilk, Gluten, Mustard".to_string());
    push("Dessert", &|_| "fruit jelly\nSulphites".to_string());
    push("Ice cream", &|_| "Milk".to_string());
    rows
}

pub fn weekly_docx(rows: &[Vec<String>]) -> Vec<u8> {
    let table: String = rows
        .iter()
        .map(|row| {
            let cells: String = row.iter().map(|c| tc(c)).collect();
            format!("<w:tr>{}</w:tr>", cells)
        })
        .collect();
    docx_with_body(&format!(
        "<w:p><w:r><w:t>Weekly menu</w:t></w:r></w:p><w:tbl>{}</w:tbl>",
        table
    ))
}

pub fn menu_template(placeholders: &[&str]) -> Vec<u8> {
    let body: String = placeholders
        .iter()
        .map(|name| format!("<w:p><w:r><w:t>{{{{ {} }}}}</w:t></w:r></w:p>", name))
        .collect();
    docx_with_body(&body)
}

pub const MENU_PLACEHOLDERS: [&str; 10] = [
    "header.date",
    "lunch.starters[0].title",
    "lunch.mains[0].title",
    "lunch.mains[1].title",
    "lunch.mains[1].description",
    "lunch.optional_sides.title",
    "lunch.desserts[0].title",
    "supper.starter.title",
    "supper.specials.title",
    "supper.desserts[0].title",
];

pub fn allergens_template(data_rows: usize) -> Vec<u8> {
    let headings = [
        "Celery",
        "Cereals containing Gluten",
        "Eggs",
        "Fish",
        "Milk",
        "Mustards",
        "Soybeans",
        "Sulphur Doixide",
    ];
    let header: String = std::iter::once(tc("Dish"))
        .chain(headings.iter().map(|h| tc(h)))
        .collect();
    let empty_row: String = (0..=headings.len()).map(|_| tc("")).collect();
    let mut body =
        String::from("<w:p><w:r><w:t>Allergens for {{ date_banner }}</w:t></w:r></w:p><w:tbl>");
    body.push_str(&format!("<w:tr>{}</w:tr>", header));
    for _ in 0..data_rows {
        body.push_str(&format!("<w:tr>{}</w:tr>", empty_row));
    }
    body.push_str("</w:tbl>");
    docx_with_body(&body)
}

/// Writes the weekly grid and the three templates under `root`.
pub fn write_inputs(root: &Path, rows: &[Vec<String>], menu_placeholders: &[&str]) {
    let templates = root.join("templates");
    std::fs::create_dir_all(&templates).unwrap();
    std::fs::write(root.join("weekly.docx"), weekly_docx(rows)).unwrap();
    std::fs::write(templates.join("standard.docx"), menu_template(menu_placeholders)).unwrap();
    std::fs::write(templates.join("vegan.docx"), menu_template(menu_placeholders)).unwrap();
    std::fs::write(templates.join("allergens.docx"), allergens_template(30)).unwrap();
}
