use crate::domain::model::{Archive, DayDocuments, DayMenu};
use crate::domain::ports::Packager;
use crate::utils::error::Result;
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

pub fn day_archive_name(day: &DayMenu) -> String {
    format!("{}-{}-menus-and-allergens.zip", day.weekday, day.file_slug())
}

pub fn week_archive_name(first_day: &DayMenu) -> String {
    format!("Week-{}-menus.zip", first_day.file_slug())
}

/// Entry names inside a day archive: standard menu, vegan menu, allergens sheet.
pub fn document_names(day: &DayMenu) -> [String; 3] {
    let slug = day.file_slug();
    [
        format!("Residents_{}.docx", slug),
        format!("Residents_{}_vegan.docx", slug),
        format!("Allergens_Residents_{}.docx", slug),
    ]
}

/// Packs named byte streams into an in-memory zip.
fn zip_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a [u8])>) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = || SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, data) in entries {
        zip.start_file(name, options())?;
        zip.write_all(data)?;
    }

    // 完成並取回底層 Vec<u8>
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ZipPackager;

impl ZipPackager {
    pub fn new() -> Self {
        Self
    }
}

impl Packager for ZipPackager {
    fn package(&self, day: &DayMenu, documents: &DayDocuments) -> Result<Archive> {
        let [standard, vegan, allergens] = document_names(day);
        let bytes = zip_entries([
            (standard.as_str(), documents.standard.as_slice()),
            (vegan.as_str(), documents.vegan.as_slice()),
            (allergens.as_str(), documents.allergens.as_slice()),
        ])?;

        let name = day_archive_name(day);
        tracing::debug!("Packed {} ({} bytes)", name, bytes.len());
        Ok(Archive { name, bytes })
    }

    fn bundle(&self, first_day: &DayMenu, archives: &[Archive]) -> Result<Archive> {
        let bytes = zip_entries(
            archives
                .iter()
                .map(|a| (a.name.as_str(), a.bytes.as_slice())),
        )?;
        Ok(Archive {
            name: week_archive_name(first_day),
            bytes,
        })
    }
}
