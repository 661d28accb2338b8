// Adapters layer: concrete implementations for external formats (docx documents, zip archives).
// Local file storage stays under src/config next to the CLI configuration.

pub mod docx;
pub mod packager;

pub use docx::DocxRenderer;
pub use packager::ZipPackager;
