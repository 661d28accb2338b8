pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::cli::LocalStorage;
pub use config::MenuConfig;
#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{DocxRenderer, ZipPackager};
pub use crate::core::generate::generate;
pub use crate::core::{etl::MenuEngine, pipeline::MenuPipeline};
pub use utils::error::{MenuError, Result};
