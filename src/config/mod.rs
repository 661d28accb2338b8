pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::domain::layout::GridLayout;
use crate::domain::model::DaySelection;
use crate::domain::ports::TemplatePaths;
use crate::utils::error::Result;
use crate::utils::validation::{validate_docx_path, validate_path, Validate};
use std::path::Path;
use toml_config::TomlConfig;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_OUTPUT_DIR: &str = "build";
pub const DEFAULT_TEMPLATES_DIR: &str = "templates";

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "daily-menus")]
#[command(about = "Turns the weekly menu grid into daily resident menus and allergen sheets")]
pub struct CliConfig {
    #[arg(long, help = "Weekly menu grid (.docx)")]
    pub weekly: String,

    #[arg(long, help = "Single day to generate (YYYY-MM-DD)")]
    pub date: Option<String>,

    #[arg(long, help = "Generate every day of the week")]
    pub all_days: bool,

    #[arg(long, help = "Output directory [default: build]")]
    pub out: Option<String>,

    #[arg(long, help = "Folder holding standard.docx, vegan.docx and allergens.docx [default: templates]")]
    pub templates: Option<String>,

    #[arg(long)]
    pub standard_tpl: Option<String>,

    #[arg(long)]
    pub vegan_tpl: Option<String>,

    #[arg(long)]
    pub allergens_tpl: Option<String>,

    #[arg(long, help = "TOML settings file")]
    pub config: Option<String>,

    #[arg(long, help = "Also write a zip holding every day's archive")]
    pub bundle: bool,

    #[arg(long, help = "Print the resolved menus as JSON, write nothing")]
    pub dry_run: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory after each phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Merges the flags with the `--config` file (flags win) and validates the result.
    pub fn resolve(&self) -> Result<MenuConfig> {
        let toml = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };
        toml.validate()?;

        let selection =
            crate::utils::validation::validate_day_selection(self.date.as_deref(), self.all_days)?;
        let mut config = MenuConfig::new(self.weekly.clone(), selection);
        config.apply_toml(&toml);

        if let Some(out) = &self.out {
            config.output_path = out.clone();
        }
        let dir = self
            .templates
            .clone()
            .or_else(|| toml.templates.as_ref().and_then(|t| t.dir.clone()))
            .unwrap_or_else(|| DEFAULT_TEMPLATES_DIR.to_string());
        let from_toml = toml.templates.clone().unwrap_or_default();
        config.templates = TemplatePaths {
            standard: self
                .standard_tpl
                .clone()
                .or(from_toml.standard)
                .unwrap_or_else(|| template_in(&dir, "standard.docx")),
            vegan: self
                .vegan_tpl
                .clone()
                .or(from_toml.vegan)
                .unwrap_or_else(|| template_in(&dir, "vegan.docx")),
            allergens: self
                .allergens_tpl
                .clone()
                .or(from_toml.allergens)
                .unwrap_or_else(|| template_in(&dir, "allergens.docx")),
        };
        config.bundle |= self.bundle;
        config.monitor |= self.monitor;
        config.dry_run = self.dry_run;

        config.validate()?;
        Ok(config)
    }
}

fn template_in(dir: &str, file: &str) -> String {
    Path::new(dir).join(file).to_string_lossy().into_owned()
}

/// Settings for one run, after flags and the TOML file are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuConfig {
    pub weekly_path: String,
    pub output_path: String,
    pub templates: TemplatePaths,
    pub selection: DaySelection,
    pub bundle: bool,
    pub proper_nouns: Vec<String>,
    pub grid: GridLayout,
    pub banner_marker: Option<String>,
    pub monitor: bool,
    pub dry_run: bool,
}

impl MenuConfig {
    pub fn new(weekly_path: impl Into<String>, selection: DaySelection) -> Self {
        Self {
            weekly_path: weekly_path.into(),
            output_path: DEFAULT_OUTPUT_DIR.to_string(),
            templates: TemplatePaths {
                standard: template_in(DEFAULT_TEMPLATES_DIR, "standard.docx"),
                vegan: template_in(DEFAULT_TEMPLATES_DIR, "vegan.docx"),
                allergens: template_in(DEFAULT_TEMPLATES_DIR, "allergens.docx"),
            },
            selection,
            bundle: false,
            proper_nouns: Vec::new(),
            grid: GridLayout::default(),
            banner_marker: None,
            monitor: false,
            dry_run: false,
        }
    }

    /// Takes every value the file sets. Template paths are merged by the caller.
    pub fn apply_toml(&mut self, toml: &TomlConfig) {
        if let Some(path) = toml.output_path() {
            self.output_path = path.to_string();
        }
        self.bundle = toml.bundle();
        self.proper_nouns = toml.proper_nouns().to_vec();
        if let Some(grid) = &toml.grid {
            self.grid = grid.clone();
        }
        self.banner_marker = toml.banner_marker().map(str::to_string);
        self.monitor = toml.monitoring_enabled();
    }
}

impl Validate for MenuConfig {
    fn validate(&self) -> Result<()> {
        validate_docx_path("weekly", &self.weekly_path)?;
        validate_path("out", &self.output_path)?;
        validate_docx_path("standard-tpl", &self.templates.standard)?;
        validate_docx_path("vegan-tpl", &self.templates.vegan)?;
        validate_docx_path("allergens-tpl", &self.templates.allergens)?;
        self.grid.validate()
    }
}

impl ConfigProvider for MenuConfig {
    fn weekly_path(&self) -> &str {
        &self.weekly_path
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn templates(&self) -> TemplatePaths {
        self.templates.clone()
    }

    fn selection(&self) -> DaySelection {
        self.selection
    }

    fn bundle(&self) -> bool {
        self.bundle
    }

    fn proper_nouns(&self) -> &[String] {
        &self.proper_nouns
    }

    fn grid_layout(&self) -> &GridLayout {
        &self.grid
    }

    fn banner_marker(&self) -> Option<&str> {
        self.banner_marker.as_deref()
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use crate::utils::error::MenuError;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(args: &[&str]) -> CliConfig {
        let mut argv = vec!["daily-menus"];
        argv.extend_from_slice(args);
        CliConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["--weekly", "week.docx", "--all-days"]).resolve().unwrap();
        assert_eq!(config.output_path, "build");
        assert_eq!(config.templates.standard, template_in("templates", "standard.docx"));
        assert_eq!(config.templates.allergens, template_in("templates", "allergens.docx"));
        assert_eq!(config.selection, DaySelection::All);
        assert!(!config.bundle);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_explicit_template_paths_win() {
        let config = parse(&[
            "--weekly",
            "week.docx",
            "--date",
            "2025-09-16",
            "--templates",
            "tpl",
            "--vegan-tpl",
            "other/vegan-v2.docx",
        ])
        .resolve()
        .unwrap();
        assert_eq!(config.templates.standard, template_in("tpl", "standard.docx"));
        assert_eq!(config.templates.vegan, "other/vegan-v2.docx");
        assert_eq!(
            config.selection,
            DaySelection::One(NaiveDate::from_ymd_opt(2025, 9, 16).unwrap())
        );
    }

    #[test]
    fn test_date_and_all_days_are_exclusive() {
        let err = parse(&["--weekly", "week.docx", "--all-days", "--date", "2025-09-16"])
            .resolve()
            .unwrap_err();
        assert!(matches!(err, MenuError::ConfigValidationError { .. }));

        let err = parse(&["--weekly", "week.docx"]).resolve().unwrap_err();
        assert!(matches!(err, MenuError::MissingConfigError { .. }));
    }

    #[test]
    fn test_weekly_must_be_docx() {
        let err = parse(&["--weekly", "week.pdf", "--all-days"]).resolve().unwrap_err();
        assert!(matches!(err, MenuError::InvalidConfigValueError { .. }));
    }

    #[test]
    fn test_flags_override_toml() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"
[output]
path = "from-toml"
bundle = true

[templates]
dir = "toml-templates"
allergens = "sheets/allergens.docx"

[rules]
proper_nouns = ["Yorkshire"]

[allergens]
banner_marker = "DATE_HERE"
"#,
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = parse(&["--weekly", "week.docx", "--all-days", "--config", &path, "--out", "cli-out"])
            .resolve()
            .unwrap();
        assert_eq!(config.output_path, "cli-out");
        assert!(config.bundle);
        assert_eq!(config.templates.vegan, template_in("toml-templates", "vegan.docx"));
        assert_eq!(config.templates.allergens, "sheets/allergens.docx");
        assert_eq!(config.proper_nouns, vec!["Yorkshire".to_string()]);
        assert_eq!(config.banner_marker(), Some("DATE_HERE"));
    }
}
