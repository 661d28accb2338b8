use crate::domain::layout::GridLayout;
use crate::utils::error::{MenuError, Result};
use crate::utils::validation::{validate_docx_path, validate_non_empty_string, validate_path, Validate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

static ENV_VAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

/// File-based settings. Every section is optional; command-line flags win.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub output: Option<OutputConfig>,
    #[serde(default)]
    pub templates: Option<TemplatesConfig>,
    #[serde(default)]
    pub rules: Option<RulesConfig>,
    #[serde(default)]
    pub allergens: Option<AllergensConfig>,
    #[serde(default)]
    pub grid: Option<GridLayout>,
    #[serde(default)]
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: Option<String>,
    pub bundle: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplatesConfig {
    pub dir: Option<String>,
    pub standard: Option<String>,
    pub vegan: Option<String>,
    pub allergens: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Words kept capitalised when titles are sentence-cased.
    #[serde(default)]
    pub proper_nouns: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllergensConfig {
    /// Literal text older allergens templates carry where the date goes.
    pub banner_marker: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MenuError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content);
        let config: TomlConfig = toml::from_str(&processed_content)?;
        Ok(config)
    }

    /// 替換環境變數 (例如 ${MENU_OUT})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn output_path(&self) -> Option<&str> {
        self.output.as_ref().and_then(|o| o.path.as_deref())
    }

    pub fn bundle(&self) -> bool {
        self.output.as_ref().and_then(|o| o.bundle).unwrap_or(false)
    }

    pub fn proper_nouns(&self) -> &[String] {
        self.rules.as_ref().map(|r| r.proper_nouns.as_slice()).unwrap_or(&[])
    }

    pub fn banner_marker(&self) -> Option<&str> {
        self.allergens.as_ref().and_then(|a| a.banner_marker.as_deref())
    }

    /// 取得監控設定
    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(path) = self.output_path() {
            validate_path("output.path", path)?;
        }

        if let Some(templates) = &self.templates {
            if let Some(dir) = &templates.dir {
                validate_path("templates.dir", dir)?;
            }
            for (field, value) in [
                ("templates.standard", &templates.standard),
                ("templates.vegan", &templates.vegan),
                ("templates.allergens", &templates.allergens),
            ] {
                if let Some(path) = value {
                    validate_docx_path(field, path)?;
                }
            }
        }

        for noun in self.proper_nouns() {
            validate_non_empty_string("rules.proper_nouns", noun)?;
        }

        if let Some(grid) = &self.grid {
            grid.validate()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[output]
path = "out/menus"
bundle = true

[templates]
dir = "tpl"
vegan = "tpl/vegan-2025.docx"

[rules]
proper_nouns = ["Yorkshire", "Bakewell"]

[allergens]
banner_marker = "DATE_HERE"

[monitoring]
enabled = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.output_path(), Some("out/menus"));
        assert!(config.bundle());
        assert_eq!(config.proper_nouns(), ["Yorkshire", "Bakewell"]);
        assert_eq!(config.banner_marker(), Some("DATE_HERE"));
        assert!(config.monitoring_enabled());
        let templates = config.templates.as_ref().unwrap();
        assert_eq!(templates.vegan.as_deref(), Some("tpl/vegan-2025.docx"));
        assert!(templates.standard.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.output_path(), None);
        assert!(!config.bundle());
        assert!(config.proper_nouns().is_empty());
        assert!(!config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("DAILY_MENUS_TEST_OUT", "/srv/menus");

        let toml_content = r#"
[output]
path = "${DAILY_MENUS_TEST_OUT}"

[allergens]
banner_marker = "${DAILY_MENUS_TEST_UNSET}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.output_path(), Some("/srv/menus"));
        assert_eq!(config.banner_marker(), Some("${DAILY_MENUS_TEST_UNSET}"));

        std::env::remove_var("DAILY_MENUS_TEST_OUT");
    }

    #[test]
    fn test_config_validation() {
        let config = TomlConfig::from_toml_str(
            r#"
[templates]
standard = "standard.odt"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str(
            r#"
[grid]
rows = [{ role = "weekdays", row = 0 }]
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_a_config_error() {
        let err = TomlConfig::from_toml_str("[output\npath = 1").unwrap_err();
        assert!(matches!(err, MenuError::TomlError(_)));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[rules]\nproper_nouns = [\"Cornish\"]\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.proper_nouns(), ["Cornish"]);
    }
}
