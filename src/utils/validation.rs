use crate::domain::model::DaySelection;
use crate::utils::error::{MenuError, Result};
use chrono::NaiveDate;
use std::path::Path;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(MenuError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(MenuError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// Non-empty path ending in `.docx` (case-insensitive).
pub fn validate_docx_path(field_name: &str, path: &str) -> Result<()> {
    validate_path(field_name, path)?;

    match Path::new(path).extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("docx") => Ok(()),
        Some(ext) => Err(MenuError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: format!("Unsupported file extension: {}. Expected a .docx document", ext),
        }),
        None => Err(MenuError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "File has no extension; expected a .docx document".to_string(),
        }),
    }
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| MenuError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MenuError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// `--date YYYY-MM-DD` and `--all-days` are mutually exclusive, and one is required.
pub fn validate_day_selection(date: Option<&str>, all_days: bool) -> Result<DaySelection> {
    match (date, all_days) {
        (Some(_), true) => Err(MenuError::ConfigValidationError {
            field: "date".to_string(),
            message: "use either --date or --all-days, not both".to_string(),
        }),
        (None, false) => Err(MenuError::MissingConfigError {
            field: "date (or --all-days)".to_string(),
        }),
        (None, true) => Ok(DaySelection::All),
        (Some(raw), false) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(DaySelection::One)
            .map_err(|e| MenuError::InvalidConfigValueError {
                field: "date".to_string(),
                value: raw.to_string(),
                reason: format!("expected YYYY-MM-DD ({})", e),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_docx_path() {
        assert!(validate_docx_path("weekly", "menus/week 38.docx").is_ok());
        assert!(validate_docx_path("weekly", "WEEK.DOCX").is_ok());
        assert!(validate_docx_path("weekly", "").is_err());
        assert!(validate_docx_path("weekly", "week.doc").is_err());
        assert!(validate_docx_path("weekly", "week").is_err());
    }

    #[test]
    fn test_validate_day_selection() {
        assert_eq!(validate_day_selection(None, true).unwrap(), DaySelection::All);
        assert_eq!(
            validate_day_selection(Some("2025-09-15"), false).unwrap(),
            DaySelection::One(NaiveDate::from_ymd_opt(2025, 9, 15).unwrap())
        );
        assert!(matches!(
            validate_day_selection(Some("2025-09-15"), true),
            Err(MenuError::ConfigValidationError { .. })
        ));
        assert!(matches!(
            validate_day_selection(None, false),
            Err(MenuError::MissingConfigError { .. })
        ));
        assert!(validate_day_selection(Some("15/09/2025"), false).is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("rules.proper_nouns", "Yorkshire").is_ok());
        assert!(validate_non_empty_string("rules.proper_nouns", "  ").is_err());
    }
}
