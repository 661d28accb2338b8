use crate::domain::model::{GridRole, Meal, Variant};
use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MenuError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("XML error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    GridFormat(#[from] GridFormatError),

    #[error(transparent)]
    RuleResolution(#[from] RuleResolutionError),

    #[error(transparent)]
    TemplateMismatch(#[from] TemplateMismatchError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

pub type Result<T> = std::result::Result<T, MenuError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Rules,
    Template,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MenuError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MenuError::GridFormat(_) | MenuError::XmlError(_) => ErrorCategory::Input,
            MenuError::RuleResolution(_) => ErrorCategory::Rules,
            MenuError::TemplateMismatch(_) => ErrorCategory::Template,
            MenuError::ConfigError { .. }
            | MenuError::MissingConfigError { .. }
            | MenuError::InvalidConfigValueError { .. }
            | MenuError::ConfigValidationError { .. }
            | MenuError::TomlError(_) => ErrorCategory::Configuration,
            MenuError::ZipError(_)
            | MenuError::IoError(_)
            | MenuError::SerializationError(_)
            | MenuError::ProcessingError { .. } => ErrorCategory::System,
        }
    }

    /// 決定退出碼：Medium = 部分日期失敗，High = 整次執行失敗，Critical = 系統錯誤
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Rules | ErrorCategory::Template => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            MenuError::GridFormat(_) => {
                "Check that the weekly document still follows the fixed grid (row labels, 7 day columns, dates)"
            }
            MenuError::XmlError(_) | MenuError::ZipError(_) => {
                "Make sure the input files are valid .docx documents saved by Word"
            }
            MenuError::RuleResolution(_) => {
                "Fill in the missing dish for that day in the weekly grid and re-run"
            }
            MenuError::TemplateMismatch(_) => {
                "Add the missing placeholders to the template or point --templates at the right folder"
            }
            MenuError::TomlError(_)
            | MenuError::ConfigError { .. }
            | MenuError::MissingConfigError { .. }
            | MenuError::InvalidConfigValueError { .. }
            | MenuError::ConfigValidationError { .. } => {
                "Review the command-line flags and the TOML configuration file"
            }
            MenuError::IoError(_) => "Check that the paths exist and are readable/writable",
            MenuError::SerializationError(_) | MenuError::ProcessingError { .. } => {
                "Re-run with --verbose and report the log output"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MenuError::GridFormat(e) => format!("The weekly menu grid could not be read: {}", e),
            MenuError::RuleResolution(e) => format!("A day's menu is incomplete: {}", e),
            MenuError::TemplateMismatch(e) => format!("A template does not match: {}", e),
            MenuError::IoError(e) => format!("File problem: {}", e),
            other => other.to_string(),
        }
    }
}

/// One structural problem found while reading the weekly grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridProblem {
    NoTable,
    MissingRow {
        role: GridRole,
        row: usize,
    },
    LabelMismatch {
        role: GridRole,
        row: usize,
        expected: String,
        found: String,
    },
    TooFewColumns {
        role: GridRole,
        row: usize,
        found: usize,
        expected: usize,
    },
    BadDate {
        day: usize,
        text: String,
    },
    DuplicateDate {
        date: NaiveDate,
    },
}

impl fmt::Display for GridProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridProblem::NoTable => write!(f, "no table found in the weekly document"),
            GridProblem::MissingRow { role, row } => {
                write!(f, "row {} ({}) is missing", row, role)
            }
            GridProblem::LabelMismatch {
                role,
                row,
                expected,
                found,
            } => write!(
                f,
                "row {} ({}) should be labelled '{}' but reads '{}'",
                row, role, expected, found
            ),
            GridProblem::TooFewColumns {
                role,
                row,
                found,
                expected,
            } => write!(
                f,
                "row {} ({}) has {} columns, expected at least {}",
                row, role, found, expected
            ),
            GridProblem::BadDate { day, text } => {
                write!(f, "day column {} has an unreadable date '{}'", day + 1, text)
            }
            GridProblem::DuplicateDate { date } => {
                write!(f, "date {} appears more than once", date)
            }
        }
    }
}

/// Every structural mismatch in the weekly grid, collected in one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridFormatError {
    pub problems: Vec<GridProblem>,
}

impl fmt::Display for GridFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "weekly grid format error ({} problem(s))", self.problems.len())?;
        for problem in &self.problems {
            write!(f, "; {}", problem)?;
        }
        Ok(())
    }
}

impl std::error::Error for GridFormatError {}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{variant} menu for {date} ({meal}): no dish for {role}")]
pub struct RuleResolutionError {
    pub date: NaiveDate,
    pub variant: Variant,
    pub meal: Meal,
    pub role: GridRole,
}

/// Reported by the document renderer when a template cannot take the data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateMismatchError {
    pub template: String,
    pub reason: String,
    /// Placeholder names the template lacks; empty for structural mismatches.
    pub missing: Vec<String>,
}

impl fmt::Display for TemplateMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "template '{}' {}", self.template, self.reason)?;
        if !self.missing.is_empty() {
            write!(f, ": {}", self.missing.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for TemplateMismatchError {}

/// A day that could not be produced, with the error that stopped it.
#[derive(Error, Debug)]
#[error("{weekday} {date}: {source}")]
pub struct DayFailure {
    pub date: NaiveDate,
    pub weekday: String,
    #[source]
    pub source: MenuError,
}
