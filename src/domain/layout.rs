use crate::domain::model::GridRole;
use crate::utils::error::{MenuError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Where one logical row lives in the weekly table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSpec {
    pub role: GridRole,
    /// 0-based table row.
    pub row: usize,
    /// Text the label column must contain; `None` skips the label check.
    #[serde(default)]
    pub label: Option<String>,
}

impl RowSpec {
    pub fn new(role: GridRole, row: usize, label: Option<&str>) -> Self {
        Self {
            role,
            row,
            label: label.map(str::to_string),
        }
    }
}

/// Positional map of the weekly grid: role -> row/label, plus the day columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    #[serde(default = "default_first_day_column")]
    pub first_day_column: usize,
    #[serde(default = "default_day_count")]
    pub day_count: usize,
    pub rows: Vec<RowSpec>,
}

fn default_first_day_column() -> usize {
    1
}

fn default_day_count() -> usize {
    7
}

const REQUIRED_ROLES: [GridRole; 17] = [
    GridRole::Weekdays,
    GridRole::Dates,
    GridRole::Themes,
    GridRole::LunchSoup,
    GridRole::LunchStarter,
    GridRole::LunchVeganMain,
    GridRole::LunchVegMain,
    GridRole::LunchMeatMain,
    GridRole::LunchSides,
    GridRole::LunchDessert,
    GridRole::LunchIceCream,
    GridRole::SupperSoup,
    GridRole::SupperVeganSpecial,
    GridRole::SupperSelection,
    GridRole::SupperSpecial,
    GridRole::SupperDessert,
    GridRole::SupperIceCream,
];

impl Default for GridLayout {
    fn default() -> Self {
        use GridRole::*;
        Self {
            first_day_column: default_first_day_column(),
            day_count: default_day_count(),
            rows: vec![
                RowSpec::new(Weekdays, 0, None),
                RowSpec::new(Dates, 1, None),
                RowSpec::new(Themes, 2, None),
                RowSpec::new(LunchSoup, 3, Some("Soup")),
                RowSpec::new(LunchStarter, 4, Some("Starter")),
                RowSpec::new(LunchVeganMain, 5, Some("Vegan")),
                RowSpec::new(LunchVegMain, 6, Some("Vegetarian")),
                RowSpec::new(LunchMeatMain, 7, Some("Main")),
                RowSpec::new(LunchSides, 8, Some("Sides")),
                RowSpec::new(LunchDessert, 9, Some("Dessert")),
                RowSpec::new(LunchIceCream, 10, Some("Ice cream")),
                RowSpec::new(SupperSoup, 12, Some("Soup")),
                RowSpec::new(SupperVeganSpecial, 13, Some("Vegan")),
                RowSpec::new(SupperSelection, 14, Some("Sandwich")),
                RowSpec::new(SupperSpecial, 15, Some("Special")),
                RowSpec::new(SupperDessert, 16, Some("Dessert")),
                RowSpec::new(SupperIceCream, 17, Some("Ice cream")),
            ],
        }
    }
}

impl GridLayout {
    pub fn rows_for(&self, role: GridRole) -> impl Iterator<Item = &RowSpec> {
        self.rows.iter().filter(move |r| r.role == role)
    }

    /// Minimum number of grid columns a dish or header row must have.
    pub fn required_columns(&self) -> usize {
        self.first_day_column + self.day_count
    }

    /// Checked once at startup, before any document is read.
    pub fn validate(&self) -> Result<()> {
        if self.day_count == 0 {
            return Err(MenuError::InvalidConfigValueError {
                field: "grid.day_count".to_string(),
                value: self.day_count.to_string(),
                reason: "at least one day column is needed".to_string(),
            });
        }

        let missing: Vec<String> = REQUIRED_ROLES
            .iter()
            .filter(|role| self.rows_for(**role).next().is_none())
            .map(|role| role.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(MenuError::ConfigValidationError {
                field: "grid.rows".to_string(),
                message: format!("no row configured for: {}", missing.join(", ")),
            });
        }

        let mut seen = HashSet::new();
        for spec in &self.rows {
            if !seen.insert(spec.row) {
                return Err(MenuError::InvalidConfigValueError {
                    field: "grid.rows".to_string(),
                    value: spec.row.to_string(),
                    reason: format!("row index used more than once ({})", spec.role),
                });
            }
        }

        for role in [
            GridRole::Weekdays,
            GridRole::Dates,
            GridRole::Themes,
            GridRole::LunchSoup,
        ] {
            if self.rows_for(role).count() > 1 {
                return Err(MenuError::ConfigValidationError {
                    field: "grid.rows".to_string(),
                    message: format!("{} may only be configured once", role),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_is_valid() {
        let layout = GridLayout::default();
        assert!(layout.validate().is_ok());
        assert_eq!(layout.required_columns(), 8);
        assert_eq!(layout.rows_for(GridRole::LunchSoup).count(), 1);
        assert_eq!(layout.rows_for(GridRole::LunchStarter).count(), 1);
    }

    #[test]
    fn test_missing_role_is_rejected() {
        let mut layout = GridLayout::default();
        layout.rows.retain(|r| r.role != GridRole::SupperDessert);
        let err = layout.validate().unwrap_err();
        assert!(err.to_string().contains("supper dessert"));
    }

    #[test]
    fn test_duplicate_row_index_is_rejected() {
        let mut layout = GridLayout::default();
        layout.rows.push(RowSpec::new(GridRole::LunchStarter, 9, None));
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_second_soup_row_is_rejected() {
        let mut layout = GridLayout::default();
        layout.rows.push(RowSpec::new(GridRole::LunchSoup, 11, Some("Soup")));
        let err = layout.validate().unwrap_err();
        assert!(err.to_string().contains("lunch soup"));
    }

    #[test]
    fn test_layout_from_toml() {
        let layout: GridLayout = toml::from_str(
            r#"
first_day_column = 2
rows = [
  { role = "weekdays", row = 0 },
  { role = "lunch_dessert", row = 4, label = "Pudding" },
]
"#,
        )
        .unwrap();
        assert_eq!(layout.first_day_column, 2);
        assert_eq!(layout.day_count, 7);
        assert_eq!(layout.rows[1].role, GridRole::LunchDessert);
        assert_eq!(layout.rows[1].label.as_deref(), Some("Pudding"));
        assert!(layout.validate().is_err());
    }
}
