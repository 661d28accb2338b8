//! Weekly grid parser: raw table text -> [`WeeklyMenu`].
//!
//! Rows are addressed through the [`GridLayout`] table (role -> row + label),
//! day columns by fixed offset. Every structural problem is collected before
//! failing so one run reports the whole list.

use crate::domain::layout::{GridLayout, RowSpec};
use crate::domain::model::{DayMenu, Dish, GridRole, Meal, MealSlot, WeeklyMenu};
use crate::utils::error::{GridFormatError, GridProblem};
use crate::utils::text::{self, CellParts};
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashSet;

/// One cell of the table after merges were expanded to the underlying grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCell {
    pub text: String,
    /// Repeated copy of a horizontally merged cell.
    pub span_copy: bool,
    /// Continuation of a vertically merged cell.
    pub vmerge_copy: bool,
}

impl RawCell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// The weekly table as strings, row by row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawGrid {
    pub rows: Vec<Vec<RawCell>>,
}

impl RawGrid {
    /// Builds a grid without merges, mostly for tests.
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(RawCell::new).collect())
                .collect(),
        }
    }

    fn cell(&self, row: usize, col: usize) -> Option<&RawCell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Label of a row: the first non-empty cell of the label group (the label
    /// cell and its merge copies); a vertical continuation inherits from above.
    fn label(&self, row: usize, label_columns: usize) -> String {
        let Some(cells) = self.rows.get(row) else {
            return String::new();
        };
        let group = cells
            .iter()
            .take(label_columns.max(1))
            .enumerate()
            .take_while(|(i, c)| *i == 0 || c.span_copy)
            .map(|(_, c)| c);
        for cell in group {
            let cleaned = text::single_line(&text::clean_text(&cell.text));
            if !cleaned.is_empty() {
                return cleaned;
            }
        }
        if row > 0 && cells.first().is_some_and(|c| c.vmerge_copy) {
            return self.label(row - 1, label_columns);
        }
        String::new()
    }
}

pub struct GridParser {
    layout: GridLayout,
}

impl GridParser {
    pub fn new(layout: GridLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn parse(&self, grid: &RawGrid) -> Result<WeeklyMenu, GridFormatError> {
        if grid.rows.is_empty() {
            return Err(GridFormatError {
                problems: vec![GridProblem::NoTable],
            });
        }

        let mut problems = Vec::new();
        for spec in &self.layout.rows {
            self.check_row(grid, spec, &mut problems);
        }

        let dates = self.read_dates(grid, &mut problems);
        if !problems.is_empty() {
            return Err(GridFormatError { problems });
        }

        let days = dates
            .into_iter()
            .enumerate()
            .filter_map(|(day, date)| date.map(|d| self.build_day(grid, day, d)))
            .collect::<Vec<_>>();

        tracing::debug!("Parsed weekly grid with {} days", days.len());
        Ok(WeeklyMenu::new(days))
    }

    fn check_row(&self, grid: &RawGrid, spec: &RowSpec, problems: &mut Vec<GridProblem>) {
        let Some(cells) = grid.rows.get(spec.row) else {
            problems.push(GridProblem::MissingRow {
                role: spec.role,
                row: spec.row,
            });
            return;
        };

        let expected_columns = self.layout.required_columns();
        if cells.len() < expected_columns {
            problems.push(GridProblem::TooFewColumns {
                role: spec.role,
                row: spec.row,
                found: cells.len(),
                expected: expected_columns,
            });
        }

        if let Some(expected) = &spec.label {
            let found = grid.label(spec.row, self.layout.first_day_column);
            if !found.to_lowercase().contains(&expected.trim().to_lowercase()) {
                problems.push(GridProblem::LabelMismatch {
                    role: spec.role,
                    row: spec.row,
                    expected: expected.clone(),
                    found,
                });
            }
        }
    }

    fn day_cell(&self, grid: &RawGrid, row: usize, day: usize) -> String {
        grid.cell(row, self.layout.first_day_column + day)
            .map(|c| c.text.clone())
            .unwrap_or_default()
    }

    fn header_text(&self, grid: &RawGrid, role: GridRole, day: usize) -> String {
        self.layout
            .rows_for(role)
            .next()
            .map(|spec| text::single_line(&text::clean_text(&self.day_cell(grid, spec.row, day))))
            .unwrap_or_default()
    }

    fn read_dates(&self, grid: &RawGrid, problems: &mut Vec<GridProblem>) -> Vec<Option<NaiveDate>> {
        let mut seen = HashSet::new();
        (0..self.layout.day_count)
            .map(|day| {
                let raw = self.header_text(grid, GridRole::Dates, day);
                match text::parse_grid_date(&raw) {
                    Some(date) => {
                        if !seen.insert(date) {
                            problems.push(GridProblem::DuplicateDate { date });
                        }
                        Some(date)
                    }
                    None => {
                        problems.push(GridProblem::BadDate { day, text: raw });
                        None
                    }
                }
            })
            .collect()
    }

    fn build_day(&self, grid: &RawGrid, day: usize, date: NaiveDate) -> DayMenu {
        let mut weekday = self.header_text(grid, GridRole::Weekdays, day);
        if weekday.is_empty() {
            weekday = weekday_name(date.weekday()).to_string();
        }
        let theme = self.header_text(grid, GridRole::Themes, day);

        let mut lunch = MealSlot::new(Meal::Lunch);
        let mut supper = MealSlot::new(Meal::Supper);
        let mut specs: Vec<&RowSpec> = self
            .layout
            .rows
            .iter()
            .filter(|s| s.role.meal().is_some())
            .collect();
        specs.sort_by_key(|s| s.row);

        for spec in specs {
            let raw = self.day_cell(grid, spec.row, day);
            let Some(dish) = parse_dish(spec.role, &raw) else {
                continue;
            };
            match spec.role.meal() {
                Some(Meal::Lunch) => lunch.dishes.push(dish),
                Some(Meal::Supper) => supper.dishes.push(dish),
                None => {}
            }
        }

        DayMenu {
            date,
            weekday,
            theme,
            lunch,
            supper,
        }
    }
}

impl Default for GridParser {
    fn default() -> Self {
        Self::new(GridLayout::default())
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Recovers a `(Ve)` title that was typed into the allergen line of a vegan row.
fn recover_vegan_title(parts: &mut CellParts) {
    let Some(end) = text::vegan_tag_end(&parts.allergens) else {
        return;
    };
    let start = parts.allergens[..end]
        .find(|c: char| c.is_alphabetic())
        .unwrap_or(0);
    let dumped = parts.allergens[start..end].trim().to_string();
    if text::strip_tag(&parts.title).chars().count() < 2 {
        parts.title = dumped;
    }
    parts.allergens = parts.allergens[end..]
        .trim_start_matches([',', ' '])
        .trim()
        .to_string();
}

/// Builds the dish held by one grid cell; blank cells hold no dish.
fn parse_dish(role: GridRole, raw: &str) -> Option<Dish> {
    let mut parts = text::split_cell(raw);
    if role.is_vegan_row() {
        recover_vegan_title(&mut parts);
    }

    if role == GridRole::LunchSides {
        let joined = format!("{}\n{}", parts.title, parts.description);
        parts.title = text::normalise_sides(joined.trim());
        parts.description.clear();
    }

    if parts.title.is_empty() && parts.allergens.is_empty() {
        return None;
    }

    let (allergens, unknown) = text::parse_allergen_list(&parts.allergens);
    if !unknown.is_empty() {
        tracing::debug!("Ignoring unknown allergen tokens in {}: {:?}", role, unknown);
    }

    let lower = parts.title.to_lowercase();
    let is_vegan_source = role.is_vegan_row() || lower.contains("(ve)") || lower.contains("vegan");

    Some(Dish {
        role,
        title: parts.title,
        description: Some(parts.description).filter(|d| !d.is_empty()),
        allergens,
        is_vegan_source,
    })
}
