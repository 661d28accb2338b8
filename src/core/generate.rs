use crate::core::allergens::AllergensComposer;
use crate::core::rules::RuleEngine;
use crate::domain::model::{DayArtifacts, DayMenu, DaySelection, Variant, WeeklyMenu};
use crate::utils::error::{DayFailure, MenuError, Result};

/// Days picked out of the week, in grid order.
pub fn select_days(week: &WeeklyMenu, selection: DaySelection) -> Result<Vec<&DayMenu>> {
    match selection {
        DaySelection::All => Ok(week.days().iter().collect()),
        DaySelection::One(date) => week.day(date).map(|d| vec![d]).ok_or_else(|| {
            let first = week.days().first().map(|d| d.date.to_string()).unwrap_or_default();
            let last = week.days().last().map(|d| d.date.to_string()).unwrap_or_default();
            MenuError::InvalidConfigValueError {
                field: "date".to_string(),
                value: date.to_string(),
                reason: format!("the weekly grid covers {} to {}", first, last),
            }
        }),
    }
}

/// Resolves both variants of one day and composes its allergens sheet.
pub fn resolve_day(
    day: &DayMenu,
    engine: &RuleEngine,
    composer: &AllergensComposer,
) -> Result<DayArtifacts> {
    let standard = engine.resolve(day, Variant::Standard)?;
    let vegan = engine.resolve(day, Variant::Vegan)?;
    let allergens = composer.compose(day, &standard, &vegan);
    Ok(DayArtifacts {
        date: day.date,
        weekday: day.weekday.clone(),
        standard,
        vegan,
        allergens,
    })
}

/// Per-day results for the selected days. A day that fails does not stop the others.
pub fn generate(
    week: &WeeklyMenu,
    selection: DaySelection,
    engine: &RuleEngine,
    composer: &AllergensComposer,
) -> Result<Vec<std::result::Result<DayArtifacts, DayFailure>>> {
    let days = select_days(week, selection)?;
    let results = days
        .into_iter()
        .map(|day| {
            resolve_day(day, engine, composer).map_err(|source| {
                tracing::warn!("⚠️ {} {} skipped: {}", day.weekday, day.date, source);
                DayFailure {
                    date: day.date,
                    weekday: day.weekday.clone(),
                    source,
                }
            })
        })
        .collect();
    Ok(results)
}
