use crate::core::rules::{
    JACKET_POTATO_TITLE, STANDARD_ICE_CREAM_TITLE, STANDARD_SELECTION_TITLE,
    VEGAN_ICE_CREAM_TITLE, VEGAN_SELECTION_TITLE,
};
use crate::domain::model::{
    jacket_potato_allergens, AllergenSet, AllergensRow, AllergensSheet, DayMenu, GridRole,
    LineKey, MenuLine, ResolvedMenu, RowKind, Variant,
};
use crate::utils::text;

pub const STANDARD_BANNER: &str = "\u{2014} Standard \u{2014}";
pub const VEGAN_BANNER: &str = "\u{2014} Vegan \u{2014}";

/// Builds the allergens sheet of one day from both resolved menus.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllergensComposer;

impl AllergensComposer {
    pub fn new() -> Self {
        Self
    }

    pub fn compose(&self, day: &DayMenu, standard: &ResolvedMenu, vegan: &ResolvedMenu) -> AllergensSheet {
        let mut rows = Vec::new();
        rows.push(banner(Variant::Standard));
        rows.extend(section(day, standard));
        rows.push(banner(Variant::Vegan));
        rows.extend(section(day, vegan));

        tracing::debug!("{}: allergens sheet has {} rows", day.date, rows.len());
        AllergensSheet {
            banner: text::month_banner(day.date),
            rows,
        }
    }
}

fn banner(section: Variant) -> AllergensRow {
    AllergensRow {
        section,
        kind: RowKind::Banner,
        label: match section {
            Variant::Standard => STANDARD_BANNER.to_string(),
            Variant::Vegan => VEGAN_BANNER.to_string(),
        },
        ticks: AllergenSet::new(),
    }
}

/// Fixed menu lines that appear on the menus but never on the allergens sheet.
/// The chef's choice supper starter is not listed either: its line is never read
/// here, and a named supper soup only gets a row when it is not chef's choice.
fn is_excluded(label: &str) -> bool {
    let fixed = [
        STANDARD_ICE_CREAM_TITLE,
        VEGAN_ICE_CREAM_TITLE,
        STANDARD_SELECTION_TITLE,
        VEGAN_SELECTION_TITLE,
    ];
    fixed.iter().any(|f| f.eq_ignore_ascii_case(label.trim()))
}

fn same_dish(a: &str, b: &str) -> bool {
    text::strip_tag(a).to_lowercase() == text::strip_tag(b).to_lowercase()
}

fn lines_where<'a>(
    menu: &'a ResolvedMenu,
    pred: impl Fn(&LineKey) -> bool + 'a,
) -> impl Iterator<Item = &'a MenuLine> + 'a {
    menu.lines.iter().filter(move |l| pred(&l.key))
}

fn section(day: &DayMenu, menu: &ResolvedMenu) -> Vec<AllergensRow> {
    let variant = menu.variant;
    let mut rows = Vec::new();
    let mut push = |label: &str, ticks: AllergenSet| {
        if label.trim().is_empty() || is_excluded(label) {
            return;
        }
        rows.push(AllergensRow {
            section: variant,
            kind: RowKind::Dish,
            label: label.trim().to_string(),
            ticks,
        });
    };

    // the vegan section only ever carries the lunch soup, never a second starter
    for line in lines_where(menu, |k| matches!(k, LineKey::LunchStarter(_))) {
        if variant == Variant::Vegan && line.key != LineKey::LunchStarter(0) {
            continue;
        }
        push(&line.title, line.allergens.clone());
    }

    let mut mains: Vec<_> = lines_where(menu, |k| matches!(k, LineKey::LunchMain(_))).collect();
    mains.sort_by_key(|l| l.key);
    for line in mains {
        let ticks = if line.title == JACKET_POTATO_TITLE {
            jacket_potato_allergens()
        } else {
            line.allergens.clone()
        };
        push(&line.title, ticks);
    }

    for key in [LineKey::LunchSides, LineKey::LunchDessert] {
        if let Some(line) = menu.line(key) {
            push(&line.title, line.allergens.clone());
        }
    }

    let lunch_soup = day.lunch.first(GridRole::LunchSoup);
    let supper_soup = day
        .supper
        .first(GridRole::SupperSoup)
        .filter(|s| !s.title.is_empty() && !text::is_chefs_choice_soup(&s.title));
    match (variant, supper_soup, lunch_soup) {
        (Variant::Standard, Some(soup), lunch) => {
            let duplicate = lunch.is_some_and(|l| same_dish(&l.title, &soup.title));
            if !duplicate {
                push(&text::with_tag(&soup.title, Variant::Standard.tag()), soup.allergens.clone());
            }
        }
        (Variant::Vegan, Some(soup), Some(lunch)) if !same_dish(&lunch.title, &soup.title) => {
            tracing::warn!(
                "⚠️ {}: supper soup '{}' differs from lunch soup '{}', the vegan sheet lists the lunch soup only",
                day.date,
                soup.title,
                lunch.title
            );
        }
        _ => {}
    }

    for key in [LineKey::SupperSpecial, LineKey::SupperDessert] {
        if let Some(line) = menu.line(key) {
            push(&line.title, line.allergens.clone());
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::tests::sample_grid;
    use crate::core::grid::GridParser;
    use crate::core::rules::RuleEngine;
    use crate::domain::model::{vegan_dessert_allergens, Allergen, Dish};

    fn sheet_for(day: &DayMenu) -> AllergensSheet {
        let engine = RuleEngine::default();
        let standard = engine.resolve(day, Variant::Standard).unwrap();
        let vegan = engine.resolve(day, Variant::Vegan).unwrap();
        AllergensComposer::new().compose(day, &standard, &vegan)
    }

    fn sample_day() -> DayMenu {
        GridParser::default().parse(&sample_grid()).unwrap().days()[0].clone()
    }

    fn labels(sheet: &AllergensSheet, section: Variant) -> Vec<String> {
        sheet
            .rows
            .iter()
            .filter(|r| r.section == section && r.kind == RowKind::Dish)
            .map(|r| r.label.clone())
            .collect()
    }

    #[test]
    fn test_sections_and_banners() {
        let sheet = sheet_for(&sample_day());
        assert_eq!(sheet.banner, "15 September 2025");

        let banners: Vec<_> = sheet
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.kind == RowKind::Banner)
            .map(|(i, r)| (i, r.label.as_str()))
            .collect();
        assert_eq!(banners.len(), 2);
        assert_eq!(banners[0], (0, STANDARD_BANNER));
        assert_eq!(banners[1].1, VEGAN_BANNER);
        assert!(sheet.rows[..banners[1].0]
            .iter()
            .all(|r| r.section == Variant::Standard));
    }

    #[test]
    fn test_standard_row_order() {
        let sheet = sheet_for(&sample_day());
        assert_eq!(
            labels(&sheet, Variant::Standard),
            vec![
                "Tomato soup 1",
                "Melon boat",
                "Vegetable lasagne (V)",
                "Beef stew",
                "Peas, carrots, Mash",
                "Apple crumble (V)",
                "Cheese omelette",
                "Rice pudding (V)",
            ]
        );
    }

    #[test]
    fn test_vegan_row_order_and_single_soup() {
        let sheet = sheet_for(&sample_day());
        let vegan = labels(&sheet, Variant::Vegan);
        assert_eq!(
            vegan,
            vec![
                "Tomato soup 1 (Ve)",
                JACKET_POTATO_TITLE,
                "Chickpea curry (Ve)",
                "Peas, carrots, Mash",
                "Apple crumble (Ve)",
                "Bean chilli (Ve)",
                "Rice pudding (Ve)",
            ]
        );
        let soups = vegan.iter().filter(|l| l.to_lowercase().contains("soup")).count();
        assert_eq!(soups, 1);
    }

    #[test]
    fn test_excluded_lines_never_appear() {
        let sheet = sheet_for(&sample_day());
        for row in &sheet.rows {
            assert!(!text::is_chefs_choice_soup(&row.label), "{}", row.label);
            assert!(!row.label.contains("ice cream"), "{}", row.label);
            assert!(!row.label.contains("sandwiches"), "{}", row.label);
        }
    }

    #[test]
    fn test_ticks() {
        let sheet = sheet_for(&sample_day());
        let row = |section: Variant, label: &str| {
            sheet
                .rows
                .iter()
                .find(|r| r.section == section && r.label == label)
                .unwrap()
                .ticks
                .clone()
        };
        assert_eq!(row(Variant::Vegan, JACKET_POTATO_TITLE), jacket_potato_allergens());
        assert_eq!(row(Variant::Vegan, "Apple crumble (Ve)"), vegan_dessert_allergens());
        assert_eq!(
            row(Variant::Vegan, "Tomato soup 1 (Ve)"),
            [Allergen::Celery].into_iter().collect()
        );
        assert_eq!(
            row(Variant::Standard, "Tomato soup 1"),
            [Allergen::Celery, Allergen::Milk].into_iter().collect()
        );
    }

    #[test]
    fn test_named_supper_soup_gets_a_standard_row() {
        let mut day = sample_day();
        day.supper.dishes.retain(|d| d.role != GridRole::SupperSoup);
        day.supper.dishes.push(Dish {
            role: GridRole::SupperSoup,
            title: "Leek and potato soup".to_string(),
            description: None,
            allergens: [Allergen::Celery, Allergen::Milk].into_iter().collect(),
            is_vegan_source: false,
        });
        let sheet = sheet_for(&day);
        assert!(labels(&sheet, Variant::Standard).contains(&"Leek and potato soup (V)".to_string()));

        let vegan_soups = labels(&sheet, Variant::Vegan)
            .into_iter()
            .filter(|l| l.to_lowercase().contains("soup"))
            .count();
        assert_eq!(vegan_soups, 1);
    }

    #[test]
    fn test_chefs_choice_lunch_soup_keeps_its_rows() {
        let mut day = sample_day();
        for dish in day.lunch.dishes.iter_mut().filter(|d| d.role == GridRole::LunchSoup) {
            dish.title = "Chef's choice soup".to_string();
        }
        let sheet = sheet_for(&day);

        let vegan = labels(&sheet, Variant::Vegan);
        assert_eq!(vegan[0], "Chef's choice soup (Ve)");
        let soups = vegan.iter().filter(|l| l.to_lowercase().contains("soup")).count();
        assert_eq!(soups, 1);
        assert_eq!(labels(&sheet, Variant::Standard)[0], "Chef's choice soup");
    }
}
