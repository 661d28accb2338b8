//! Per-day rule engine: one [`DayMenu`] + a [`Variant`] -> resolved placeholder fields.
//!
//! The rules run as an ordered list of pure functions over an immutable
//! snapshot of the day's menu lines; each returns a new snapshot, later rules
//! may override earlier ones.

use crate::domain::model::{
    allergen_line, sandwich_selection_allergens, vegan_dessert_allergens, Allergen, AllergenSet,
    DayMenu, Dish, FieldMap, GridRole, LineKey, Meal, MealSlot, MenuLine, ResolvedField,
    ResolvedMenu, Variant,
};
use crate::utils::error::RuleResolutionError;
use crate::utils::text;

pub const JACKET_POTATO_TITLE: &str = "Jacket potato and toppings (Ve)";
pub const CHEFS_CHOICE_SOUP: &str = "Chef's choice soup";
pub const STANDARD_ICE_CREAM_TITLE: &str = "Ice creams / sorbet (V)";
pub const VEGAN_ICE_CREAM_TITLE: &str =
    "Selection of vegan ice creams or sorbet with seasonal fruits (Ve)";
pub const STANDARD_SELECTION_TITLE: &str = "Assorted sandwiches (V)";
pub const VEGAN_SELECTION_TITLE: &str = "Henbrook's assorted sandwiches (Ve)";

/// Placeholders every menu template is expected to carry.
pub const REQUIRED_PLACEHOLDERS: [&str; 6] = [
    "header.date",
    "lunch.mains.0.title",
    "lunch.mains.1.title",
    "lunch.desserts.0.title",
    "supper.specials.title",
    "supper.desserts.0.title",
];

#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    key: LineKey,
    title: String,
    description: Option<String>,
    allergens: AllergenSet,
    highlight_title: bool,
    highlight_description: bool,
    ice_cream: bool,
}

impl Line {
    fn new(key: LineKey) -> Self {
        Self {
            key,
            title: String::new(),
            description: None,
            allergens: AllergenSet::new(),
            highlight_title: false,
            highlight_description: false,
            ice_cream: false,
        }
    }

    fn from_dish(key: LineKey, dish: Option<&Dish>) -> Self {
        let mut line = Self::new(key);
        if let Some(dish) = dish {
            line.title = dish.title.clone();
            line.description = dish.description.clone();
            line.allergens = dish.allergens.clone();
        }
        line
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    lines: Vec<Line>,
}

impl Snapshot {
    fn get(&self, key: LineKey) -> Option<&Line> {
        self.lines.iter().find(|l| l.key == key)
    }

    /// Copy of the snapshot with `f` applied to the line at `key`.
    fn with_line(&self, key: LineKey, f: impl FnOnce(&mut Line)) -> Snapshot {
        let mut next = self.clone();
        if let Some(line) = next.lines.iter_mut().find(|l| l.key == key) {
            f(line);
        }
        next
    }

    fn with_lines(&self, mut f: impl FnMut(&mut Line)) -> Snapshot {
        let mut next = self.clone();
        next.lines.iter_mut().for_each(&mut f);
        next
    }
}

struct RuleContext<'a> {
    day: &'a DayMenu,
    variant: Variant,
    proper_nouns: &'a [String],
}

impl RuleContext<'_> {
    fn missing(&self, meal: Meal, role: GridRole) -> RuleResolutionError {
        RuleResolutionError {
            date: self.day.date,
            variant: self.variant,
            meal,
            role,
        }
    }

    fn require(&self, slot: &MealSlot, role: GridRole) -> Result<Dish, RuleResolutionError> {
        slot.first(role)
            .filter(|d| !d.title.trim().is_empty())
            .cloned()
            .ok_or_else(|| self.missing(slot.meal, role))
    }
}

type Rule = fn(&RuleContext<'_>, &Snapshot) -> Result<Snapshot, RuleResolutionError>;

/// Applied in order; a later rule sees, and may override, the output of earlier ones.
const RULES: [(&str, Rule); 6] = [
    ("main_ordering", order_mains_rule),
    ("dessert_titles", dessert_titles_rule),
    ("highlighting", highlighting_rule),
    ("supper_starter", supper_starter_rule),
    ("allergen_scrubbing", scrub_allergens_rule),
    ("supper_special_tag", supper_special_tag_rule),
];

#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    proper_nouns: Vec<String>,
}

impl RuleEngine {
    pub fn new(proper_nouns: Vec<String>) -> Self {
        Self { proper_nouns }
    }

    pub fn resolve(&self, day: &DayMenu, variant: Variant) -> Result<ResolvedMenu, RuleResolutionError> {
        let ctx = RuleContext {
            day,
            variant,
            proper_nouns: &self.proper_nouns,
        };

        let mut snapshot = seed(&ctx)?;
        for (name, rule) in RULES {
            snapshot = rule(&ctx, &snapshot)?;
            tracing::trace!("{} {} rule '{}' applied", day.date, variant, name);
        }

        Ok(ResolvedMenu {
            date: day.date,
            variant,
            fields: flatten(day, &snapshot),
            lines: snapshot
                .lines
                .iter()
                .map(|l| MenuLine {
                    key: l.key,
                    title: l.title.clone(),
                    allergens: l.allergens.clone(),
                })
                .collect(),
        })
    }
}

/// Lunch mains in menu order. Standard: vegetarian-friendly before meat.
/// Vegan: the jacket potato, then the week's vegan main if there is one.
pub fn order_mains(lunch: &MealSlot, variant: Variant) -> Vec<Dish> {
    match variant {
        Variant::Standard => {
            let mut mains: Vec<Dish> = lunch
                .dishes
                .iter()
                .filter(|d| matches!(d.role, GridRole::LunchVegMain | GridRole::LunchMeatMain))
                .filter(|d| !d.title.trim().is_empty())
                .cloned()
                .collect();
            mains.sort_by_key(|d| d.role == GridRole::LunchMeatMain);
            mains
        }
        Variant::Vegan => {
            let jacket = Dish {
                role: GridRole::LunchVeganMain,
                title: JACKET_POTATO_TITLE.to_string(),
                description: None,
                allergens: AllergenSet::new(),
                is_vegan_source: true,
            };
            let vegan_main = lunch
                .first(GridRole::LunchVeganMain)
                .filter(|d| !d.title.trim().is_empty())
                .or_else(|| {
                    lunch
                        .with_role(GridRole::LunchVegMain)
                        .find(|d| d.is_vegan_source && !d.title.trim().is_empty())
                });
            std::iter::once(jacket).chain(vegan_main.cloned()).collect()
        }
    }
}

fn seed(ctx: &RuleContext<'_>) -> Result<Snapshot, RuleResolutionError> {
    let day = ctx.day;
    let soup = ctx.require(&day.lunch, GridRole::LunchSoup)?;
    let mut lines = Vec::new();

    match ctx.variant {
        Variant::Standard => {
            // the soup is always starter 0, other starters follow
            let starters = std::iter::once(&soup).chain(day.lunch.with_role(GridRole::LunchStarter));
            for (i, dish) in starters.enumerate() {
                let mut line = Line::from_dish(LineKey::LunchStarter(i), Some(dish));
                line.title = text::strip_tag(&line.title);
                lines.push(line);
            }
        }
        Variant::Vegan => {
            let mut first = Line::from_dish(LineKey::LunchStarter(0), Some(&soup));
            first.title = text::with_tag(&soup.title, Variant::Vegan.tag());
            lines.push(first);
            // second starter intentionally blank on the vegan menu
            lines.push(Line::new(LineKey::LunchStarter(1)));
        }
    }

    lines.push(Line::from_dish(
        LineKey::LunchSides,
        day.lunch.first(GridRole::LunchSides),
    ));

    let dessert = ctx.require(&day.lunch, GridRole::LunchDessert)?;
    lines.push(Line::from_dish(LineKey::LunchDessert, Some(&dessert)));
    lines.push(Line::from_dish(
        LineKey::LunchIceCream,
        day.lunch.first(GridRole::LunchIceCream),
    ));

    lines.push(Line::new(LineKey::SupperStarter));

    let mut selection = Line::new(LineKey::SupperSelection);
    selection.title = match ctx.variant {
        Variant::Standard => STANDARD_SELECTION_TITLE.to_string(),
        Variant::Vegan => VEGAN_SELECTION_TITLE.to_string(),
    };
    selection.allergens = sandwich_selection_allergens();
    lines.push(selection);

    lines.push(supper_special_line(ctx)?);

    let supper_dessert = ctx.require(&day.supper, GridRole::SupperDessert)?;
    lines.push(Line::from_dish(LineKey::SupperDessert, Some(&supper_dessert)));
    lines.push(Line::from_dish(
        LineKey::SupperIceCream,
        day.supper.first(GridRole::SupperIceCream),
    ));

    Ok(Snapshot { lines })
}

fn supper_special_line(ctx: &RuleContext<'_>) -> Result<Line, RuleResolutionError> {
    let supper = &ctx.day.supper;
    match ctx.variant {
        Variant::Standard => {
            let special = ctx.require(supper, GridRole::SupperSpecial)?;
            let mut line = Line::from_dish(LineKey::SupperSpecial, Some(&special));
            line.title = text::strip_tag(&special.title);
            Ok(line)
        }
        Variant::Vegan => {
            let own = supper
                .first(GridRole::SupperVeganSpecial)
                .filter(|d| !d.title.trim().is_empty());
            if let Some(dish) = own {
                return Ok(Line::from_dish(LineKey::SupperSpecial, Some(dish)));
            }

            let standard = supper
                .first(GridRole::SupperSpecial)
                .filter(|d| !d.title.trim().is_empty())
                .ok_or_else(|| ctx.missing(Meal::Supper, GridRole::SupperVeganSpecial))?;
            tracing::debug!(
                "{}: no vegan supper special in the grid, deriving it from '{}'",
                ctx.day.date,
                standard.title
            );
            let mut line = Line::new(LineKey::SupperSpecial);
            line.title = text::pick_vegan_variant(
                &standard.title,
                standard.description.as_deref().unwrap_or(""),
            );
            line.allergens = supper
                .first(GridRole::SupperVeganSpecial)
                .map(|d| d.allergens.clone())
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| standard.allergens.clone());
            Ok(line)
        }
    }
}

fn order_mains_rule(ctx: &RuleContext<'_>, snapshot: &Snapshot) -> Result<Snapshot, RuleResolutionError> {
    let mains = order_mains(&ctx.day.lunch, ctx.variant);
    if ctx.variant == Variant::Standard && mains.is_empty() {
        return Err(ctx.missing(Meal::Lunch, GridRole::LunchVegMain));
    }

    let mut next = snapshot.clone();
    let at = next
        .lines
        .iter()
        .position(|l| l.key == LineKey::LunchSides)
        .unwrap_or(next.lines.len());
    let main_lines = mains.iter().enumerate().map(|(i, dish)| {
        let mut line = Line::from_dish(LineKey::LunchMain(i), Some(dish));
        line.title = match (ctx.variant, dish.role) {
            (Variant::Standard, GridRole::LunchMeatMain) => text::strip_tag(&dish.title),
            (Variant::Standard, _) => text::ensure_tag(&dish.title, Variant::Standard.tag()),
            (Variant::Vegan, _) => dish.title.trim().to_string(),
        };
        line
    });
    let tail = next.lines.split_off(at);
    next.lines.extend(main_lines);
    next.lines.extend(tail);
    Ok(next)
}

fn dessert_titles_rule(ctx: &RuleContext<'_>, snapshot: &Snapshot) -> Result<Snapshot, RuleResolutionError> {
    let tag = ctx.variant.tag();
    let ice_cream_title = match ctx.variant {
        Variant::Standard => STANDARD_ICE_CREAM_TITLE,
        Variant::Vegan => VEGAN_ICE_CREAM_TITLE,
    };
    Ok(snapshot.with_lines(|line| match line.key {
        LineKey::LunchDessert | LineKey::SupperDessert => {
            let cased = text::sentence_case(&text::strip_tag(&line.title), ctx.proper_nouns);
            line.title = format!("{} {}", cased, tag);
        }
        LineKey::LunchIceCream | LineKey::SupperIceCream => {
            line.title = ice_cream_title.to_string();
            line.ice_cream = true;
        }
        _ => {}
    }))
}

fn highlighting_rule(ctx: &RuleContext<'_>, snapshot: &Snapshot) -> Result<Snapshot, RuleResolutionError> {
    if ctx.variant == Variant::Standard {
        return Ok(snapshot.with_lines(|line| {
            line.highlight_title = false;
            line.highlight_description = false;
        }));
    }

    let mut next = snapshot.with_lines(|line| {
        let always = matches!(
            line.key,
            LineKey::LunchDessert | LineKey::SupperDessert | LineKey::SupperStarter
        );
        if always && !line.ice_cream {
            line.highlight_title = true;
        }
    });

    // A vegan description missing from the grid is borrowed from the standard
    // dish and highlighted so readers can see it was substituted.
    let lunch = &ctx.day.lunch;
    let borrowed_main = lunch.first(GridRole::LunchVegMain).and_then(|d| d.description.clone());
    let vegan_main_key = next
        .lines
        .iter()
        .find(|l| matches!(l.key, LineKey::LunchMain(i) if i > 0))
        .map(|l| l.key);
    if let Some(key) = vegan_main_key {
        next = borrow_description(&next, key, borrowed_main);
    }

    let borrowed_special = ctx
        .day
        .supper
        .first(GridRole::SupperSpecial)
        .and_then(|d| d.description.clone());
    next = borrow_description(&next, LineKey::SupperSpecial, borrowed_special);
    Ok(next)
}

fn borrow_description(snapshot: &Snapshot, key: LineKey, borrowed: Option<String>) -> Snapshot {
    let needs = snapshot
        .get(key)
        .is_some_and(|l| l.description.as_deref().map_or(true, |d| d.trim().is_empty()));
    match borrowed.filter(|b| !b.trim().is_empty()) {
        Some(text) if needs => snapshot.with_line(key, |line| {
            line.description = Some(text);
            line.highlight_description = true;
        }),
        _ => snapshot.clone(),
    }
}

fn supper_starter_rule(ctx: &RuleContext<'_>, snapshot: &Snapshot) -> Result<Snapshot, RuleResolutionError> {
    let soup_allergens = ctx
        .day
        .lunch
        .first(GridRole::LunchSoup)
        .map(|d| d.allergens.clone())
        .unwrap_or_default();
    let title = format!("{} {}", CHEFS_CHOICE_SOUP, ctx.variant.tag());
    Ok(snapshot.with_line(LineKey::SupperStarter, |line| {
        line.title = title;
        line.allergens = soup_allergens;
    }))
}

fn scrub_allergens_rule(ctx: &RuleContext<'_>, snapshot: &Snapshot) -> Result<Snapshot, RuleResolutionError> {
    if ctx.variant == Variant::Standard {
        return Ok(snapshot.clone());
    }
    Ok(snapshot.with_lines(|line| {
        match line.key {
            LineKey::LunchDessert
            | LineKey::SupperDessert
            | LineKey::LunchIceCream
            | LineKey::SupperIceCream => line.allergens = vegan_dessert_allergens(),
            _ => {}
        }
        line.allergens.remove(&Allergen::Milk);
        line.allergens.remove(&Allergen::Eggs);
    }))
}

fn supper_special_tag_rule(ctx: &RuleContext<'_>, snapshot: &Snapshot) -> Result<Snapshot, RuleResolutionError> {
    if ctx.variant == Variant::Standard {
        return Ok(snapshot.clone());
    }
    Ok(snapshot.with_line(LineKey::SupperSpecial, |line| {
        line.title = text::ensure_tag(&line.title, Variant::Vegan.tag());
    }))
}

fn field(fields: &mut FieldMap, name: String, text: &str, highlighted: bool) {
    fields.insert(
        name.clone(),
        ResolvedField {
            name,
            text: text.to_string(),
            highlighted,
        },
    );
}

fn flatten(day: &DayMenu, snapshot: &Snapshot) -> FieldMap {
    let mut fields = FieldMap::new();
    let date = text::date_label(day.date, &day.weekday);
    for prefix in ["header", "days"] {
        field(&mut fields, format!("{}.theme", prefix), &day.theme, false);
        field(&mut fields, format!("{}.date", prefix), &date, false);
    }

    // the templates always carry two starter and two main slots
    for i in 0..2 {
        for prefix in [format!("lunch.starters.{}", i), format!("lunch.mains.{}", i)] {
            field(&mut fields, format!("{}.title", prefix), "", false);
            field(&mut fields, format!("{}.allergens", prefix), "", false);
        }
        field(&mut fields, format!("lunch.mains.{}.description", i), "", false);
    }

    for line in &snapshot.lines {
        let (prefix, with_description) = match line.key {
            LineKey::LunchStarter(i) => (format!("lunch.starters.{}", i), false),
            LineKey::LunchMain(i) => (format!("lunch.mains.{}", i), true),
            LineKey::LunchSides => ("lunch.optional_sides".to_string(), false),
            LineKey::LunchDessert => ("lunch.desserts.0".to_string(), false),
            LineKey::LunchIceCream => ("lunch.desserts.1".to_string(), false),
            LineKey::SupperStarter => ("supper.starter".to_string(), false),
            LineKey::SupperSelection => ("supper.selection".to_string(), false),
            LineKey::SupperSpecial => ("supper.specials".to_string(), true),
            LineKey::SupperDessert => ("supper.desserts.0".to_string(), false),
            LineKey::SupperIceCream => ("supper.desserts.1".to_string(), false),
        };
        field(&mut fields, format!("{}.title", prefix), &line.title, line.highlight_title);
        field(
            &mut fields,
            format!("{}.allergens", prefix),
            &allergen_line(&line.allergens),
            false,
        );
        if with_description {
            field(
                &mut fields,
                format!("{}.description", prefix),
                line.description.as_deref().unwrap_or(""),
                line.highlight_description,
            );
        }
    }
    fields
}
