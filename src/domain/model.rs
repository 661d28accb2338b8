use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Canonical allergen columns, in the order the allergens sheet prints them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Allergen {
    Celery,
    CerealsWithGluten,
    Crustaceans,
    Eggs,
    Fish,
    Lupin,
    Milk,
    Molluscs,
    Mustard,
    Peanuts,
    TreeNuts,
    Sesame,
    Soybeans,
    Sulphur,
    Alcohol,
    Pork,
}

impl Allergen {
    pub const ALL: [Allergen; 16] = [
        Allergen::Celery,
        Allergen::CerealsWithGluten,
        Allergen::Crustaceans,
        Allergen::Eggs,
        Allergen::Fish,
        Allergen::Lupin,
        Allergen::Milk,
        Allergen::Molluscs,
        Allergen::Mustard,
        Allergen::Peanuts,
        Allergen::TreeNuts,
        Allergen::Sesame,
        Allergen::Soybeans,
        Allergen::Sulphur,
        Allergen::Alcohol,
        Allergen::Pork,
    ];

    /// Short name used in menu allergen lines.
    pub fn menu_label(self) -> &'static str {
        match self {
            Allergen::Celery => "Celery",
            Allergen::CerealsWithGluten => "Gluten",
            Allergen::Crustaceans => "Crustaceans",
            Allergen::Eggs => "Eggs",
            Allergen::Fish => "Fish",
            Allergen::Lupin => "Lupin",
            Allergen::Milk => "Milk",
            Allergen::Molluscs => "Molluscs",
            Allergen::Mustard => "Mustard",
            Allergen::Peanuts => "Peanuts",
            Allergen::TreeNuts => "Nuts",
            Allergen::Sesame => "Sesame",
            Allergen::Soybeans => "Soya",
            Allergen::Sulphur => "Sulphites",
            Allergen::Alcohol => "Alcohol",
            Allergen::Pork => "Pork",
        }
    }

    /// Column heading on the allergens sheet.
    pub fn column_name(self) -> &'static str {
        match self {
            Allergen::CerealsWithGluten => "Cereals with Gluten",
            Allergen::Mustard => "Mustards",
            Allergen::TreeNuts => "Nuts from Trees",
            Allergen::Soybeans => "Soybeans",
            Allergen::Sulphur => "Sulphur",
            other => other.menu_label(),
        }
    }

    /// Maps one free-text allergen token (as typed in the weekly grid) to its column.
    pub fn from_token(token: &str) -> Option<Allergen> {
        let t = token.trim().trim_end_matches('.').to_lowercase();
        let allergen = match t.as_str() {
            "celery" => Allergen::Celery,
            "gluten" | "cereals with gluten" | "cereal" | "cereals" => Allergen::CerealsWithGluten,
            "crustaceans" | "crustacean" => Allergen::Crustaceans,
            "egg" | "eggs" => Allergen::Eggs,
            "fish" => Allergen::Fish,
            "lupin" => Allergen::Lupin,
            "milk" | "dairy" => Allergen::Milk,
            "mollusc" | "molluscs" => Allergen::Molluscs,
            "mustard" | "mustards" => Allergen::Mustard,
            "peanut" | "peanuts" => Allergen::Peanuts,
            "nuts" | "tree nuts" | "nut" | "nuts from trees" => Allergen::TreeNuts,
            "sesame" => Allergen::Sesame,
            "soy" | "soya" | "soybeans" => Allergen::Soybeans,
            "sulphite" | "sulphites" | "sulphur" | "sulphur dioxide" | "sulfur dioxide" => {
                Allergen::Sulphur
            }
            "alcohol" => Allergen::Alcohol,
            "pork" => Allergen::Pork,
            _ => return None,
        };
        Some(allergen)
    }

    /// Recognises a column heading on an allergens template table.
    pub fn from_column_heading(text: &str) -> Option<Allergen> {
        let t = text.to_lowercase().replace("doi", "dio").replace("d02", "dio");
        let checks = [
            (t.contains("cereal") && t.contains("gluten"), Allergen::CerealsWithGluten),
            (t.contains("celery"), Allergen::Celery),
            (t.contains("crustace"), Allergen::Crustaceans),
            (t.contains("egg"), Allergen::Eggs),
            (t.contains("fish"), Allergen::Fish),
            (t.contains("lupin"), Allergen::Lupin),
            (t.contains("milk"), Allergen::Milk),
            (t.contains("mollusc"), Allergen::Molluscs),
            (t.contains("mustard"), Allergen::Mustard),
            (t.contains("peanut"), Allergen::Peanuts),
            (t.contains("nut") && t.contains("tree"), Allergen::TreeNuts),
            (t.contains("sesame"), Allergen::Sesame),
            (t.contains("soy"), Allergen::Soybeans),
            (t.contains("sulph") || t.contains("sulfur"), Allergen::Sulphur),
            (t.contains("alcohol"), Allergen::Alcohol),
            (t.contains("pork"), Allergen::Pork),
        ];
        checks.into_iter().find(|(hit, _)| *hit).map(|(_, a)| a)
    }
}

pub type AllergenSet = BTreeSet<Allergen>;

/// Renders a set the way menus print it: "Gluten, Nuts, Soya, Sulphites".
pub fn allergen_line(set: &AllergenSet) -> String {
    set.iter()
        .map(|a| a.menu_label())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn vegan_dessert_allergens() -> AllergenSet {
    [
        Allergen::CerealsWithGluten,
        Allergen::TreeNuts,
        Allergen::Soybeans,
        Allergen::Sulphur,
    ]
    .into_iter()
    .collect()
}

pub fn jacket_potato_allergens() -> AllergenSet {
    [
        Allergen::Celery,
        Allergen::CerealsWithGluten,
        Allergen::Mustard,
        Allergen::Sulphur,
    ]
    .into_iter()
    .collect()
}

pub fn sandwich_selection_allergens() -> AllergenSet {
    [
        Allergen::Sulphur,
        Allergen::CerealsWithGluten,
        Allergen::Mustard,
        Allergen::Soybeans,
    ]
    .into_iter()
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Standard,
    Vegan,
}

impl Variant {
    /// Diet tag appended to titles.
    pub fn tag(self) -> &'static str {
        match self {
            Variant::Standard => "(V)",
            Variant::Vegan => "(Ve)",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Standard => write!(f, "Standard"),
            Variant::Vegan => write!(f, "Vegan"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Meal {
    Lunch,
    Supper,
}

impl fmt::Display for Meal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Meal::Lunch => write!(f, "lunch"),
            Meal::Supper => write!(f, "supper"),
        }
    }
}

/// Logical rows of the weekly grid. Dish roles are the lunch_*/supper_* members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridRole {
    Weekdays,
    Dates,
    Themes,
    LunchSoup,
    LunchStarter,
    LunchVeganMain,
    LunchVegMain,
    LunchMeatMain,
    LunchSides,
    LunchDessert,
    LunchIceCream,
    SupperSoup,
    SupperVeganSpecial,
    SupperSelection,
    SupperSpecial,
    SupperDessert,
    SupperIceCream,
}

impl GridRole {
    pub fn meal(self) -> Option<Meal> {
        match self {
            GridRole::Weekdays | GridRole::Dates | GridRole::Themes => None,
            GridRole::LunchSoup
            | GridRole::LunchStarter
            | GridRole::LunchVeganMain
            | GridRole::LunchVegMain
            | GridRole::LunchMeatMain
            | GridRole::LunchSides
            | GridRole::LunchDessert
            | GridRole::LunchIceCream => Some(Meal::Lunch),
            _ => Some(Meal::Supper),
        }
    }

    /// Rows holding the vegan dish of their meal.
    pub fn is_vegan_row(self) -> bool {
        matches!(self, GridRole::LunchVeganMain | GridRole::SupperVeganSpecial)
    }
}

impl fmt::Display for GridRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GridRole::Weekdays => "weekdays",
            GridRole::Dates => "dates",
            GridRole::Themes => "themes",
            GridRole::LunchSoup => "lunch soup",
            GridRole::LunchStarter => "lunch starter",
            GridRole::LunchVeganMain => "lunch vegan main",
            GridRole::LunchVegMain => "lunch vegetarian main",
            GridRole::LunchMeatMain => "lunch meat main",
            GridRole::LunchSides => "optional sides",
            GridRole::LunchDessert => "lunch dessert",
            GridRole::LunchIceCream => "lunch ice cream",
            GridRole::SupperSoup => "supper soup",
            GridRole::SupperVeganSpecial => "supper vegan special",
            GridRole::SupperSelection => "supper selection",
            GridRole::SupperSpecial => "supper special",
            GridRole::SupperDessert => "supper dessert",
            GridRole::SupperIceCream => "supper ice cream",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dish {
    pub role: GridRole,
    pub title: String,
    pub description: Option<String>,
    pub allergens: AllergenSet,
    pub is_vegan_source: bool,
}

/// One meal of one day: the dishes of every grid row of that meal, in grid order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MealSlot {
    pub meal: Meal,
    pub dishes: Vec<Dish>,
}

impl MealSlot {
    pub fn new(meal: Meal) -> Self {
        Self {
            meal,
            dishes: Vec::new(),
        }
    }

    pub fn with_role(&self, role: GridRole) -> impl Iterator<Item = &Dish> {
        self.dishes.iter().filter(move |d| d.role == role)
    }

    pub fn first(&self, role: GridRole) -> Option<&Dish> {
        self.with_role(role).next()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayMenu {
    pub date: NaiveDate,
    pub weekday: String,
    pub theme: String,
    pub lunch: MealSlot,
    pub supper: MealSlot,
}

impl DayMenu {
    pub fn slot(&self, meal: Meal) -> &MealSlot {
        match meal {
            Meal::Lunch => &self.lunch,
            Meal::Supper => &self.supper,
        }
    }

    /// `DD-MM-YYYY`, the date part of every output file name.
    pub fn file_slug(&self) -> String {
        self.date.format("%d-%m-%Y").to_string()
    }
}

/// The parsed weekly grid. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyMenu {
    days: Vec<DayMenu>,
}

impl WeeklyMenu {
    pub(crate) fn new(days: Vec<DayMenu>) -> Self {
        Self { days }
    }

    pub fn days(&self) -> &[DayMenu] {
        &self.days
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayMenu> {
        self.days.iter().find(|d| d.date == date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedField {
    pub name: String,
    pub text: String,
    pub highlighted: bool,
}

pub type FieldMap = BTreeMap<String, ResolvedField>;

/// A menu line as the allergens composer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKey {
    LunchStarter(usize),
    LunchMain(usize),
    LunchSides,
    LunchDessert,
    LunchIceCream,
    SupperStarter,
    SupperSelection,
    SupperSpecial,
    SupperDessert,
    SupperIceCream,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuLine {
    pub key: LineKey,
    pub title: String,
    pub allergens: AllergenSet,
}

/// Output of the rule engine for one day and one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedMenu {
    pub date: NaiveDate,
    pub variant: Variant,
    pub fields: FieldMap,
    pub lines: Vec<MenuLine>,
}

impl ResolvedMenu {
    pub fn field(&self, name: &str) -> Option<&ResolvedField> {
        self.fields.get(name)
    }

    pub fn line(&self, key: LineKey) -> Option<&MenuLine> {
        self.lines.iter().find(|l| l.key == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Banner,
    Dish,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllergensRow {
    pub section: Variant,
    pub kind: RowKind,
    pub label: String,
    pub ticks: AllergenSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllergensSheet {
    /// `D Month YYYY`
    pub banner: String,
    pub rows: Vec<AllergensRow>,
}

/// Everything derived for one day, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayArtifacts {
    pub date: NaiveDate,
    pub weekday: String,
    pub standard: ResolvedMenu,
    pub vegan: ResolvedMenu,
    pub allergens: AllergensSheet,
}

/// The three rendered documents of a day.
#[derive(Debug, Clone)]
pub struct DayDocuments {
    pub standard: Vec<u8>,
    pub vegan: Vec<u8>,
    pub allergens: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Archive {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Which days of the week to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaySelection {
    One(NaiveDate),
    All,
}

/// A day whose three documents rendered successfully.
#[derive(Debug, Clone)]
pub struct RenderedDay {
    pub artifacts: DayArtifacts,
    pub documents: DayDocuments,
}

#[derive(Debug, Default)]
pub struct TransformResult {
    pub rendered: Vec<RenderedDay>,
    pub failures: Vec<crate::utils::error::DayFailure>,
}

#[derive(Debug, Default)]
pub struct LoadResult {
    /// Paths of the archives written, relative to the output storage.
    pub archives: Vec<String>,
    pub failures: Vec<crate::utils::error::DayFailure>,
}
