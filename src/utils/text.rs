//! Text helpers shared by the grid parser and the rule engine.

use crate::domain::model::{Allergen, AllergenSet};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static TRAILING_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s*\((ve|v)\)\s*$").unwrap());
static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());
static WIDE_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());
static SIDES_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r",|/|\t+|\s{2,}|\n+").unwrap());
static ALLERGEN_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:milk|eggs?|soya|soy|gluten|cereals?|nuts|peanuts?|sesame|mustards?|celery|sulphites?|sulphur|fish|crustaceans?|molluscs?|lupin)\b",
    )
    .unwrap()
});
static ALLERGENS_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:allergens?|contains)\s*:?\s*").unwrap());
static DATE_IN_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{2,4}").unwrap());
static VEGAN_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\(ve\)").unwrap());
static VARIANT_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*(?:/|\n|;|\||\bor\b)\s*").unwrap());

/// Normalises cell text: NBSP and space runs collapse, lines trimmed, blank edges dropped.
pub fn clean_text(s: &str) -> String {
    let s = s.replace('\r', "").replace('\u{a0}', " ");
    let s = SPACE_RUN.replace_all(&s, " ");
    let lines: Vec<&str> = s.split('\n').map(str::trim).collect();
    let start = lines.iter().position(|l| !l.is_empty());
    let end = lines.iter().rposition(|l| !l.is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].join("\n"),
        _ => String::new(),
    }
}

/// Collapses all whitespace (including newlines) to single spaces.
pub fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes a trailing `(V)` / `(Ve)` tag.
pub fn strip_tag(s: &str) -> String {
    TRAILING_TAG.replace(s, "").trim().to_string()
}

/// Byte offset just past the first `(Ve)` tag, in any case.
pub fn vegan_tag_end(s: &str) -> Option<usize> {
    VEGAN_TAG.find(s).map(|m| m.end())
}

/// Replaces any trailing diet tag with `tag`.
pub fn with_tag(s: &str, tag: &str) -> String {
    let base = strip_tag(s);
    if base.is_empty() {
        return String::new();
    }
    format!("{} {}", base, tag)
}

/// Appends `tag` unless the title already ends with it.
pub fn ensure_tag(s: &str, tag: &str) -> String {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.to_lowercase().ends_with(&tag.to_lowercase()) {
        trimmed.to_string()
    } else {
        with_tag(trimmed, tag)
    }
}

/// First letter upper-cased, the rest lower-cased, then proper nouns restored.
pub fn sentence_case(s: &str, proper_nouns: &[String]) -> String {
    let s = s.trim();
    let Some(first) = s.char_indices().find(|(_, c)| c.is_alphabetic()) else {
        return s.to_string();
    };
    let (idx, ch) = first;
    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..idx]);
    out.extend(ch.to_uppercase());
    out.push_str(&s[idx + ch.len_utf8()..].to_lowercase());

    for noun in proper_nouns {
        let noun = noun.trim();
        if noun.is_empty() {
            continue;
        }
        let pattern = format!(r"(?i)\b{}\b", regex::escape(noun));
        if let Ok(re) = Regex::new(&pattern) {
            out = re.replace_all(&out, noun).into_owned();
        }
    }
    out
}

/// "Chef's choice soup" in any spelling or apostrophe.
pub fn is_chefs_choice_soup(title: &str) -> bool {
    let s = title.to_lowercase().replace('\u{2019}', "'");
    s.contains("chef") && s.contains("choice") && s.contains("soup")
}

/// Turns a messy "Optional sides" cell into "A, B, C" without duplicates.
pub fn normalise_sides(text: &str) -> String {
    let raw = text.replace('\r', "\n");
    let mut seen = Vec::<String>::new();
    let mut out = Vec::new();
    for part in SIDES_SPLIT.split(&raw) {
        let item = part
            .trim()
            .trim_matches(|c: char| c == ' ' || c == '-' || c == '\u{2013}' || c == '\u{2022}')
            .trim_end_matches('.')
            .trim();
        if item.is_empty() {
            continue;
        }
        let key = item.to_lowercase();
        if !seen.contains(&key) {
            seen.push(key);
            out.push(item.to_string());
        }
    }
    out.join(", ")
}

/// Splits an allergen list ("Milk, Eggs / Gluten") into canonical columns.
/// Unknown tokens are reported back so callers can log them.
pub fn parse_allergen_list(text: &str) -> (AllergenSet, Vec<String>) {
    let body = ALLERGENS_PREFIX.replace(text, "");
    let mut set = AllergenSet::new();
    let mut unknown = Vec::new();
    for token in body.split([',', '/', '\n']) {
        let token = token.trim().trim_end_matches('.').trim();
        if token.is_empty() {
            continue;
        }
        let token = token.strip_prefix("and ").unwrap_or(token);
        match Allergen::from_token(token) {
            Some(a) => {
                set.insert(a);
            }
            None => unknown.push(token.to_string()),
        }
    }
    (set, unknown)
}

fn is_allergen_list(text: &str) -> bool {
    let (set, unknown) = parse_allergen_list(text);
    !set.is_empty() && unknown.is_empty()
}

fn starts_allergen_line(line: &str) -> bool {
    if ALLERGENS_PREFIX.is_match(line) {
        return true;
    }
    let first = line.split([',', '/']).next().unwrap_or("");
    Allergen::from_token(first).is_some()
}

/// A weekly cell split into its parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellParts {
    pub title: String,
    pub description: String,
    pub allergens: String,
}

/// Splits a weekly cell into title, description and allergen tail.
pub fn split_cell(cell_text: &str) -> CellParts {
    let cleaned = clean_text(cell_text);
    let expanded = WIDE_GAP.replace_all(&cleaned, "\n");
    let lines: Vec<&str> = expanded
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return CellParts::default();
    }

    let mut body: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
    let mut allergens = String::new();

    if ALLERGENS_PREFIX.is_match(lines[0]) || is_allergen_list(lines[0]) {
        allergens = lines.join(", ");
        body.clear();
    } else if let Some(pos) = lines.iter().skip(1).position(|l| starts_allergen_line(l)) {
        let pos = pos + 1;
        allergens = lines[pos..].join(", ");
        body.truncate(pos);
    } else if let Some(m) = ALLERGEN_WORD.find_iter(lines[0]).find(|m| m.start() > 0) {
        let tail = &lines[0][m.start()..];
        if is_allergen_list(tail) {
            allergens = tail.to_string();
            body[0] = lines[0][..m.start()].trim().to_string();
        }
    }

    let title = body.first().cloned().unwrap_or_default();
    let description = body.iter().skip(1).cloned().collect::<Vec<_>>().join(" ");
    let allergens = ALLERGENS_PREFIX.replace(&allergens, "");
    CellParts {
        title,
        description,
        allergens: allergens.trim_matches([' ', ',']).to_string(),
    }
}

/// Parses `dd/mm/yyyy`, `dd/mm/yy` or `yyyy-mm-dd`, also when embedded in other text.
pub fn parse_grid_date(text: &str) -> Option<NaiveDate> {
    let candidate = DATE_IN_TEXT.find(text)?.as_str();
    let fmt = if candidate.contains('-') {
        "%Y-%m-%d"
    } else {
        match candidate.rsplit('/').next().map(str::len) {
            Some(4) => "%d/%m/%Y",
            Some(2) => "%d/%m/%y",
            _ => return None,
        }
    };
    NaiveDate::parse_from_str(candidate, fmt).ok()
}

/// `Weekday – dd/mm/yyyy`, the header line of both menus.
pub fn date_label(date: NaiveDate, weekday: &str) -> String {
    format!("{} \u{2013} {}", weekday, date.format("%d/%m/%Y"))
}

/// `D Month YYYY`, the allergens sheet banner.
pub fn month_banner(date: NaiveDate) -> String {
    date.format("%-d %B %Y").to_string()
}

/// Picks the vegan alternative out of a combined "A / B (Ve)" style cell.
pub fn pick_vegan_variant(title: &str, description: &str) -> String {
    let combined = format!("{}\n{}", title, description);
    VARIANT_SPLIT
        .split(combined.trim())
        .map(str::trim)
        .find(|part| {
            let lower = part.to_lowercase();
            lower.contains("(ve)") || lower.contains("vegan")
        })
        .map(|part| with_tag(part, "(Ve)"))
        .unwrap_or_else(|| with_tag(title, "(Ve)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_handles_nbsp_and_blank_edges() {
        assert_eq!(clean_text("\n  Apple\u{a0}\u{a0}crumble  \r\n\n"), "Apple crumble");
        assert_eq!(clean_text("a\n  b  \n"), "a\nb");
        assert_eq!(clean_text("   "), "");
    }

    #[test]
    fn test_sentence_case() {
        assert_eq!(sentence_case("apple crumble", &[]), "Apple crumble");
        assert_eq!(sentence_case("STICKY TOFFEE PUDDING", &[]), "Sticky toffee pudding");
        let nouns = vec!["Bakewell".to_string(), "Eton".to_string()];
        assert_eq!(sentence_case("CHERRY BAKEWELL TART", &nouns), "Cherry Bakewell tart");
        assert_eq!(sentence_case("eton mess", &nouns), "Eton mess");
        assert_eq!(sentence_case("  ", &nouns), "");
    }

    #[test]
    fn test_tags() {
        assert_eq!(strip_tag("Lentil dahl (Ve)"), "Lentil dahl");
        assert_eq!(strip_tag("Quiche (v) "), "Quiche");
        assert_eq!(with_tag("Lentil dahl (V)", "(Ve)"), "Lentil dahl (Ve)");
        assert_eq!(ensure_tag("Chickpea pie (Ve)", "(Ve)"), "Chickpea pie (Ve)");
        assert_eq!(ensure_tag("Chickpea pie", "(Ve)"), "Chickpea pie (Ve)");
        assert_eq!(ensure_tag("", "(Ve)"), "");
    }

    #[test]
    fn test_chefs_choice_detection() {
        assert!(is_chefs_choice_soup("Chef\u{2019}s choice soup (V)"));
        assert!(is_chefs_choice_soup("CHEF'S CHOICE SOUP"));
        assert!(!is_chefs_choice_soup("Tomato soup"));
    }

    #[test]
    fn test_normalise_sides() {
        assert_eq!(
            normalise_sides("Peas, carrots / Mash\n- peas.\nGravy"),
            "Peas, carrots, Mash, Gravy"
        );
        assert_eq!(normalise_sides(""), "");
    }

    #[test]
    fn test_parse_allergen_list() {
        let (set, unknown) = parse_allergen_list("Allergens: Milk, Egg / Sulphites, spice");
        assert!(set.contains(&Allergen::Milk));
        assert!(set.contains(&Allergen::Eggs));
        assert!(set.contains(&Allergen::Sulphur));
        assert_eq!(unknown, vec!["spice".to_string()]);
    }

    #[test]
    fn test_split_cell_multiline() {
        let parts = split_cell("Beef stew\nSlow cooked with root vegetables\nCelery, Gluten");
        assert_eq!(parts.title, "Beef stew");
        assert_eq!(parts.description, "Slow cooked with root vegetables");
        assert_eq!(parts.allergens, "Celery, Gluten");
    }

    #[test]
    fn test_split_cell_keeps_allergen_words_in_titles() {
        let parts = split_cell("Egg fried rice\nSoya, Egg");
        assert_eq!(parts.title, "Egg fried rice");
        assert_eq!(parts.allergens, "Soya, Egg");

        let parts = split_cell("Beef and egg pie");
        assert_eq!(parts.title, "Beef and egg pie");
        assert_eq!(parts.allergens, "");
    }

    #[test]
    fn test_split_cell_allergens_only() {
        let parts = split_cell("Milk, Soya");
        assert_eq!(parts.title, "");
        assert_eq!(parts.allergens, "Milk, Soya");

        let parts = split_cell("Sorbet\nAllergens: Sulphites");
        assert_eq!(parts.title, "Sorbet");
        assert_eq!(parts.allergens, "Sulphites");
    }

    #[test]
    fn test_split_cell_same_line_allergens() {
        let parts = split_cell("Apple crumble Gluten, Milk");
        assert_eq!(parts.title, "Apple crumble");
        assert_eq!(parts.allergens, "Gluten, Milk");
    }

    #[test]
    fn test_parse_grid_date() {
        let expected = NaiveDate::from_ymd_opt(2025, 9, 18).unwrap();
        assert_eq!(parse_grid_date("18/09/2025"), Some(expected));
        assert_eq!(parse_grid_date("2025-09-18"), Some(expected));
        assert_eq!(parse_grid_date("Thu 18/09/25"), Some(expected));
        assert_eq!(parse_grid_date("next Thursday"), None);
    }

    #[test]
    fn test_date_labels() {
        let date = NaiveDate::from_ymd_opt(2025, 9, 8).unwrap();
        assert_eq!(month_banner(date), "8 September 2025");
        assert_eq!(date_label(date, "Monday"), "Monday \u{2013} 08/09/2025");
    }

    #[test]
    fn test_pick_vegan_variant() {
        assert_eq!(
            pick_vegan_variant("Fish pie / Lentil cottage pie (Ve)", ""),
            "Lentil cottage pie (Ve)"
        );
        assert_eq!(pick_vegan_variant("Fish pie", "or vegan bean chilli"), "vegan bean chilli (Ve)");
        assert_eq!(pick_vegan_variant("Fish pie", ""), "Fish pie (Ve)");
    }
}
