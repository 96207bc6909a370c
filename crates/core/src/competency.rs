// crates/core/src/competency.rs

//! Competency name canonicalisation.

use std::collections::BTreeMap;

/// Known spellings of the standard competencies.
const ALIASES: &[(&str, &str)] = &[
    ("technical_skills", "Technical Skills"),
    ("technical_excellence", "Technical Skills"),
    ("problem_solving", "Problem Solving"),
    ("quality_focus", "Quality Focus"),
    ("quality", "Quality Focus"),
    ("time_management", "Time Management"),
    ("reliability", "Time Management"),
    ("teamwork", "Teamwork"),
    ("leadership", "Leadership"),
    ("initiative", "Leadership"),
    ("adaptability", "Adaptability"),
    ("communication", "Communication"),
];

/// Map a competency key to its display name.
///
/// Known aliases map to their canonical name; anything else is title-cased
/// on underscores, hyphens and whitespace.
pub fn canonicalize(key: &str) -> String {
    let trimmed = key.trim();
    let lower = trimmed.to_lowercase();
    if let Some((_, canonical)) = ALIASES.iter().find(|(alias, _)| *alias == lower) {
        return canonical.to_string();
    }

    let title = lower
        .replace(['_', '-'], " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if title.is_empty() {
        trimmed.to_string()
    } else {
        title
    }
}

/// Canonicalise every key. Duplicates are merged by their mean, rounded to
/// the nearest whole rating.
pub fn normalize(ratings: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let mut merged: BTreeMap<String, (f64, u32)> = BTreeMap::new();
    for (key, rating) in ratings {
        let entry = merged.entry(canonicalize(key)).or_insert((0.0, 0));
        entry.0 += rating;
        entry.1 += 1;
    }
    merged
        .into_iter()
        .map(|(key, (total, count))| match count {
            1 => (key, total),
            _ => (key, (total / f64::from(count)).round()),
        })
        .collect()
}
