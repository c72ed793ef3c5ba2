//! Default names for history tables and their foreign key columns.
//!
//! A table `projects` keyed by `id` gets its snapshots in `project_histories`,
//! referencing the owner through `project_id`.

const IRREGULAR: &[(&str, &str)] = &[
    ("people", "person"),
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("teeth", "tooth"),
    ("feet", "foot"),
    ("oxen", "ox"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("vertices", "vertex"),
    ("analyses", "analysis"),
    ("statuses", "status"),
    ("aliases", "alias"),
    ("buses", "bus"),
    ("viruses", "virus"),
    ("campuses", "campus"),
    ("bonuses", "bonus"),
    ("censuses", "census"),
    ("syllabuses", "syllabus"),
];

const UNCOUNTABLE: &[&str] = &[
    "data",
    "equipment",
    "information",
    "metadata",
    "news",
    "series",
    "sheep",
    "species",
    "fish",
];

/// Singular form of a table name.
///
/// Only the last `_`-separated word is inflected, so `order_items` becomes `order_item`.
pub fn singularize(table: &str) -> String {
    let (prefix, word) = match table.rfind('_') {
        Some(pos) => table.split_at(pos + 1),
        None => ("", table),
    };
    format!("{prefix}{}", singularize_word(word))
}

fn singularize_word(word: &str) -> String {
    let lower = word.to_ascii_lowercase();

    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((_, singular)) = IRREGULAR.iter().find(|(plural, _)| *plural == lower) {
        return (*singular).to_string();
    }

    let strip = |suffix_len: usize, replacement: &str| {
        format!("{}{replacement}", &word[..word.len() - suffix_len])
    };

    if lower.ends_with("ies") && lower.len() > 3 {
        strip(3, "y")
    } else if lower.ends_with("sses")
        || lower.ends_with("ches")
        || lower.ends_with("shes")
        || lower.ends_with("xes")
        || lower.ends_with("zzes")
    {
        strip(2, "")
    } else if lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") {
        word.to_string()
    } else if lower.ends_with('s') && lower.len() > 1 {
        strip(1, "")
    } else {
        word.to_string()
    }
}

/// Default history table: singular table name plus `_histories`
pub fn default_history_table(table: &str) -> String {
    format!("{}_histories", singularize(table))
}

/// Default foreign key column: singular table name, `_`, identifier field name
pub fn default_history_foreign_key(table: &str, key: &str) -> String {
    format!("{}_{key}", singularize(table))
}
