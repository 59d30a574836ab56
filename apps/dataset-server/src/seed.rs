//! Synthetic `items` rows for the in-memory dataset.
//!
//! Columns: `name`, `version` (`major.minor.patch`), `created_at` (ISO 8601,
//! within the current decade), `description`, `country` (1..=250),
//! `count` (1..=1000) and `parent` (1..=100, null for roughly 30% of rows).

use chrono::{Datelike, Duration, NaiveDate, Utc};
use dataset_sdk::Record;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;

const FIRST_NAMES: &[&str] = &[
    "Alice", "Boris", "Carmen", "Dmitri", "Elena", "Felix", "Greta", "Hugo", "Irina", "Jonas",
    "Katya", "Liam", "Marta", "Nikolai", "Olga", "Pavel", "Quinn", "Rosa", "Sergei", "Tamara",
    "Ulrich", "Vera", "Walter", "Xenia", "Yuri", "Zoe",
];

const WORDS: &[&str] = &[
    "amber", "bright", "cable", "delta", "engine", "forest", "garden", "harbor", "island",
    "jacket", "kernel", "ladder", "market", "needle", "orbit", "pocket", "quarry", "river",
    "signal", "timber", "update", "valley", "window", "yellow", "zenith",
];

pub fn generate_records<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<Record> {
    let decade_start = decade_start();
    let span_secs = (Utc::now().naive_utc() - decade_start).num_seconds().max(1);
    (1..=count)
        .map(|id| {
            let created_at = decade_start + Duration::seconds(rng.gen_range(0..span_secs));
            let parent = if rng.gen::<f64>() > 0.3 {
                Value::from(rng.gen_range(1..=100_i64))
            } else {
                Value::Null
            };
            Record::new(id as i64)
                .with_field("name", pick(FIRST_NAMES, rng))
                .with_field(
                    "version",
                    format!(
                        "{}.{}.{}",
                        rng.gen_range(1..=20),
                        rng.gen_range(0..=9),
                        rng.gen_range(0..=9)
                    ),
                )
                .with_field(
                    "created_at",
                    created_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
                )
                .with_field("description", sentence(rng))
                .with_field("country", rng.gen_range(1..=250_i64))
                .with_field("count", rng.gen_range(1..=1000_i64))
                .with_field("parent", parent)
        })
        .collect()
}

fn decade_start() -> chrono::NaiveDateTime {
    let year = Utc::now().year() / 10 * 10;
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

fn pick<R: Rng + ?Sized>(options: &[&str], rng: &mut R) -> String {
    options.choose(rng).copied().unwrap_or_default().to_string()
}

fn sentence<R: Rng + ?Sized>(rng: &mut R) -> String {
    let len = rng.gen_range(4..=9);
    let mut words: Vec<String> = (0..len).map(|_| pick(WORDS, rng)).collect();
    if let Some(first) = words.first_mut() {
        let mut chars = first.chars();
        if let Some(c) = chars.next() {
            *first = c.to_uppercase().chain(chars).collect();
        }
    }
    format!("{}.", words.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn rows_have_sequential_ids_and_bounded_columns() {
        let mut rng = StdRng::seed_from_u64(7);
        let rows = generate_records(500, &mut rng);
        assert_eq!(rows.len(), 500);
        for (index, row) in rows.iter().enumerate() {
            assert_eq!(row.id, index as i64 + 1);
            let country = row.fields["country"].as_i64().unwrap();
            assert!((1..=250).contains(&country));
            let count = row.fields["count"].as_i64().unwrap();
            assert!((1..=1000).contains(&count));
            let version = row.fields["version"].as_str().unwrap();
            assert_eq!(version.split('.').count(), 3);
            assert!(row.fields["description"].as_str().unwrap().ends_with('.'));
        }
    }

    #[test]
    fn some_parents_are_null() {
        let mut rng = StdRng::seed_from_u64(11);
        let rows = generate_records(1000, &mut rng);
        let nulls = rows.iter().filter(|row| row.fields["parent"].is_null()).count();
        assert!(nulls > 150 && nulls < 450, "nulls = {nulls}");
    }
}
