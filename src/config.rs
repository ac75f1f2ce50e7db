pub const LEGACY_DIR: &str = "legacy";
pub const CATALOG_PATH: &str = "assets/data/exercises.json";
pub const DB_PATH: &str = "data/progress.sqlite";
pub const CATALOG_VERSION: &str = "1.0.0";

/// Description length for records parsed at runtime.
pub const RUNTIME_DESCRIPTION_BUDGET: usize = 150;
/// Description length for records written by the catalog builder.
pub const BUILDER_DESCRIPTION_BUDGET: usize = 200;

/// Fraction of the known files a fetched catalog must cover to be trusted.
pub const CATALOG_ACCEPT_RATIO: f64 = 0.8;

pub const SEARCH_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_INPUT_SIZE: u32 = 8;

pub const EXERCISE_SUFFIXES: &[&str] = &[
    "_exercise_every_5th.html",
    "_exercise_every_6th.html",
    "_exercise_every_7th.html",
];

const KNOWN_LESSONS: &[u32] = &[
    12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 32, 33, 34, 35, 36, 37, 38, 39, 40, 41, 42,
];

/// Statically known legacy filenames, lesson-major.
pub fn known_files() -> Vec<String> {
    KNOWN_LESSONS
        .iter()
        .flat_map(|lesson| {
            EXERCISE_SUFFIXES
                .iter()
                .map(move |suffix| format!("les{}{}", lesson, suffix))
        })
        .collect()
}

/// Smallest catalog size accepted for `expected` known files.
pub fn min_accepted(expected: usize) -> usize {
    (expected as f64 * CATALOG_ACCEPT_RATIO).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_files_shape() {
        let files = known_files();
        assert_eq!(files.len(), 69);
        assert_eq!(files[0], "les12_exercise_every_5th.html");
        assert_eq!(files[68], "les42_exercise_every_7th.html");
    }

    #[test]
    fn acceptance_threshold() {
        assert_eq!(min_accepted(69), 55);
        assert_eq!(min_accepted(0), 0);
    }
}
