use std::cmp::Ordering;

use clap::ValueEnum;

use crate::exercise::ExerciseRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortBy {
    Lesson,
    Title,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub search: Option<String>,
    pub sort_by: Option<SortBy>,
}

impl Filters {
    /// Filters for raw user input: surrounding whitespace is dropped and a
    /// blank term means no search.
    pub fn from_input(search: Option<&str>, sort_by: Option<SortBy>) -> Self {
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Filters { search, sort_by }
    }

    /// The search term if it is non-empty.
    pub fn active_search(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }
}

/// Case-insensitive order with a case-sensitive tiebreak, so equal-ignoring-case
/// titles still sort deterministically.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

pub fn matches(exercise: &ExerciseRecord, term_lower: &str) -> bool {
    exercise.title.to_lowercase().contains(term_lower)
        || exercise.description.to_lowercase().contains(term_lower)
        || exercise.exercise_type.label().to_lowercase().contains(term_lower)
}

/// Filter and sort a copy of `all`; catalog order is kept when no sort is
/// requested.
pub fn apply(all: &[ExerciseRecord], filters: &Filters) -> Vec<ExerciseRecord> {
    let mut out: Vec<ExerciseRecord> = match filters.active_search() {
        Some(term) => {
            let term = term.to_lowercase();
            all.iter().filter(|e| matches(e, &term)).cloned().collect()
        }
        None => all.to_vec(),
    };

    match filters.sort_by {
        Some(SortBy::Lesson) => out.sort_by_key(|e| e.lesson_number),
        Some(SortBy::Title) => out.sort_by(|a, b| compare_titles(&a.title, &b.title)),
        None => {}
    }
    out
}
