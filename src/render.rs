//! HTML fragments for the exercise grid.

use std::fmt::Write;

use crate::db::ProgressRecord;
use crate::exercise::{format_lesson_number, ExerciseRecord};
use crate::parser::html::escape;
use crate::parser::text::{format_date, highlight_search_term};

pub fn loading_state() -> String {
    r#"<div class="loading">
    <div class="loading-spinner"></div>
    <p>Loading exercises...</p>
</div>"#
        .to_string()
}

pub fn empty_state_message(search: Option<&str>) -> String {
    match search {
        Some(term) => format!(
            "No exercises found for \"{}\". Try a different search term or check your spelling.",
            term
        ),
        None => "No exercises are currently available. Please check back later.".to_string(),
    }
}

pub fn empty_state(message: &str) -> String {
    format!(
        r#"<div class="empty-state">
    <h3>No exercises found</h3>
    <p>{}</p>
</div>"#,
        escape(message)
    )
}

pub fn error_state() -> String {
    r#"<div class="empty-state empty-state--error">
    <h3>Error Loading Exercises</h3>
    <p>There was a problem loading the exercises. Please try refreshing the page.</p>
    <button class="btn btn-primary" data-action="retry">Refresh Page</button>
</div>"#
        .to_string()
}

pub fn count_text(shown: usize, total: usize, searching: bool) -> String {
    if searching {
        format!("Showing {} of {} exercises", shown, total)
    } else {
        format!("{} exercises available", shown)
    }
}

pub fn announcement(shown: usize) -> String {
    format!("{} exercises loaded", shown)
}

pub fn card(exercise: &ExerciseRecord, progress: Option<&ProgressRecord>, search: Option<&str>) -> String {
    let term = search.unwrap_or("");
    let completion = progress.map_or(0, |p| p.completion_percentage);
    let class = if exercise.error {
        "exercise-card exercise-card--unavailable"
    } else {
        "exercise-card"
    };

    let mut html = String::new();
    let _ = writeln!(
        html,
        r#"<div class="{}" data-exercise-id="{}" data-url="{}" role="button" tabindex="0" aria-label="{} - {}">"#,
        class,
        escape(&exercise.id),
        escape(&exercise.url),
        escape(&exercise.title),
        exercise.exercise_type
    );
    let _ = writeln!(
        html,
        r#"  <div class="exercise-card-header"><h3 class="exercise-title">{}</h3></div>"#,
        highlight_search_term(&exercise.title, term)
    );
    let _ = writeln!(
        html,
        r#"  <div class="exercise-meta"><span class="exercise-type">{}</span><span class="lesson-number">{}</span></div>"#,
        exercise.exercise_type,
        escape(&format_lesson_number(&exercise.filename))
    );
    let _ = writeln!(
        html,
        r#"  <p class="exercise-description">{}</p>"#,
        highlight_search_term(&exercise.description, term)
    );

    html.push_str(r#"  <div class="exercise-stats">"#);
    let _ = write!(
        html,
        r#"<span class="exercise-blanks">{} fill-in-the-blanks</span>"#,
        exercise.blank_count
    );
    if completion > 0 {
        let _ = write!(
            html,
            r#"<span class="exercise-progress">{}% complete</span>"#,
            completion
        );
    }
    html.push_str("</div>\n");

    if let Some(p) = progress.filter(|p| p.open_count > 0) {
        let last = p
            .last_opened
            .map(|t| format_date(&t.to_rfc3339()))
            .unwrap_or_else(|| "Unknown".to_string());
        let _ = writeln!(
            html,
            r#"  <p class="exercise-opened">Opened {} times · last {}</p>"#,
            p.open_count, last
        );
    }

    if completion > 0 {
        let _ = writeln!(
            html,
            r#"  <div class="progress-bar"><div class="progress-fill" style="width: {}%"></div></div>"#,
            completion
        );
    }
    html.push_str("</div>\n");
    html
}

/// The whole grid: cards, or the empty state when there is nothing to show.
pub fn grid<P>(exercises: &[ExerciseRecord], search: Option<&str>, progress: P) -> String
where
    P: Fn(&str) -> Option<ProgressRecord>,
{
    if exercises.is_empty() {
        return empty_state(&empty_state_message(search));
    }
    exercises
        .iter()
        .map(|e| card(e, progress(&e.id).as_ref(), search))
        .collect()
}
