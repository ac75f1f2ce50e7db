use chrono::Utc;

use super::html::{Document, Element};
use super::text::{clean_title, truncate_description};
use crate::config::{
    BUILDER_DESCRIPTION_BUDGET, DEFAULT_INPUT_SIZE, RUNTIME_DESCRIPTION_BUDGET,
};
use crate::exercise::{self, Blank, ExerciseRecord};

const CONTENT_CLASS: &str = "exercise-content";
const BLANK_CLASS: &str = "fill-blank";

/// Which consumer the record is for. The runtime record is lighter and uses a
/// shorter description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Runtime,
    Builder,
}

impl ParseMode {
    fn description_budget(self) -> usize {
        match self {
            ParseMode::Runtime => RUNTIME_DESCRIPTION_BUDGET,
            ParseMode::Builder => BUILDER_DESCRIPTION_BUDGET,
        }
    }
}

/// Parse one legacy exercise page. Never fails: missing elements are
/// treated as absent data.
pub fn parse_exercise(html: &str, filename: &str, mode: ParseMode) -> ExerciseRecord {
    let doc = Document::parse(html);

    let title = extract_title(&doc).unwrap_or_else(|| exercise::format_lesson_number(filename));
    let title = clean_title(&title).trim().to_string();
    let title = if title.is_empty() {
        exercise::format_lesson_number(filename)
    } else {
        title
    };

    let container = doc.first_with_class(CONTENT_CLASS);
    let description = container
        .as_ref()
        .map(|c| truncate_description(&c.text(), mode.description_budget()))
        .unwrap_or_default();
    let markers = container
        .as_ref()
        .map(|c| c.descendants_with_class(BLANK_CLASS))
        .unwrap_or_default();

    let mut record = ExerciseRecord {
        id: exercise::exercise_id(filename),
        filename: filename.to_string(),
        title,
        description,
        content: None,
        lesson_number: exercise::lesson_number(filename),
        difficulty: None,
        difficulty_level: None,
        exercise_type: exercise::exercise_type(filename),
        blank_count: markers.len(),
        blanks: None,
        url: exercise::exercise_url(filename),
        created_at: None,
        error: false,
    };

    if mode == ParseMode::Builder {
        let difficulty = exercise::difficulty(filename);
        record.difficulty = Some(difficulty);
        record.difficulty_level = Some(difficulty.level());
        record.content = Some(
            container
                .as_ref()
                .map(|c| c.inner_html().to_string())
                .unwrap_or_default(),
        );
        record.blanks = Some(extract_blanks(&markers));
        record.created_at = Some(Utc::now());
    }

    record
}

/// Page title, else the first `<h1>`; empty text counts as absent.
fn extract_title(doc: &Document) -> Option<String> {
    ["title", "h1"]
        .iter()
        .filter_map(|tag| doc.first(tag))
        .map(|el| el.text())
        .find(|t| !t.trim().is_empty())
}

fn extract_blanks(markers: &[Element<'_>]) -> Vec<Blank> {
    markers
        .iter()
        .enumerate()
        .map(|(index, el)| Blank {
            index,
            answer: el.attr("data-answer").unwrap_or_default().to_string(),
            original: el.attr("data-original").unwrap_or_default().to_string(),
            size: el
                .attr("size")
                .and_then(|s| s.trim().parse().ok())
                .filter(|&s| s > 0)
                .unwrap_or(DEFAULT_INPUT_SIZE),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercise::{Difficulty, ExerciseType};

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
    }

    #[test]
    fn generated_page_runtime() {
        let html = fixture("les12_exercise_every_5th.html");
        let r = parse_exercise(&html, "les12_exercise_every_5th.html", ParseMode::Runtime);
        assert_eq!(r.id, "les12_exercise_every_5th");
        assert_eq!(r.title, "les12");
        assert_eq!(r.lesson_number, 12);
        assert_eq!(r.exercise_type, ExerciseType::Every5th);
        assert_eq!(r.blank_count, 4);
        assert!(r.blanks.is_none());
        assert!(r.content.is_none());
        assert!(r.description.starts_with("De kat zit op ."));
        assert!(r.description.chars().count() <= 153);
        assert!(!r.error);
    }

    #[test]
    fn generated_page_builder() {
        let html = fixture("les12_exercise_every_5th.html");
        let r = parse_exercise(&html, "les12_exercise_every_5th.html", ParseMode::Builder);
        let blanks = r.blanks.as_ref().unwrap();
        assert_eq!(blanks.len(), 4);
        assert_eq!(r.blank_count, 4);
        for (i, b) in blanks.iter().enumerate() {
            assert_eq!(b.index, i);
        }
        assert_eq!(blanks[0].answer, "mat");
        assert_eq!(blanks[0].original, "mat");
        assert_eq!(blanks[0].size, 8);
        assert_eq!(blanks[3].answer, "buitenkansen");
        assert_eq!(blanks[3].size, 12);
        assert_eq!(r.difficulty, Some(Difficulty::Easy));
        assert_eq!(r.difficulty_level, Some(1));
        assert!(r.content.as_ref().unwrap().contains("fill-blank"));
        assert!(r.created_at.is_some());
    }

    #[test]
    fn budgets_differ_by_mode() {
        let body = "woord ".repeat(60);
        let html = format!(
            r#"<html><head><title>T</title></head><body><div class="exercise-content">{}</div></body></html>"#,
            body
        );
        let runtime = parse_exercise(&html, "les1_exercise_every_6th.html", ParseMode::Runtime);
        let builder = parse_exercise(&html, "les1_exercise_every_6th.html", ParseMode::Builder);
        assert!(runtime.description.ends_with("..."));
        assert!(builder.description.ends_with("..."));
        assert!(runtime.description.chars().count() <= 153);
        assert!(builder.description.chars().count() > 153);
        assert!(builder.description.chars().count() <= 203);
    }

    #[test]
    fn no_container_is_not_an_error() {
        let html = "<html><head><title>Only a title</title></head><body><p>text</p></body></html>";
        let r = parse_exercise(html, "les3_exercise_every_7th.html", ParseMode::Builder);
        assert_eq!(r.description, "");
        assert_eq!(r.blank_count, 0);
        assert_eq!(r.blanks.as_deref(), Some(&[][..]));
        assert_eq!(r.title, "Only a title");
        assert_eq!(r.difficulty, Some(Difficulty::Hard));
    }

    #[test]
    fn title_falls_back_to_heading_then_lesson() {
        let with_h1 = "<body><h1>Heading title</h1></body>";
        let r = parse_exercise(with_h1, "les8_exercise_every_6th.html", ParseMode::Runtime);
        assert_eq!(r.title, "Heading title");

        let bare = "<body><p>nothing</p></body>";
        let r = parse_exercise(bare, "les8_exercise_every_6th.html", ParseMode::Runtime);
        assert_eq!(r.title, "Lesson 8");

        let r = parse_exercise("", "odd.html", ParseMode::Runtime);
        assert_eq!(r.title, "odd.html");
        assert_eq!(r.lesson_number, 0);
        assert_eq!(r.exercise_type, ExerciseType::Standard);
    }

    #[test]
    fn garbage_input_degrades() {
        let r = parse_exercise("<<<div class=\"exercise-content\"", "les2_exercise_every_5th.html", ParseMode::Builder);
        assert_eq!(r.blank_count, 0);
        assert_eq!(r.title, "Lesson 2");
    }

    #[test]
    fn blanks_outside_container_ignored() {
        let html = r#"<input class="fill-blank" data-answer="no"><div class="exercise-content">a <input class="fill-blank" data-answer="yes" size="x"></div>"#;
        let r = parse_exercise(html, "les5_exercise_every_5th.html", ParseMode::Builder);
        let blanks = r.blanks.unwrap();
        assert_eq!(blanks.len(), 1);
        assert_eq!(blanks[0].answer, "yes");
        assert_eq!(blanks[0].size, DEFAULT_INPUT_SIZE);
    }
}
