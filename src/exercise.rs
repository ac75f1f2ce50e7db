use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

static LESSON_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"les(\d+)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExerciseType {
    #[serde(rename = "Every 5th Word")]
    Every5th,
    #[serde(rename = "Every 6th Word")]
    Every6th,
    #[serde(rename = "Every 7th Word")]
    Every7th,
    #[serde(rename = "Standard")]
    Standard,
}

impl ExerciseType {
    pub fn label(self) -> &'static str {
        match self {
            ExerciseType::Every5th => "Every 5th Word",
            ExerciseType::Every6th => "Every 6th Word",
            ExerciseType::Every7th => "Every 7th Word",
            ExerciseType::Standard => "Standard",
        }
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn level(self) -> u8 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

}

/// One fill-in-the-blank marker, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blank {
    pub index: usize,
    pub answer: String,
    pub original: String,
    pub size: u32,
}

/// One legacy exercise page. Builder-only fields are absent on records
/// parsed at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRecord {
    pub id: String,
    pub filename: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub lesson_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_level: Option<u8>,
    pub exercise_type: ExerciseType,
    #[serde(default)]
    pub blank_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blanks: Option<Vec<Blank>>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

impl ExerciseRecord {
    /// Placeholder for a page that could not be fetched or parsed.
    /// Filename-derived fields stay accurate.
    pub fn unavailable(filename: &str) -> Self {
        ExerciseRecord {
            id: exercise_id(filename),
            filename: filename.to_string(),
            title: format_lesson_number(filename),
            description: "Exercise content not available".to_string(),
            content: None,
            lesson_number: lesson_number(filename),
            difficulty: None,
            difficulty_level: None,
            exercise_type: exercise_type(filename),
            blank_count: 0,
            blanks: None,
            url: exercise_url(filename),
            created_at: None,
            error: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMetadata {
    pub total_exercises: usize,
    pub generated_at: DateTime<Utc>,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub metadata: CatalogMetadata,
    #[serde(default)]
    pub exercises: Vec<ExerciseRecord>,
}

pub fn exercise_id(filename: &str) -> String {
    filename.replacen(".html", "", 1)
}

pub fn exercise_url(filename: &str) -> String {
    format!("legacy/{}", filename)
}

pub fn lesson_number(filename: &str) -> u32 {
    LESSON_RE
        .captures(filename)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0)
}

pub fn exercise_type(filename: &str) -> ExerciseType {
    if filename.contains("every_5th") {
        ExerciseType::Every5th
    } else if filename.contains("every_6th") {
        ExerciseType::Every6th
    } else if filename.contains("every_7th") {
        ExerciseType::Every7th
    } else {
        ExerciseType::Standard
    }
}

/// Medium unless the filename names the 5th or 7th word variant.
pub fn difficulty(filename: &str) -> Difficulty {
    match exercise_type(filename) {
        ExerciseType::Every5th => Difficulty::Easy,
        ExerciseType::Every7th => Difficulty::Hard,
        _ => Difficulty::Medium,
    }
}

/// "Lesson N" from the `les<N>` token, else the filename unchanged.
pub fn format_lesson_number(filename: &str) -> String {
    match LESSON_RE.captures(filename) {
        Some(caps) => format!("Lesson {}", &caps[1]),
        None => filename.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_fields() {
        let f = "les14_exercise_every_5th.html";
        assert_eq!(exercise_id(f), "les14_exercise_every_5th");
        assert_eq!(lesson_number(f), 14);
        assert_eq!(exercise_type(f), ExerciseType::Every5th);
        assert_eq!(difficulty(f), Difficulty::Easy);
        assert_eq!(exercise_url(f), "legacy/les14_exercise_every_5th.html");
    }

    #[test]
    fn every_variant() {
        for lesson in [1, 12, 42, 107] {
            let five = format!("les{}_exercise_every_5th.html", lesson);
            let six = format!("les{}_exercise_every_6th.html", lesson);
            let seven = format!("les{}_exercise_every_7th.html", lesson);
            assert_eq!(lesson_number(&five), lesson);
            assert_eq!(exercise_type(&five).label(), "Every 5th Word");
            assert_eq!(exercise_type(&six).label(), "Every 6th Word");
            assert_eq!(exercise_type(&seven).label(), "Every 7th Word");
            assert_eq!(difficulty(&six).level(), 2);
            assert_eq!(difficulty(&seven).level(), 3);
        }
    }

    #[test]
    fn unmatched_filename() {
        assert_eq!(lesson_number("unknown.html"), 0);
        assert_eq!(exercise_type("unknown.html"), ExerciseType::Standard);
        assert_eq!(difficulty("unknown.html"), Difficulty::Medium);
        assert_eq!(format_lesson_number("unknown.html"), "unknown.html");
    }

    #[test]
    fn lesson_label() {
        assert_eq!(format_lesson_number("les14_exercise_every_6th.html"), "Lesson 14");
    }

    #[test]
    fn unavailable_keeps_filename_fields() {
        let r = ExerciseRecord::unavailable("les20_exercise_every_7th.html");
        assert!(r.error);
        assert_eq!(r.title, "Lesson 20");
        assert_eq!(r.lesson_number, 20);
        assert_eq!(r.exercise_type, ExerciseType::Every7th);
        assert_eq!(r.blank_count, 0);
    }

    #[test]
    fn record_json_shape() {
        let r = ExerciseRecord::unavailable("les20_exercise_every_7th.html");
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["exerciseType"], "Every 7th Word");
        assert_eq!(v["lessonNumber"], 20);
        assert_eq!(v["blankCount"], 0);
        assert_eq!(v["error"], true);
        assert!(v.get("blanks").is_none());
    }
}
