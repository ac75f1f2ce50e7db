use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{error, info};

use crate::config::{CATALOG_VERSION, EXERCISE_SUFFIXES};
use crate::exercise::{Catalog, CatalogMetadata, Difficulty, ExerciseRecord};
use crate::parser::{parse_exercise, ParseMode};

/// Outcome of one builder run.
pub struct BuildReport {
    pub catalog: Catalog,
    pub ok: usize,
    pub errors: usize,
}

#[derive(Debug, Default, PartialEq)]
pub struct CatalogStats {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
    pub by_lesson: BTreeMap<u32, usize>,
}

impl CatalogStats {
    pub fn collect(exercises: &[ExerciseRecord]) -> Self {
        let mut stats = CatalogStats::default();
        for e in exercises {
            match e.difficulty {
                Some(Difficulty::Easy) => stats.easy += 1,
                Some(Difficulty::Medium) => stats.medium += 1,
                Some(Difficulty::Hard) => stats.hard += 1,
                None => {}
            }
            *stats.by_lesson.entry(e.lesson_number).or_default() += 1;
        }
        stats
    }

    pub fn print(&self) {
        println!("\nStatistics:");
        println!("Easy exercises:   {}", self.easy);
        println!("Medium exercises: {}", self.medium);
        println!("Hard exercises:   {}", self.hard);
        println!("Lessons covered:  {}", self.by_lesson.len());
        for (lesson, count) in &self.by_lesson {
            println!("  Lesson {:>3}: {}", lesson, count);
        }
    }
}

/// Exercise files in `dir`, sorted by name.
pub fn discover(dir: &Path) -> Result<Vec<String>> {
    let mut files: Vec<String> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read legacy directory {:?}", dir))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| EXERCISE_SUFFIXES.iter().any(|s| name.ends_with(s)))
        .collect();
    files.sort();
    Ok(files)
}

/// Parse every file in parallel. A file that cannot be read is logged and
/// counted, never fatal.
pub fn assemble(dir: &Path, files: &[String]) -> BuildReport {
    let pb = ProgressBar::new(files.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let results: Vec<_> = files
        .par_iter()
        .map(|filename| {
            let out = fs::read_to_string(dir.join(filename))
                .map(|html| parse_exercise(&html, filename, ParseMode::Builder))
                .map_err(|e| (filename.as_str(), e));
            pb.inc(1);
            out
        })
        .collect();
    pb.finish_and_clear();

    let mut exercises = Vec::with_capacity(results.len());
    let mut errors = 0usize;
    for result in results {
        match result {
            Ok(record) => {
                info!("Processed {} ({} blanks)", record.filename, record.blank_count);
                exercises.push(record);
            }
            Err((filename, e)) => {
                error!("Error processing {}: {}", filename, e);
                errors += 1;
            }
        }
    }

    sort_exercises(&mut exercises);
    let ok = exercises.len();

    BuildReport {
        catalog: Catalog {
            metadata: CatalogMetadata {
                total_exercises: exercises.len(),
                generated_at: Utc::now(),
                version: CATALOG_VERSION.to_string(),
            },
            exercises,
        },
        ok,
        errors,
    }
}

/// Ascending by lesson, then difficulty level. Stable, so equal keys keep
/// filename order.
pub fn sort_exercises(exercises: &mut [ExerciseRecord]) {
    exercises.sort_by_key(|e| (e.lesson_number, e.difficulty_level.unwrap_or(2)));
}

pub fn write_catalog(path: &Path, catalog: &Catalog) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {:?}", parent))?;
    }
    let json = serde_json::to_string_pretty(catalog)?;
    fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

/// Discover, parse, sort and write. Returns `None` when the directory holds
/// no exercise files; nothing is written in that case.
pub fn run(legacy_dir: &Path, output: &Path) -> Result<Option<BuildReport>> {
    info!("Extracting exercise data from {:?}", legacy_dir);
    let files = match discover(legacy_dir) {
        Ok(files) => files,
        Err(e) => {
            error!("{:#}", e);
            Vec::new()
        }
    };
    info!("Found {} exercise files", files.len());

    if files.is_empty() {
        error!("No exercise files found in {:?}", legacy_dir);
        return Ok(None);
    }

    let report = assemble(legacy_dir, &files);
    write_catalog(output, &report.catalog)?;
    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>T - Fill-in-the-blank Exercise (Version 2)</title></head>
<body><div class="exercise-content">a <input class="fill-blank" data-answer="b" data-original="B" size="8"> c</div></body></html>"#;

    fn write_pages(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), PAGE).unwrap();
        }
    }

    #[test]
    fn discover_filters_and_sorts() {
        let tmp = tempfile::tempdir().unwrap();
        write_pages(
            tmp.path(),
            &[
                "les13_exercise_every_6th.html",
                "les12_exercise_every_7th.html",
                "les12.html",
                "notes.txt",
                "les12_exercise_every_5th.html",
            ],
        );
        let files = discover(tmp.path()).unwrap();
        assert_eq!(
            files,
            vec![
                "les12_exercise_every_5th.html",
                "les12_exercise_every_7th.html",
                "les13_exercise_every_6th.html",
            ]
        );
    }

    #[test]
    fn sorted_by_lesson_then_difficulty() {
        let tmp = tempfile::tempdir().unwrap();
        let names = [
            "les9_exercise_every_7th.html",
            "les10_exercise_every_5th.html",
            "les9_exercise_every_5th.html",
            "les9_exercise_every_6th.html",
        ];
        write_pages(tmp.path(), &names);
        let files = discover(tmp.path()).unwrap();
        let report = assemble(tmp.path(), &files);
        let order: Vec<_> = report.catalog.exercises.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "les9_exercise_every_5th",
                "les9_exercise_every_6th",
                "les9_exercise_every_7th",
                "les10_exercise_every_5th",
            ]
        );
        assert_eq!(report.ok, 4);
        assert_eq!(report.errors, 0);
        assert_eq!(report.catalog.metadata.total_exercises, 4);
        assert_eq!(report.catalog.exercises[0].title, "T");
    }

    #[test]
    fn unreadable_file_is_counted() {
        let tmp = tempfile::tempdir().unwrap();
        write_pages(tmp.path(), &["les1_exercise_every_5th.html"]);
        fs::write(tmp.path().join("les1_exercise_every_6th.html"), [0xffu8, 0xfe, 0x00]).unwrap();
        let files = discover(tmp.path()).unwrap();
        let report = assemble(tmp.path(), &files);
        assert_eq!(report.ok, 1);
        assert_eq!(report.errors, 1);
    }

    #[test]
    fn run_writes_catalog_and_creates_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let legacy = tmp.path().join("legacy");
        fs::create_dir(&legacy).unwrap();
        write_pages(&legacy, &["les4_exercise_every_5th.html", "les4_exercise_every_7th.html"]);
        let out = tmp.path().join("assets/data/exercises.json");

        let report = run(&legacy, &out).unwrap().unwrap();
        assert_eq!(report.ok, 2);

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["metadata"]["totalExercises"], 2);
        assert_eq!(written["metadata"]["version"], "1.0.0");
        assert_eq!(written["exercises"][0]["difficulty"], "easy");
        assert_eq!(written["exercises"][1]["difficultyLevel"], 3);
        assert_eq!(written["exercises"][0]["blanks"][0]["original"], "B");
        assert_eq!(written["exercises"][0]["url"], "legacy/les4_exercise_every_5th.html");
    }

    #[test]
    fn empty_directory_is_reported_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out/exercises.json");
        assert!(run(tmp.path(), &out).unwrap().is_none());
        assert!(!out.exists());

        let missing = tmp.path().join("nope");
        assert!(run(&missing, &out).unwrap().is_none());
    }

    #[test]
    fn stats_by_difficulty_and_lesson() {
        let tmp = tempfile::tempdir().unwrap();
        write_pages(
            tmp.path(),
            &[
                "les1_exercise_every_5th.html",
                "les1_exercise_every_6th.html",
                "les2_exercise_every_6th.html",
            ],
        );
        let files = discover(tmp.path()).unwrap();
        let report = assemble(tmp.path(), &files);
        let stats = CatalogStats::collect(&report.catalog.exercises);
        assert_eq!((stats.easy, stats.medium, stats.hard), (1, 2, 0));
        assert_eq!(stats.by_lesson.get(&1), Some(&2));
        assert_eq!(stats.by_lesson.get(&2), Some(&1));
    }
}
