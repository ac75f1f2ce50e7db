//! Builds the legacy exercise pages from lesson source pages by removing
//! every Nth word.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{error, info};

use crate::config::{DEFAULT_INPUT_SIZE, EXERCISE_SUFFIXES};
use crate::parser::html::{decode_entities, escape};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static HSPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());
static PARA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+|\w+|[^\w\s]+").unwrap());

/// (version, n, filename suffix)
const VERSIONS: &[(u32, usize, &str)] = &[(1, 5, "every_5th"), (2, 6, "every_6th"), (3, 7, "every_7th")];

pub fn ordinal(n: usize) -> String {
    let suffix = if (10..=20).contains(&(n % 100)) {
        "th"
    } else {
        match n % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        }
    };
    format!("{}{}", n, suffix)
}

/// Visible text of a lesson page with line structure kept.
pub fn extract_text(html: &str) -> String {
    let text = TAG_RE.replace_all(html, "");
    let text = decode_entities(&text);
    let text = HSPACE_RE.replace_all(&text, " ");
    let text = PARA_RE.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Replace every `nth` word with an input marker. Returns the markup and the
/// expected answers in order.
pub fn blank_out(text: &str, nth: usize) -> (String, Vec<String>) {
    let mut html = String::with_capacity(text.len() * 2);
    let mut answers = Vec::new();
    let mut words = 0usize;

    for token in TOKEN_RE.find_iter(text).map(|m| m.as_str()) {
        let is_word = token.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_');
        if !is_word {
            html.push_str(&escape(token));
            continue;
        }
        words += 1;
        if nth == 0 || words % nth != 0 {
            html.push_str(&escape(token));
            continue;
        }

        let answer = token.to_lowercase();
        let size = (token.chars().count() as u32).max(DEFAULT_INPUT_SIZE);
        html.push_str(&format!(
            r#"<input type="text" size="{}" class="fill-blank" data-answer="{}" data-original="{}" data-index="{}" style="border: none; border-bottom: 1px solid #000; background: transparent;" placeholder="____" />"#,
            size,
            escape(&answer),
            escape(token),
            answers.len()
        ));
        answers.push(answer);
    }
    (html, answers)
}

pub fn exercise_page(source_html: &str, lesson: &str, version: u32, nth: usize) -> String {
    let (content, _) = blank_out(&extract_text(source_html), nth);
    let ord = ordinal(nth);
    let lesson = escape(lesson);
    format!(
        r#"<!DOCTYPE html>
<html lang="nl">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{lesson} - Fill-in-the-blank Exercise (Version {version})</title>
    <style>
        body {{ font-family: Arial, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; line-height: 1.6; }}
        .header {{ background-color: #f0f0f0; padding: 15px; border-radius: 5px; margin-bottom: 20px; }}
        .exercise-content {{ background-color: #fafafa; padding: 20px; border-radius: 5px; border-left: 4px solid #007cba; white-space: pre-wrap; }}
        input.correct {{ background-color: #d4edda; }}
        input.incorrect {{ background-color: #f8d7da; }}
        .version-info {{ color: #666; font-size: 0.9em; margin-bottom: 10px; }}
    </style>
</head>
<body>
    <div class="header">
        <h1>{lesson} - Fill-in-the-blank Exercise</h1>
        <div class="version-info">Version {version}: Every {ord} word removed</div>
    </div>

    <div class="instructions">
        <strong>Instructions:</strong> Fill in the blanks with the appropriate words.
        This exercise removes every {ord} word from the original text.
    </div>

    <div class="controls">
        <button class="btn" onclick="checkAnswers()">Check Answers</button>
        <button class="btn" onclick="showAnswers()">Show All Answers</button>
        <div class="score" id="score" style="display: none;"></div>
    </div>

    <div class="exercise-content">
{content}
    </div>

    <script>
        function normalizeText(text) {{
            return text.toLowerCase().normalize('NFD').replace(/[̀-ͯ]/g, '').replace(/[^\w]/g, '');
        }}
        function checkAnswers() {{
            const inputs = document.querySelectorAll('.fill-blank');
            let correct = 0;
            inputs.forEach(input => {{
                const ok = normalizeText(input.value.trim()) === normalizeText(input.getAttribute('data-answer'));
                input.classList.toggle('correct', ok);
                input.classList.toggle('incorrect', !ok);
                if (ok) correct++;
            }});
            const score = document.getElementById('score');
            score.textContent = `Score: ${{correct}}/${{inputs.length}}`;
            score.style.display = 'block';
        }}
        function showAnswers() {{
            document.querySelectorAll('.fill-blank').forEach(input => {{
                input.value = input.getAttribute('data-original');
            }});
        }}
    </script>
</body>
</html>
"#
    )
}

/// Lesson source pages in `dir`: `les*.html` that are not themselves
/// exercises.
pub fn discover_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut sources: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read source directory {:?}", dir))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| {
                    n.starts_with("les")
                        && n.ends_with(".html")
                        && !EXERCISE_SUFFIXES.iter().any(|s| n.ends_with(s))
                })
        })
        .collect();
    sources.sort();
    Ok(sources)
}

/// Generate three exercise versions for every source page. Returns the
/// number of files written.
pub fn run(source_dir: &Path, output_dir: &Path) -> Result<usize> {
    let sources = discover_sources(source_dir)?;
    if sources.is_empty() {
        println!("No lesson HTML files found in {:?}.", source_dir);
        return Ok(0);
    }
    info!("Found {} original lesson HTML files to process", sources.len());
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    let mut written = 0usize;
    for path in &sources {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                error!("Error processing {:?}: {}", path, e);
                continue;
            }
        };
        for &(version, nth, suffix) in VERSIONS {
            let name = format!("{}_exercise_{}.html", stem, suffix);
            let page = exercise_page(&content, stem, version, nth);
            match fs::write(output_dir.join(&name), page) {
                Ok(()) => {
                    info!("Created {}", name);
                    written += 1;
                }
                Err(e) => error!("Error writing {}: {}", name, e),
            }
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercise::ExerciseType;
    use crate::parser::{parse_exercise, ParseMode};

    #[test]
    fn ordinals() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(5), "5th");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(13), "13th");
        assert_eq!(ordinal(22), "22nd");
        assert_eq!(ordinal(111), "111th");
    }

    #[test]
    fn every_nth_word_blanked_punctuation_kept() {
        let (html, answers) = blank_out("Een twee drie, Vier vijf zes.", 2);
        assert_eq!(answers, vec!["twee", "vier", "zes"]);
        assert!(html.starts_with("Een <input"));
        assert!(html.contains(r#"data-original="Vier""#));
        assert!(html.contains(r#"data-index="2""#));
        assert!(html.ends_with("/>."));
    }

    #[test]
    fn input_size_tracks_word_length() {
        let (html, _) = blank_out("a buitenkansen", 2);
        assert!(html.contains(r#"size="12""#));
        let (html, _) = blank_out("a b", 2);
        assert!(html.contains(r#"size="8""#));
    }

    #[test]
    fn text_extraction() {
        let text = extract_text("<p>Een   &amp;\ttwee</p>\n\n\n<p>drie</p>");
        assert_eq!(text, "Een & twee\n\ndrie");
    }

    #[test]
    fn generated_page_round_trips_through_parser() {
        let source = std::fs::read_to_string("tests/fixtures/lesson_source.html").unwrap();
        let (_, answers) = blank_out(&extract_text(&source), 6);
        let page = exercise_page(&source, "les7", 2, 6);
        let r = parse_exercise(&page, "les7_exercise_every_6th.html", ParseMode::Builder);
        assert_eq!(r.title, "les7");
        assert_eq!(r.exercise_type, ExerciseType::Every6th);
        assert_eq!(r.blank_count, answers.len());
        let parsed: Vec<_> = r.blanks.unwrap().into_iter().map(|b| b.answer).collect();
        assert_eq!(parsed, answers);
        assert!(r.description.starts_with("Les 7"));
    }

    #[test]
    fn run_writes_three_versions_per_source() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("les7.html"), "<p>Een twee drie vier vijf zes zeven acht</p>").unwrap();
        fs::write(src.join("les7_exercise_every_5th.html"), "<p>old</p>").unwrap();
        fs::write(src.join("readme.html"), "<p>x</p>").unwrap();

        let out = tmp.path().join("legacy");
        assert_eq!(run(&src, &out).unwrap(), 3);
        for suffix in ["every_5th", "every_6th", "every_7th"] {
            assert!(out.join(format!("les7_exercise_{}.html", suffix)).exists());
        }
        assert!(!out.join("les7_exercise_every_5th_exercise_every_5th.html").exists());
    }
}
