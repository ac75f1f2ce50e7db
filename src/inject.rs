use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{error, info};

static VERSION_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Version \d+: Every \d+\w+ word removed").unwrap());

const MARKER: &str = "back-button-container";
const STYLESHEET: &str = "../assets/css/styles.css";

const CSS_LINKS: &str = r#"    <link rel="stylesheet" href="../assets/css/styles.css">
    <link rel="stylesheet" href="../assets/css/components.css">"#;

const BACK_BUTTON: &str = r#"    <!-- Back Button -->
    <div class="back-button-container">
        <a href="../index.html" class="back-button">
            <svg class="back-button-icon" fill="none" stroke="currentColor" viewBox="0 0 24 24" xmlns="http://www.w3.org/2000/svg">
                <path stroke-linecap="round" stroke-linejoin="round" d="M10 19l-7-7m0 0l7-7m-7 7h18"></path>
            </svg>
            Back to Exercises
        </a>
    </div>

"#;

#[derive(Debug, PartialEq, Eq)]
pub enum Rewrite {
    Updated(String),
    Unchanged,
    AlreadyInjected,
}

/// Add stylesheet links and the back button to one page, and replace the
/// version label with a generic one. Pages that already carry the button are
/// left alone.
pub fn rewrite(content: &str) -> Rewrite {
    if content.contains(MARKER) {
        return Rewrite::AlreadyInjected;
    }

    let mut out = content.to_string();
    let mut modified = false;

    if !out.contains(STYLESHEET) && out.contains("</head>") {
        out = out.replacen("</head>", &format!("{}\n</head>", CSS_LINKS), 1);
        modified = true;
    }

    if out.contains("<body>") {
        out = out.replacen("<body>", &format!("<body>\n{}", BACK_BUTTON), 1);
        modified = true;
    }

    if VERSION_LABEL_RE.is_match(&out) {
        out = VERSION_LABEL_RE
            .replace_all(&out, "Fill-in-the-blank Exercise")
            .into_owned();
        modified = true;
    }

    if modified {
        Rewrite::Updated(out)
    } else {
        Rewrite::Unchanged
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct InjectStats {
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl InjectStats {
    pub fn print(&self) {
        println!("\nUpdate complete:");
        println!("- Updated: {} files", self.updated);
        println!("- Unchanged: {} files", self.unchanged);
        println!("- Errors: {} files", self.errors);
        println!("- Skipped: {} files", self.skipped);
    }
}

/// Rewrite every `.html` file in `dir` in place.
pub fn run(dir: &Path) -> Result<InjectStats> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read legacy directory {:?}", dir))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "html"))
        .collect();
    files.sort();
    info!("Found {} HTML files to update", files.len());

    let mut stats = InjectStats::default();
    for path in &files {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let result = fs::read_to_string(path).and_then(|content| match rewrite(&content) {
            Rewrite::Updated(new) => fs::write(path, new).map(|_| Rewrite::Updated(String::new())),
            other => Ok(other),
        });
        match result {
            Ok(Rewrite::Updated(_)) => {
                info!("Updated {}", name);
                stats.updated += 1;
            }
            Ok(Rewrite::Unchanged) => {
                info!("No changes needed for {}", name);
                stats.unchanged += 1;
            }
            Ok(Rewrite::AlreadyInjected) => {
                info!("Skipping {} - already has back button", name);
                stats.skipped += 1;
            }
            Err(e) => {
                error!("Error updating {}: {}", name, e);
                stats.errors += 1;
            }
        }
    }
    Ok(stats)
}
