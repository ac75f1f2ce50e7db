mod app;
mod catalog;
mod config;
mod db;
mod exercise;
mod fetch;
mod filter;
mod generate;
mod inject;
mod nav;
mod parser;
mod render;
mod repository;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::app::{AppContext, Opened};
use crate::db::ProgressStore;
use crate::fetch::Source;
use crate::filter::{Filters, SortBy};
use crate::nav::{Focus, Key};
use crate::repository::Repository;

#[derive(Parser)]
#[command(name = "cloze_index", about = "Index and browse fill-in-the-blank exercise pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Site root: an http(s) base URL or a local directory
    #[arg(long, default_value = ".")]
    source: String,
    /// Ignore exercises.json and parse the legacy pages
    #[arg(long)]
    pages_only: bool,
    /// Progress database
    #[arg(long, default_value = config::DB_PATH)]
    db: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse legacy pages into the JSON catalog
    Build {
        #[arg(long, default_value = config::LEGACY_DIR)]
        legacy_dir: PathBuf,
        #[arg(short, long, default_value = config::CATALOG_PATH)]
        output: PathBuf,
    },
    /// Add the back button and shared stylesheets to legacy pages
    Inject {
        #[arg(long, default_value = config::LEGACY_DIR)]
        legacy_dir: PathBuf,
    },
    /// Generate legacy exercise pages from lesson source pages
    Generate {
        #[arg(long, default_value = ".")]
        source_dir: PathBuf,
        #[arg(long, default_value = config::LEGACY_DIR)]
        output_dir: PathBuf,
    },
    /// List exercises
    List {
        /// Case-insensitive text to match in title, description or type
        #[arg(short, long)]
        search: Option<String>,
        #[arg(long, value_enum, default_value = "title")]
        sort: SortBy,
        /// Print the rendered grid instead of a table
        #[arg(long)]
        html: bool,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Show one exercise as JSON
    Show {
        id: String,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Open an exercise and count the visit
    Open {
        id: String,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Grade answers for an exercise and store the completion percentage
    Score {
        id: String,
        answers: Vec<String>,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Interactive list driven by lines on stdin
    Browse {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build { legacy_dir, output } => {
            let Some(report) = catalog::run(&legacy_dir, &output)? else {
                return Ok(());
            };
            println!("\nExtraction complete:");
            println!("- Successfully processed: {} files", report.ok);
            println!("- Errors: {} files", report.errors);
            println!("- Output saved to: {}", output.display());
            catalog::CatalogStats::collect(&report.catalog.exercises).print();
            Ok(())
        }
        Commands::Inject { legacy_dir } => {
            if !legacy_dir.is_dir() {
                println!("Legacy directory not found: {}", legacy_dir.display());
                return Ok(());
            }
            let stats = inject::run(&legacy_dir)?;
            stats.print();
            Ok(())
        }
        Commands::Generate { source_dir, output_dir } => {
            let written = generate::run(&source_dir, &output_dir)?;
            println!("Generated {} exercise files in {}", written, output_dir.display());
            Ok(())
        }
        Commands::List { search, sort, html, source } => {
            let filters = Filters::from_input(search.as_deref(), Some(sort));
            let mut app = context(&source).with_filters(filters);
            app.load_and_display().await;
            if html || app.surfaces().failed {
                println!("{}", app.surfaces().grid);
            } else {
                print_table(&app);
            }
            println!("\n{}", app.surfaces().count);
            Ok(())
        }
        Commands::Show { id, source } => {
            let mut app = context(&source);
            match app.get_by_id(&id).await? {
                Some(exercise) => println!("{}", serde_json::to_string_pretty(&exercise)?),
                None => println!("No exercise with id {}", id),
            }
            Ok(())
        }
        Commands::Open { id, source } => {
            let mut app = context(&source);
            match app.open_by_id(&id).await? {
                Some(opened) => print_opened(&app, &opened),
                None => println!("No exercise with id {}", id),
            }
            Ok(())
        }
        Commands::Score { id, answers, source } => {
            let mut app = context(&source);
            match app.score(&id, &answers).await? {
                Some(s) => println!(
                    "Score: {}/{} ({}% complete)",
                    s.correct, s.total, s.progress.completion_percentage
                ),
                None => println!("No exercise with id {}", id),
            }
            Ok(())
        }
        Commands::Browse { source } => browse(context(&source)).await,
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn context(args: &SourceArgs) -> AppContext<Source> {
    let repo = Repository::new(Source::from_arg(&args.source), config::known_files());
    let repo = if args.pages_only { repo.pages_only() } else { repo };
    AppContext::new(repo, ProgressStore::open(&args.db))
}

fn print_table(app: &AppContext<Source>) {
    let rows = app.current();
    if rows.is_empty() {
        println!("No exercises found.");
        return;
    }

    println!(
        "{:>3} | {:<32} | {:<28} | {:<14} | {:>6} | {:>8}",
        "#", "Id", "Title", "Type", "Blanks", "Progress"
    );
    println!("{}", "-".repeat(107));

    for (i, e) in rows.iter().enumerate() {
        let progress = app
            .progress()
            .get(&e.id)
            .map(|p| format!("{}%", p.completion_percentage))
            .unwrap_or_else(|| "-".into());
        let title = if e.error {
            format!("{} (unavailable)", e.title)
        } else {
            e.title.clone()
        };
        println!(
            "{:>3} | {:<32} | {:<28} | {:<14} | {:>6} | {:>8}",
            i + 1,
            truncate(&e.id, 32),
            truncate(&title, 28),
            e.exercise_type.label(),
            e.blank_count,
            progress
        );
    }
}

fn print_opened(app: &AppContext<Source>, opened: &Opened) {
    println!("{}", opened.exercise.title);
    println!("{}", app.fetcher().resolve(&opened.exercise.url));
    println!("Opened {} times", opened.progress.open_count);
}

fn print_status(app: &AppContext<Source>) {
    let s = app.surfaces();
    if s.failed {
        println!("Error loading exercises. Type :retry to try again.");
        return;
    }
    println!("{}", s.count);
    if let Some(message) = &s.announcement {
        println!("({})", message);
    }
}

fn print_focus(app: &AppContext<Source>) {
    match app.focus() {
        Focus::Card(i) => {
            if let Some(e) = app.current().get(i) {
                println!("> {}. {} [{}]", i + 1, e.title, e.exercise_type);
            }
        }
        Focus::Search => println!("> search"),
        Focus::None => {}
    }
}

/// Line-driven event loop: plain text is search input, `:`-prefixed lines
/// are commands.
async fn browse(mut app: AppContext<Source>) -> anyhow::Result<()> {
    app.load_and_display().await;
    print_status(&app);
    println!("Commands: :enter :sort lesson|title :key <name> :open :retry :quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let deadline = app.search_deadline();
        let quiet = async {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_line(&mut app, line.trim_end()).await {
                    break;
                }
            }
            _ = quiet => {
                if app.poll_search(tokio::time::Instant::now()).await {
                    print_status(&app);
                }
            }
        }
    }
    Ok(())
}

/// Returns false when the loop should stop.
async fn handle_line(app: &mut AppContext<Source>, line: &str) -> bool {
    let Some(command) = line.strip_prefix(':') else {
        app.search_input(line, tokio::time::Instant::now());
        return true;
    };

    let (name, arg) = command
        .split_once(' ')
        .map(|(n, a)| (n, a.trim()))
        .unwrap_or((command, ""));
    match name {
        "quit" | "q" => return false,
        "enter" => {
            let text = if arg.is_empty() {
                app.filters().search.clone().unwrap_or_default()
            } else {
                arg.to_string()
            };
            app.submit_search(&text).await;
            print_status(app);
        }
        "sort" => match arg {
            "lesson" => {
                app.set_sort(SortBy::Lesson).await;
                print_status(app);
            }
            "title" => {
                app.set_sort(SortBy::Title).await;
                print_status(app);
            }
            _ => println!("Unknown sort: {}", arg),
        },
        "key" => match Key::parse(arg) {
            Some(key) => {
                if app.focus() == Focus::None && key != Key::FocusSearch {
                    app.focus_card(0);
                }
                match app.handle_key(key) {
                    Some(opened) => print_opened(app, &opened),
                    None => print_focus(app),
                }
            }
            None => println!("Unknown key: {}", arg),
        },
        "open" => {
            let index = match app.focus() {
                Focus::Card(i) => i,
                _ => 0,
            };
            match app.open_exercise(index) {
                Some(opened) => print_opened(app, &opened),
                None => println!("Nothing to open."),
            }
        }
        "retry" => {
            app.retry().await;
            print_status(app);
        }
        _ => println!("Unknown command: :{}", name),
    }
    true
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
