use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{self, CATALOG_PATH};
use crate::exercise::{Catalog, ExerciseRecord};
use crate::fetch::Fetcher;
use crate::filter::compare_titles;
use crate::parser::{parse_exercise, ParseMode};

#[derive(Debug, Error)]
pub enum LoadError {
    /// A page task was cancelled before it settled, e.g. the runtime is
    /// shutting down. Panicked tasks are per-page failures instead.
    #[error("loading {0} was cancelled")]
    Cancelled(String),
}

/// Result of loading one legacy page.
#[derive(Debug)]
pub enum LoadOutcome {
    Parsed(ExerciseRecord),
    Failed { filename: String, error: String },
}

impl LoadOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, LoadOutcome::Failed { .. })
    }

    /// The parsed record, or a placeholder flagged with `error`.
    pub fn into_record(self) -> ExerciseRecord {
        match self {
            LoadOutcome::Parsed(record) => record,
            LoadOutcome::Failed { filename, .. } => ExerciseRecord::unavailable(&filename),
        }
    }
}

/// Which path produced the cached catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Json,
    Pages,
}

/// Owns the session's exercise catalog. Loads once, then serves the cached
/// list until [`Repository::invalidate`] is called.
pub struct Repository<F: Fetcher> {
    fetcher: Arc<F>,
    known_files: Vec<String>,
    catalog_path: String,
    prefer_json: bool,
    cache: Option<(Arc<Vec<ExerciseRecord>>, Origin)>,
}

impl<F: Fetcher> Repository<F> {
    pub fn new(fetcher: F, known_files: Vec<String>) -> Self {
        Repository {
            fetcher: Arc::new(fetcher),
            known_files,
            catalog_path: CATALOG_PATH.to_string(),
            prefer_json: true,
            cache: None,
        }
    }

    /// Skip the JSON catalog and always parse pages.
    pub fn pages_only(mut self) -> Self {
        self.prefer_json = false;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn cached(&self) -> Option<&[ExerciseRecord]> {
        self.cache.as_ref().map(|(list, _)| list.as_slice())
    }

    pub fn origin(&self) -> Option<Origin> {
        self.cache.as_ref().map(|(_, origin)| *origin)
    }

    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    pub async fn load_all(&mut self) -> Result<Arc<Vec<ExerciseRecord>>, LoadError> {
        if let Some((list, _)) = &self.cache {
            return Ok(Arc::clone(list));
        }

        let (list, origin) = self.load_fresh().await?;
        let list = Arc::new(list);
        self.cache = Some((Arc::clone(&list), origin));
        Ok(list)
    }

    pub async fn get_by_id(&mut self, id: &str) -> Result<Option<ExerciseRecord>, LoadError> {
        let all = self.load_all().await?;
        Ok(all.iter().find(|e| e.id == id).cloned())
    }

    async fn load_fresh(&self) -> Result<(Vec<ExerciseRecord>, Origin), LoadError> {
        info!("Loading exercises...");

        if self.prefer_json {
            if let Some(list) = self.load_json().await {
                let min = config::min_accepted(self.known_files.len());
                if list.len() >= min {
                    info!("Loaded {} exercises from JSON", list.len());
                    return Ok((list, Origin::Json));
                }
                warn!(
                    "JSON data incomplete: {} exercises found, expected at least {}. Falling back to HTML parsing.",
                    list.len(),
                    min
                );
            }
        }

        info!("Parsing {} exercise pages", self.known_files.len());
        let outcomes = self.load_pages().await?;
        let failed: Vec<&str> = outcomes
            .iter()
            .filter_map(|o| match o {
                LoadOutcome::Failed { filename, .. } => Some(filename.as_str()),
                LoadOutcome::Parsed(_) => None,
            })
            .collect();

        if !failed.is_empty() {
            warn!("{} exercises failed to load: {:?}", failed.len(), failed);
        }

        let mut list: Vec<ExerciseRecord> = outcomes.into_iter().map(LoadOutcome::into_record).collect();
        list.sort_by(|a, b| compare_titles(&a.title, &b.title));
        info!("Loaded {} exercises from HTML", list.len());
        Ok((list, Origin::Pages))
    }

    async fn load_json(&self) -> Option<Vec<ExerciseRecord>> {
        let text = match self.fetcher.fetch_text(&self.catalog_path).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Could not load exercises from JSON: {}", e);
                return None;
            }
        };
        match serde_json::from_str::<Catalog>(&text) {
            Ok(catalog) => Some(catalog.exercises),
            Err(e) => {
                warn!("Could not parse {}: {}", self.catalog_path, e);
                None
            }
        }
    }

    /// One task per known file, all awaited; each settles on its own.
    async fn load_pages(&self) -> Result<Vec<LoadOutcome>, LoadError> {
        let handles: Vec<_> = self
            .known_files
            .iter()
            .cloned()
            .map(|filename| {
                let fetcher = Arc::clone(&self.fetcher);
                tokio::spawn(async move { load_page(fetcher.as_ref(), &filename, ParseMode::Runtime).await })
            })
            .collect();

        futures::future::join_all(handles)
            .await
            .into_iter()
            .zip(&self.known_files)
            .map(|(joined, filename)| match joined {
                Ok(outcome) => Ok(outcome),
                Err(e) if e.is_cancelled() => Err(LoadError::Cancelled(filename.clone())),
                Err(e) => Ok(LoadOutcome::Failed {
                    filename: filename.clone(),
                    error: e.to_string(),
                }),
            })
            .collect()
    }
}

/// Fetch and parse one legacy page.
pub async fn load_page<F: Fetcher>(fetcher: &F, filename: &str, mode: ParseMode) -> LoadOutcome {
    match fetcher.fetch_text(&format!("legacy/{}", filename)).await {
        Ok(html) => {
            let record = parse_exercise(&html, filename, mode);
            debug!("Parsed {} - {} - {} blanks", filename, record.title, record.blank_count);
            LoadOutcome::Parsed(record)
        }
        Err(e) => {
            warn!("Error loading exercise {}: {}", filename, e);
            LoadOutcome::Failed {
                filename: filename.to_string(),
                error: e.to_string(),
            }
        }
    }
}
