use std::time::Duration;

use anyhow::anyhow;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::config::SEARCH_DEBOUNCE_MS;
use crate::db::{ProgressRecord, ProgressStore};
use crate::exercise::{Blank, ExerciseRecord};
use crate::fetch::Fetcher;
use crate::filter::{self, Filters, SortBy};
use crate::nav::{self, Debounce, Focus, Key, NavEffect};
use crate::parser::text::{calculate_score, normalize_text};
use crate::parser::ParseMode;
use crate::render;
use crate::repository::{load_page, LoadError, LoadOutcome, Repository};

/// What the page currently shows.
#[derive(Debug, Clone, Default)]
pub struct Surfaces {
    pub grid: String,
    pub count: String,
    /// Message for the polite live region, set after each successful render.
    pub announcement: Option<String>,
    pub busy: bool,
    pub failed: bool,
}

/// An exercise the user activated.
#[derive(Debug, Clone)]
pub struct Opened {
    pub exercise: ExerciseRecord,
    pub progress: ProgressRecord,
}

#[derive(Debug, Clone)]
pub struct Scored {
    pub correct: usize,
    pub total: usize,
    pub progress: ProgressRecord,
}

/// Number of blanks whose answer matches, ignoring case, accents and
/// punctuation. Missing answers are wrong; extra answers are ignored.
pub fn grade(blanks: &[Blank], answers: &[String]) -> usize {
    blanks
        .iter()
        .zip(answers)
        .filter(|(blank, given)| normalize_text(given.trim()) == normalize_text(&blank.answer))
        .count()
}

/// Everything the exercise list needs, owned in one place and passed to
/// event handlers explicitly.
pub struct AppContext<F: Fetcher> {
    repo: Repository<F>,
    progress: ProgressStore,
    filters: Filters,
    current: Vec<ExerciseRecord>,
    focus: Focus,
    search: Debounce<String>,
    surfaces: Surfaces,
}

impl<F: Fetcher> AppContext<F> {
    pub fn new(repo: Repository<F>, progress: ProgressStore) -> Self {
        AppContext {
            repo,
            progress,
            filters: Filters {
                search: None,
                sort_by: Some(SortBy::Title),
            },
            current: Vec::new(),
            focus: Focus::None,
            search: Debounce::new(Duration::from_millis(SEARCH_DEBOUNCE_MS)),
            surfaces: Surfaces::default(),
        }
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn current(&self) -> &[ExerciseRecord] {
        &self.current
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn surfaces(&self) -> &Surfaces {
        &self.surfaces
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    /// Reload through the repository, filter, and re-render. Failures end in
    /// the error state, never in a propagated error.
    pub async fn load_and_display(&mut self) {
        self.surfaces.grid = render::loading_state();
        self.surfaces.busy = true;
        self.surfaces.announcement = None;

        debug!("Loading exercises with filters: {:?}", self.filters);
        match self.repo.load_all().await {
            Ok(all) => {
                self.current = filter::apply(&all, &self.filters);
                self.display(all.len());
            }
            Err(e) => self.show_error(&e),
        }
    }

    fn display(&mut self, total: usize) {
        let search = self.filters.active_search();
        let shown = self.current.len();
        info!("Loaded {} exercises after filtering", shown);

        self.surfaces.count = render::count_text(shown, total, search.is_some());
        let progress = &self.progress;
        self.surfaces.grid = render::grid(&self.current, search, |id| progress.get(id));
        self.surfaces.busy = false;
        self.surfaces.failed = false;
        self.surfaces.announcement = (shown > 0).then(|| render::announcement(shown));

        if let Focus::Card(i) = self.focus {
            self.focus = if shown == 0 {
                Focus::None
            } else {
                Focus::Card(i.min(shown - 1))
            };
        }
    }

    fn show_error(&mut self, e: &LoadError) {
        error!("Error loading exercises: {}", e);
        self.current.clear();
        self.surfaces.grid = render::error_state();
        self.surfaces.count = String::new();
        self.surfaces.busy = false;
        self.surfaces.failed = true;
        if let Focus::Card(_) = self.focus {
            self.focus = Focus::None;
        }
    }

    /// Typed search text; applied once input is quiet.
    pub fn search_input(&mut self, text: &str, now: Instant) {
        self.search.push(text.to_string(), now);
    }

    pub fn search_deadline(&self) -> Option<Instant> {
        self.search.deadline()
    }

    /// Apply debounced search text if its quiet period has passed.
    pub async fn poll_search(&mut self, now: Instant) -> bool {
        match self.search.take_ready(now) {
            Some(text) => {
                self.set_search(&text);
                self.load_and_display().await;
                true
            }
            None => false,
        }
    }

    /// Explicit submit: applies immediately, superseding pending input.
    pub async fn submit_search(&mut self, text: &str) {
        self.search.cancel();
        self.set_search(text);
        self.load_and_display().await;
    }

    fn set_search(&mut self, text: &str) {
        self.filters = Filters::from_input(Some(text), self.filters.sort_by);
    }

    pub async fn set_sort(&mut self, sort_by: SortBy) {
        self.filters.sort_by = Some(sort_by);
        self.load_and_display().await;
    }

    /// Drop the cached catalog and load again.
    pub async fn retry(&mut self) {
        self.repo.invalidate();
        self.load_and_display().await;
    }

    pub fn focus_card(&mut self, index: usize) {
        if index < self.current.len() {
            self.focus = Focus::Card(index);
        }
    }

    pub fn handle_key(&mut self, key: Key) -> Option<Opened> {
        match nav::handle_key(self.focus, key, self.current.len()) {
            NavEffect::Moved(focus) => {
                self.focus = focus;
                None
            }
            NavEffect::Activate(index) => self.open_exercise(index),
            NavEffect::Ignored => None,
        }
    }

    /// Activate the card at `index`: count the open and hand back the
    /// exercise so the caller can navigate to it.
    pub fn open_exercise(&mut self, index: usize) -> Option<Opened> {
        let exercise = self.current.get(index)?.clone();
        let progress = self.progress.record_open(&exercise.id);
        info!("Opened {} ({} opens)", exercise.id, progress.open_count);
        Some(Opened { exercise, progress })
    }

    pub async fn open_by_id(&mut self, id: &str) -> Result<Option<Opened>, LoadError> {
        let Some(exercise) = self.repo.get_by_id(id).await? else {
            return Ok(None);
        };
        let progress = self.progress.record_open(&exercise.id);
        Ok(Some(Opened { exercise, progress }))
    }

    /// Grade `answers` against the exercise's blanks and store the
    /// completion percentage.
    pub async fn score(&mut self, id: &str, answers: &[String]) -> anyhow::Result<Option<Scored>> {
        let Some(exercise) = self.repo.get_by_id(id).await? else {
            return Ok(None);
        };
        let record = match load_page(self.repo.fetcher(), &exercise.filename, ParseMode::Builder).await {
            LoadOutcome::Parsed(record) => record,
            LoadOutcome::Failed { filename, error } => {
                return Err(anyhow!("Failed to load {}: {}", filename, error));
            }
        };

        let blanks = record.blanks.unwrap_or_default();
        let correct = grade(&blanks, answers);
        let total = blanks.len();
        let progress = self.progress.record_score(&exercise.id, calculate_score(correct, total));
        info!("Scored {}: {}/{}", exercise.id, correct, total);
        Ok(Some(Scored { correct, total, progress }))
    }

    pub async fn get_by_id(&mut self, id: &str) -> Result<Option<ExerciseRecord>, LoadError> {
        self.repo.get_by_id(id).await
    }

    pub fn fetcher(&self) -> &F {
        self.repo.fetcher()
    }
}
