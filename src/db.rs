use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Per-exercise progress, stored as JSON under `progress_<id>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    #[serde(default)]
    pub completion_percentage: u8,
    #[serde(default)]
    pub open_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_opened: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS kv (
            key        TEXT PRIMARY KEY,
            value      TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )?;
    Ok(())
}

fn progress_key(exercise_id: &str) -> String {
    format!("progress_{}", exercise_id)
}

/// Progress persistence. Every failure is logged and swallowed: a store that
/// cannot be read looks like one where nothing was ever opened.
pub struct ProgressStore {
    conn: Option<Connection>,
}

impl ProgressStore {
    /// Open the store at `path`. A store that cannot be opened still works,
    /// it just remembers nothing.
    pub fn open(path: &Path) -> Self {
        let conn = connect(path).and_then(|conn| {
            init_schema(&conn)?;
            Ok(conn)
        });
        match conn {
            Ok(conn) => ProgressStore { conn: Some(conn) },
            Err(e) => {
                error!("Error opening progress store {:?}: {:#}", path, e);
                ProgressStore { conn: None }
            }
        }
    }

    pub fn in_memory() -> Self {
        let conn = Connection::open_in_memory()
            .map_err(anyhow::Error::from)
            .and_then(|conn| {
                init_schema(&conn)?;
                Ok(conn)
            });
        match conn {
            Ok(conn) => ProgressStore { conn: Some(conn) },
            Err(e) => {
                error!("Error opening in-memory progress store: {:#}", e);
                ProgressStore { conn: None }
            }
        }
    }

    pub fn get(&self, exercise_id: &str) -> Option<ProgressRecord> {
        match self.try_get(exercise_id) {
            Ok(found) => found,
            Err(e) => {
                error!("Error getting user progress for {}: {:#}", exercise_id, e);
                None
            }
        }
    }

    /// Persist `progress`, stamping `last_updated`.
    pub fn save(&self, exercise_id: &str, progress: &ProgressRecord) {
        let mut stamped = progress.clone();
        stamped.last_updated = Some(Utc::now());
        if let Err(e) = self.try_save(exercise_id, &stamped) {
            error!("Error saving user progress for {}: {:#}", exercise_id, e);
        }
    }

    /// Count one more open and stamp the open time.
    pub fn record_open(&self, exercise_id: &str) -> ProgressRecord {
        let mut progress = self.get(exercise_id).unwrap_or_default();
        progress.open_count += 1;
        progress.last_opened = Some(Utc::now());
        self.save(exercise_id, &progress);
        progress
    }

    pub fn record_score(&self, exercise_id: &str, percentage: u8) -> ProgressRecord {
        let mut progress = self.get(exercise_id).unwrap_or_default();
        progress.completion_percentage = percentage.min(100);
        self.save(exercise_id, &progress);
        progress
    }

    fn try_get(&self, exercise_id: &str) -> Result<Option<ProgressRecord>> {
        let Some(conn) = &self.conn else {
            return Ok(None);
        };
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                [progress_key(exercise_id)],
                |row| row.get(0),
            )
            .optional()?;
        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn try_save(&self, exercise_id: &str, progress: &ProgressRecord) -> Result<()> {
        let Some(conn) = &self.conn else {
            anyhow::bail!("progress store is not open");
        };
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![progress_key(exercise_id), serde_json::to_string(progress)?],
        )?;
        Ok(())
    }
}
