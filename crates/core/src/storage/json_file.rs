use crate::domain::contract::{self, field, Validate, Violation};
use crate::domain::{DailyDecisionBrief, HistoricalMetrics, Metrics};
use crate::error::{PersistenceError, PipelineError, SchemaKind};
use crate::storage::Persistence;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const DAILY_SNAPSHOT_FILE: &str = "daily_snapshot.json";
pub const HISTORICAL_METRICS_FILE: &str = "historical_metrics.json";
pub const LATEST_BRIEF_FILE: &str = "daily_decision_brief.json";
pub const BRIEF_ARCHIVE_DIR: &str = "briefs";

/// JSON documents in one data directory:
///
/// - `daily_snapshot.json`: `{"metrics": {...}}`, read only
/// - `historical_metrics.json`: array of metrics records, oldest first
/// - `daily_decision_brief.json`: the latest brief
/// - `briefs/<date>.json`: every brief, by date
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct DailySnapshotDocument {
    metrics: Metrics,
}

impl Validate for DailySnapshotDocument {
    fn validate(&self, path: &str) -> Result<(), Violation> {
        self.metrics.validate(&field(path, "metrics"))
    }
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn daily_snapshot_path(&self) -> PathBuf {
        self.data_dir.join(DAILY_SNAPSHOT_FILE)
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(HISTORICAL_METRICS_FILE)
    }

    pub fn latest_brief_path(&self) -> PathBuf {
        self.data_dir.join(LATEST_BRIEF_FILE)
    }

    pub fn archived_brief_path(&self, date: chrono::NaiveDate) -> PathBuf {
        self.data_dir
            .join(BRIEF_ARCHIVE_DIR)
            .join(format!("{}.json", date.format("%Y-%m-%d")))
    }

    /// Keep a copy of an unreadable history log before it gets overwritten.
    fn back_up_malformed_history(&self, path: &Path) {
        let backup = path.with_extension("json.bak");
        match std::fs::copy(path, &backup) {
            Ok(_) => tracing::warn!(backup = %backup.display(), "copied malformed historical metrics log"),
            Err(err) => tracing::warn!(
                backup = %backup.display(),
                error = %err,
                "failed to back up malformed historical metrics log"
            ),
        }
    }
}

impl Persistence for JsonFileStore {
    fn load_daily_metrics(&self) -> Result<Metrics, PipelineError> {
        let path = self.daily_snapshot_path();
        let bytes = std::fs::read(&path)
            .map_err(|err| PersistenceError::new("load_daily_snapshot", &path, err))?;
        let value = serde_json::from_slice::<serde_json::Value>(&bytes)
            .with_context(|| format!("{} is not valid JSON", path.display()))
            .map_err(|err| PersistenceError::new("load_daily_snapshot", &path, err))?;

        let doc: DailySnapshotDocument = contract::parse(value, SchemaKind::Input)?;
        Ok(doc.metrics)
    }

    fn load_history(&self) -> Result<HistoricalMetrics, PersistenceError> {
        let path = self.history_path();
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no historical metrics log yet; starting empty");
                return Ok(HistoricalMetrics::default());
            }
            Err(err) => return Err(PersistenceError::new("load_history", &path, err)),
        };

        let parsed = serde_json::from_slice::<serde_json::Value>(&bytes)
            .map_err(|err| err.to_string())
            .and_then(|value| {
                contract::parse::<Vec<Metrics>>(value, SchemaKind::Input).map_err(|err| err.to_string())
            });

        match parsed {
            Ok(history) => Ok(HistoricalMetrics::new(history)),
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    %error,
                    "historical metrics log is malformed; treating it as empty"
                );
                self.back_up_malformed_history(&path);
                Ok(HistoricalMetrics::default())
            }
        }
    }

    fn save_history(&self, history: &HistoricalMetrics) -> Result<(), PersistenceError> {
        let path = self.history_path();
        write_json_atomic(&path, &history.history)
            .map_err(|err| PersistenceError::new("save_history", &path, err))
    }

    fn save_brief(&self, brief: &DailyDecisionBrief) -> Result<(), PersistenceError> {
        let archived = self.archived_brief_path(brief.date);
        write_json_atomic(&archived, brief)
            .map_err(|err| PersistenceError::new("save_brief", &archived, err))?;

        let latest = self.latest_brief_path();
        if let Err(err) = write_json_atomic(&latest, brief) {
            // No archived copy of a brief that was not fully saved.
            if let Err(cleanup) = std::fs::remove_file(&archived) {
                tracing::warn!(
                    path = %archived.display(),
                    error = %cleanup,
                    "failed to remove archived brief after failed save"
                );
            }
            return Err(PersistenceError::new("save_brief", &latest, err));
        }
        Ok(())
    }
}

/// Pretty JSON written to a temp file next to `path`, then renamed over it, so
/// readers never see a half-written document.
fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;

    let mut text = serde_json::to_string_pretty(value).context("serialize JSON")?;
    text.push('\n');

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    tmp.write_all(text.as_bytes()).context("write temp file")?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("rename temp file to {}", path.display()))?;
    Ok(())
}
