use crate::error::PersistenceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

// The history log is read, appended and rewritten by every run. Two runs over
// the same data directory would lose one append, so runs hold this lock.
pub const RUN_LOCK_FILE: &str = ".daybrief.lock";

// An unreadable lock file younger than this may still be mid-write.
const UNREADABLE_LOCK_GRACE: Duration = Duration::from_secs(30);

/// Contents of the lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLockData {
    pub process_id: u32,
    pub acquired_at: DateTime<Utc>,
}

impl RunLockData {
    fn current() -> Self {
        Self {
            process_id: std::process::id(),
            acquired_at: Utc::now(),
        }
    }
}

/// Held for the length of one pipeline run. Released on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to release run lock");
        }
    }
}

/// `Ok(None)` when a live run holds the lock. A lock left behind by a process
/// that is gone is removed and taken over.
pub fn try_acquire_run_lock(data_dir: &Path) -> Result<Option<RunLock>, PersistenceError> {
    std::fs::create_dir_all(data_dir)
        .map_err(|err| PersistenceError::new("acquire_lock", data_dir, err))?;

    let path = data_dir.join(RUN_LOCK_FILE);
    if let Some(lock) = create_lock_file(&path)? {
        return Ok(Some(lock));
    }

    if !is_stale(&path)? {
        return Ok(None);
    }
    match std::fs::remove_file(&path) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(PersistenceError::new("acquire_lock", &path, err)),
    }
    tracing::warn!(path = %path.display(), "removed stale run lock");

    // One retry: if another run reclaimed it first, that run wins.
    create_lock_file(&path)
}

/// Like [`try_acquire_run_lock`], but a held lock is an error.
pub fn acquire_run_lock(data_dir: &Path) -> Result<RunLock, PersistenceError> {
    let path = data_dir.join(RUN_LOCK_FILE);
    try_acquire_run_lock(data_dir)?.ok_or_else(|| {
        let holder = read_lock_data(&path)
            .map(|d| format!("pid {} since {}", d.process_id, d.acquired_at.to_rfc3339()))
            .unwrap_or_else(|| "unknown process".to_string());
        PersistenceError::new(
            "acquire_lock",
            &path,
            anyhow::anyhow!("another run holds the lock ({holder})"),
        )
    })
}

fn create_lock_file(path: &Path) -> Result<Option<RunLock>, PersistenceError> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::AlreadyExists => return Ok(None),
        Err(err) => return Err(PersistenceError::new("acquire_lock", path, err)),
    };

    let lock = RunLock {
        path: path.to_path_buf(),
    };
    let data = serde_json::to_string(&RunLockData::current())
        .map_err(|err| PersistenceError::new("acquire_lock", lock.path(), err))?;
    file.write_all(data.as_bytes())
        .map_err(|err| PersistenceError::new("acquire_lock", lock.path(), err))?;
    Ok(Some(lock))
}

fn read_lock_data(path: &Path) -> Option<RunLockData> {
    let text = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&text).ok()
}

fn is_stale(path: &Path) -> Result<bool, PersistenceError> {
    if let Some(data) = read_lock_data(path) {
        let alive = is_process_running(data.process_id);
        if !alive {
            tracing::warn!(pid = data.process_id, "run lock owner is no longer running");
        }
        return Ok(!alive);
    }

    let modified = match std::fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => modified,
        // Released between our create attempt and now.
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(true),
        Err(err) => return Err(PersistenceError::new("acquire_lock", path, err)),
    };
    let age = modified.elapsed().unwrap_or_default();
    Ok(age > UNREADABLE_LOCK_GRACE)
}

pub fn is_process_running(pid: u32) -> bool {
    use sysinfo::{Pid, ProcessesToUpdate, System};

    let pid = Pid::from_u32(pid);
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    sys.process(pid).is_some()
}
