use crate::domain::{DailyDecisionBrief, HistoricalMetrics, Metrics};
use crate::error::{PersistenceError, PipelineError};
use crate::storage::Persistence;
use std::sync::{Mutex, MutexGuard};

/// In-process [`Persistence`] for embedding the pipeline and for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    daily: Mutex<Option<Metrics>>,
    history: Mutex<HistoricalMetrics>,
    briefs: Mutex<Vec<DailyDecisionBrief>>,
}

impl MemoryStore {
    pub fn new(daily: Metrics, history: HistoricalMetrics) -> Self {
        Self {
            daily: Mutex::new(Some(daily)),
            history: Mutex::new(history),
            briefs: Mutex::new(Vec::new()),
        }
    }

    pub fn history(&self) -> HistoricalMetrics {
        lock(&self.history).clone()
    }

    pub fn briefs(&self) -> Vec<DailyDecisionBrief> {
        lock(&self.briefs).clone()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Persistence for MemoryStore {
    fn load_daily_metrics(&self) -> Result<Metrics, PipelineError> {
        lock(&self.daily).clone().ok_or_else(|| {
            PersistenceError::new(
                "load_daily_snapshot",
                "memory://daily_snapshot",
                anyhow::anyhow!("no daily metrics loaded"),
            )
            .into()
        })
    }

    fn load_history(&self) -> Result<HistoricalMetrics, PersistenceError> {
        Ok(self.history())
    }

    fn save_history(&self, history: &HistoricalMetrics) -> Result<(), PersistenceError> {
        *lock(&self.history) = history.clone();
        Ok(())
    }

    fn save_brief(&self, brief: &DailyDecisionBrief) -> Result<(), PersistenceError> {
        lock(&self.briefs).push(brief.clone());
        Ok(())
    }
}
