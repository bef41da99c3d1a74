pub mod json_file;
pub mod lock;
pub mod memory;

use crate::domain::{DailyDecisionBrief, HistoricalMetrics, Metrics};
use crate::error::{PersistenceError, PipelineError};

/// Where the pipeline reads its inputs and leaves its outputs.
///
/// `load_history` never fails on unreadable content: an absent or malformed
/// log is an empty log. Only I/O failures are errors.
pub trait Persistence {
    fn load_daily_metrics(&self) -> Result<Metrics, PipelineError>;

    fn load_history(&self) -> Result<HistoricalMetrics, PersistenceError>;

    fn save_history(&self, history: &HistoricalMetrics) -> Result<(), PersistenceError>;

    fn save_brief(&self, brief: &DailyDecisionBrief) -> Result<(), PersistenceError>;
}
