use crate::domain::{HistoricalMetrics, Metrics};
use crate::error::PipelineError;
use crate::storage::Persistence;

/// Load today's metrics, append them to the history log and persist the log
/// right away, before any stage runs.
///
/// Returns today's metrics and the log including them. The log always grows by
/// exactly one record; a same-day entry already present is kept and logged.
pub fn validate_and_process_metrics<P: Persistence + ?Sized>(
    store: &P,
) -> Result<(Metrics, HistoricalMetrics), PipelineError> {
    let metrics = store.load_daily_metrics()?;
    let mut history = store.load_history()?;

    if history.contains_date(metrics.date) {
        tracing::warn!(
            date = %metrics.date,
            "historical metrics already contain this date; appending another entry"
        );
    }

    history.append(metrics.clone());
    store.save_history(&history)?;

    tracing::info!(
        date = %metrics.date,
        history_len = history.len(),
        "daily metrics validated and appended"
    );
    Ok((metrics, history))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::json_file::JsonFileStore;
    use crate::storage::memory::MemoryStore;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn metrics(day: u32) -> Metrics {
        Metrics {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            sales: 100.0,
            traffic: 50,
            inventory: BTreeMap::new(),
            reservations: None,
            other_metrics: None,
            business_config: None,
            industry_profile: None,
        }
    }

    #[test]
    fn grows_history_by_one_and_persists_it() {
        for prior in 0..3u32 {
            let history = HistoricalMetrics::new((1..=prior).map(metrics).collect());
            let store = MemoryStore::new(metrics(10), history);

            let (today, updated) = validate_and_process_metrics(&store).unwrap();
            assert_eq!(updated.len(), prior as usize + 1);
            assert_eq!(updated.latest(), Some(&today));
            assert_eq!(store.history(), updated);
        }
    }

    #[test]
    fn same_day_rerun_still_appends() {
        let store = MemoryStore::new(metrics(1), HistoricalMetrics::new(vec![metrics(1)]));
        let (_, updated) = validate_and_process_metrics(&store).unwrap();
        assert_eq!(updated.len(), 2);
    }

    #[test]
    fn malformed_log_on_disk_does_not_abort() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        std::fs::write(
            store.daily_snapshot_path(),
            json!({"metrics": {"date": "2024-01-03", "sales": 100, "traffic": 50, "inventory": {}}}).to_string(),
        )
        .unwrap();
        std::fs::write(store.history_path(), "not json at all").unwrap();

        let (_, updated) = validate_and_process_metrics(&store).unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(store.load_history().unwrap(), updated);
    }

    #[test]
    fn invalid_daily_metrics_leave_history_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        std::fs::write(store.daily_snapshot_path(), json!({"metrics": {"sales": 1}}).to_string()).unwrap();

        assert!(matches!(
            validate_and_process_metrics(&store),
            Err(PipelineError::Schema(_))
        ));
        assert!(!store.history_path().exists());
    }
}
