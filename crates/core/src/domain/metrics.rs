use crate::domain::context::{BusinessConfig, IndustryProfile};
use crate::domain::contract::{field, index, non_negative, Validate, Violation};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One business day's measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub date: NaiveDate,
    pub sales: f64,
    pub traffic: u64,
    /// item name -> quantity on hand
    pub inventory: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservations: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_metrics: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_config: Option<BusinessConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry_profile: Option<IndustryProfile>,
}

impl Validate for Metrics {
    fn validate(&self, path: &str) -> Result<(), Violation> {
        non_negative(self.sales, field(path, "sales"))?;

        let inventory_path = field(path, "inventory");
        for (item, qty) in &self.inventory {
            non_negative(*qty, field(&inventory_path, item))?;
        }
        Ok(())
    }
}

/// Append-only log of past [`Metrics`], oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalMetrics {
    #[serde(default)]
    pub history: Vec<Metrics>,
}

impl HistoricalMetrics {
    pub fn new(history: Vec<Metrics>) -> Self {
        Self { history }
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.history.iter().any(|m| m.date == date)
    }

    /// Appends unconditionally; same-day entries are kept side by side.
    pub fn append(&mut self, metrics: Metrics) {
        self.history.push(metrics);
    }

    pub fn latest(&self) -> Option<&Metrics> {
        self.history.last()
    }
}

/// The persisted log is a bare list of records.
impl Validate for Vec<Metrics> {
    fn validate(&self, path: &str) -> Result<(), Violation> {
        for (i, m) in self.iter().enumerate() {
            m.validate(&index(path, i))?;
        }
        Ok(())
    }
}

impl Validate for HistoricalMetrics {
    fn validate(&self, path: &str) -> Result<(), Violation> {
        self.history.validate(&field(path, "history"))
    }
}
