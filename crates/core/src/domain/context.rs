use crate::domain::contract::{field, Validate, Violation};
use crate::domain::metrics::Metrics;
use crate::domain::signals::Signals;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Static description of the business. Supplied by the owner, never inferred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessConfig {
    pub name: String,
    /// e.g. "08:00-20:00"
    pub hours: String,
    pub staffing: u32,
    pub capacity: u32,
    /// e.g. ["Mon", "Tue", "Wed"]
    pub operating_days: Vec<String>,
    #[serde(default, deserialize_with = "crate::domain::contract::null_as_default")]
    pub preferences: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryProfile {
    /// e.g. "bar", "bakery"
    pub industry_type: String,
    pub tone: String,
    #[serde(default, deserialize_with = "crate::domain::contract::null_as_default")]
    pub assumptions: BTreeMap<String, Value>,
    /// Ordered, most important first.
    #[serde(default)]
    pub signal_priorities: Vec<String>,
}

/// Read-only context handed to the recommendation and review stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullSnapshot {
    pub business_config: BusinessConfig,
    pub industry_profile: IndustryProfile,
    pub metrics: Metrics,
    #[serde(default)]
    pub signals: Option<Signals>,
}

impl Validate for FullSnapshot {
    fn validate(&self, path: &str) -> Result<(), Violation> {
        self.metrics.validate(&field(path, "metrics"))?;
        self.signals.validate(&field(path, "signals"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::parse;
    use crate::error::SchemaKind;
    use serde_json::json;

    #[test]
    fn business_config_preferences_default_to_empty() {
        let cfg: BusinessConfig = serde_json::from_value(json!({
            "name": "Corner Bakery",
            "hours": "07:00-15:00",
            "staffing": 3,
            "capacity": 20,
            "operating_days": ["Tue", "Wed"],
            "preferences": null
        }))
        .unwrap();
        assert!(cfg.preferences.is_empty());
        assert_eq!(cfg.operating_days, vec!["Tue", "Wed"]);
    }

    #[test]
    fn snapshot_reports_nested_metrics_path() {
        let err = parse::<FullSnapshot>(
            json!({
                "business_config": {
                    "name": "x", "hours": "x", "staffing": 1, "capacity": 1, "operating_days": []
                },
                "industry_profile": {"industry_type": "bar", "tone": "friendly", "assumptions": {}},
                "metrics": {"date": "2024-01-01", "sales": -1, "traffic": 0, "inventory": {}}
            }),
            SchemaKind::Input,
        )
        .unwrap_err();
        assert_eq!(err.field_path, "metrics.sales");
    }
}
